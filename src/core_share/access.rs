use super::share::{Access, Share};
use crate::config::ShareConfig;
use crate::core_auth::Principal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub trait AccessControlManager: Send + Sync {
    fn check_access_control(&self, principal: &Principal, share: &Share) -> Access;

    /// Shares the principal may see at all.
    fn filter_share_list(&self, principal: &Principal, shares: &[Arc<Share>]) -> Vec<Arc<Share>> {
        shares
            .iter()
            .filter(|share| self.check_access_control(principal, share) != Access::NoAccess)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct ShareRule {
    allowed_users: Option<HashSet<String>>,
    writers: Option<HashSet<String>>,
}

/// Access rules taken from the `[[shares]]` configuration.
///
/// A share with `allowed_users` hides itself from everyone else, `writers`
/// restricts who may modify it. Guests only write to their own temporary
/// share and read-only shares stay read-only for everyone.
#[derive(Debug, Default)]
pub struct ConfigAccessControl {
    rules: HashMap<String, ShareRule>,
}

impl ConfigAccessControl {
    pub fn from_config(shares: &[ShareConfig]) -> Self {
        let rules = shares
            .iter()
            .map(|share| {
                let rule = ShareRule {
                    allowed_users: share
                        .allowed_users
                        .as_ref()
                        .map(|users| users.iter().cloned().collect()),
                    writers: share
                        .writers
                        .as_ref()
                        .map(|users| users.iter().cloned().collect()),
                };
                (share.name.to_lowercase(), rule)
            })
            .collect();
        Self { rules }
    }
}

impl AccessControlManager for ConfigAccessControl {
    fn check_access_control(&self, principal: &Principal, share: &Share) -> Access {
        let rule = self.rules.get(&share.name().to_lowercase());

        if let Some(allowed) = rule.and_then(|rule| rule.allowed_users.as_ref()) {
            if !allowed.contains(&principal.user) {
                return Access::NoAccess;
            }
        }
        if share.is_read_only() || (principal.guest && !share.is_temporary()) {
            return Access::ReadOnly;
        }
        match rule.and_then(|rule| rule.writers.as_ref()) {
            Some(writers) if !writers.contains(&principal.user) => Access::ReadOnly,
            _ => Access::Writeable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_disk::LocalDisk;
    use std::path::PathBuf;

    fn share(name: &str) -> Arc<Share> {
        Arc::new(Share::new(name, Arc::new(LocalDisk::new("/nonexistent"))))
    }

    fn principal(user: &str) -> Principal {
        Principal {
            user: user.to_string(),
            guest: false,
            home: None,
        }
    }

    fn config(name: &str, allowed: Option<&[&str]>, writers: Option<&[&str]>) -> ShareConfig {
        ShareConfig {
            name: name.to_string(),
            path: PathBuf::from("/nonexistent"),
            read_only: false,
            allowed_users: allowed.map(|u| u.iter().map(|s| s.to_string()).collect()),
            writers: writers.map(|u| u.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn allowed_users_hide_share() {
        let acl = ConfigAccessControl::from_config(&[
            config("private", Some(&["alice"]), None),
            config("public", None, Some(&["alice"])),
        ]);
        let shares = vec![share("Private"), share("public"), share("other")];

        let visible = acl.filter_share_list(&principal("bob"), &shares);
        let names: Vec<&str> = visible.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["public", "other"]);

        assert_eq!(
            acl.check_access_control(&principal("bob"), &shares[1]),
            Access::ReadOnly
        );
        assert_eq!(
            acl.check_access_control(&principal("alice"), &shares[1]),
            Access::Writeable
        );
        assert_eq!(
            acl.check_access_control(&principal("alice"), &shares[0]),
            Access::Writeable
        );
    }

    #[test]
    fn guests_write_only_their_own_share() {
        let acl = ConfigAccessControl::default();
        let guest = Principal {
            user: "guest".to_string(),
            guest: true,
            home: None,
        };
        let home = Arc::new(
            Share::new("guest", Arc::new(LocalDisk::new("/nonexistent"))).into_temporary(),
        );
        assert_eq!(acl.check_access_control(&guest, &share("docs")), Access::ReadOnly);
        assert_eq!(acl.check_access_control(&guest, &home), Access::Writeable);
    }
}
