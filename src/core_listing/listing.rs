use crate::constants::UNIX_DATE_RECENT_DAYS;
use crate::core_disk::FileInfo;
use chrono::{DateTime, Local, Utc};
use std::fmt;

/// Set of machine-listing facts selected for a session.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactMask(u32);

impl FactMask {
    pub const SIZE: u32 = 0x0001;
    pub const MODIFY: u32 = 0x0002;
    pub const CREATE: u32 = 0x0004;
    pub const TYPE: u32 = 0x0008;
    pub const UNIQUE: u32 = 0x0010;
    pub const PERM: u32 = 0x0020;
    pub const MEDIA_TYPE: u32 = 0x0040;

    pub const ALL: FactMask = FactMask(0x007F);

    /// Fact names in the order they are written.
    pub const NAMES: [(&'static str, u32); 7] = [
        ("size", Self::SIZE),
        ("modify", Self::MODIFY),
        ("create", Self::CREATE),
        ("type", Self::TYPE),
        ("unique", Self::UNIQUE),
        ("perm", Self::PERM),
        ("media-type", Self::MEDIA_TYPE),
    ];

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, fact: u32) -> bool {
        self.0 & fact != 0
    }

    /// Parses a `;` separated fact list. Unknown names are skipped, `None`
    /// when nothing valid was named.
    pub fn parse(list: &str) -> Option<FactMask> {
        let bits = list
            .split(';')
            .map(str::trim)
            .filter_map(|name| {
                Self::NAMES
                    .iter()
                    .find(|(fact, _)| fact.eq_ignore_ascii_case(name))
                    .map(|(_, bit)| *bit)
            })
            .fold(0, |acc, bit| acc | bit);
        (bits != 0).then_some(FactMask(bits))
    }

    /// `size;modify;` style list of the enabled facts.
    pub fn names(&self) -> String {
        Self::NAMES
            .iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(name, _)| format!("{};", name))
            .collect()
    }
}

impl Default for FactMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Debug for FactMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FactMask({})", self.names())
    }
}

/// `ls -l` style line.
pub fn unix_line(info: &FileInfo, now: DateTime<Utc>) -> String {
    let date = info.modify.or(info.create).unwrap_or(now);
    format!(
        "{}rw-rw-rw-   1 user group {} {} {}",
        if info.directory { 'd' } else { '-' },
        info.size,
        unix_date(date, now),
        info.name
    )
}

pub fn name_only(info: &FileInfo) -> String {
    info.name.clone()
}

/// Month and day, then the time for dates within half a year of `now`,
/// otherwise the year.
pub fn unix_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let local = date.with_timezone(&Local);
    let age = now.signed_duration_since(date).num_days().abs();
    if age < UNIX_DATE_RECENT_DAYS {
        local.format("%b %e %H:%M").to_string()
    } else {
        local.format("%b %e  %Y").to_string()
    }
}

/// `YYYYMMDDHHMMSS` in UTC, used by MDTM and the modify/create facts.
pub fn mlst_date(date: DateTime<Utc>) -> String {
    date.format("%Y%m%d%H%M%S").to_string()
}

/// RFC 3659 facts line. Single object replies (MLST) start with a space.
pub fn facts_line(info: &FileInfo, mask: FactMask, single: bool) -> String {
    let mut line = String::new();
    if single {
        line.push(' ');
    }

    for (name, bit) in FactMask::NAMES {
        if !mask.contains(bit) {
            continue;
        }
        let value = match bit {
            FactMask::SIZE => Some(info.size.to_string()),
            FactMask::MODIFY => info.modify.map(mlst_date),
            FactMask::CREATE => info.create.map(mlst_date),
            FactMask::TYPE => Some(if info.directory { "dir" } else { "file" }.to_string()),
            FactMask::UNIQUE => info.file_id.map(|id| id.to_string()),
            FactMask::PERM => Some(perm_fact(info).to_string()),
            _ => None,
        };
        if let Some(value) = value {
            line.push_str(name);
            line.push('=');
            line.push_str(&value);
            line.push(';');
        }
    }

    line.push(' ');
    line.push_str(&info.name);
    line
}

fn perm_fact(info: &FileInfo) -> &'static str {
    match (info.directory, info.read_only) {
        (true, true) => "el",
        (true, false) => "ceflmp",
        (false, true) => "r",
        (false, false) => "rwadf",
    }
}
