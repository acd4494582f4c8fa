use super::ftp_path::{FtpPath, PathError};
use crate::core_disk::LocalDisk;
use crate::core_share::Share;
use std::sync::Arc;

fn segments(path: &FtpPath) -> (Vec<String>, Vec<String>) {
    let ftp: Vec<String> = path
        .ftp_path()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    let mut native: Vec<String> = path
        .share_path()
        .unwrap_or("")
        .split('\\')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if let Some(share) = path.share_name() {
        native.insert(0, share.to_string());
    }
    (ftp, native)
}

#[test]
fn root_has_no_share() {
    for input in ["/", "", "//"] {
        let path = FtpPath::from_ftp_path(input).unwrap();
        assert!(path.is_root_path(), "{input:?}");
        assert_eq!(path.ftp_path(), "/");
        assert!(path.share_path().is_none());
    }
}

#[test]
fn first_segment_is_share() {
    let path = FtpPath::from_ftp_path("/docs/reports/2024/q1.txt").unwrap();
    assert_eq!(path.share_name(), Some("docs"));
    assert_eq!(path.share_path(), Some("\\reports\\2024\\q1.txt"));
    assert!(!path.is_root_share_path());

    let share_root = FtpPath::from_ftp_path("/docs").unwrap();
    assert!(share_root.is_root_share_path());
    assert_eq!(share_root.share_path(), Some("\\"));
}

#[test]
fn rejects_relative_input() {
    assert_eq!(
        FtpPath::from_ftp_path("docs/a").unwrap_err(),
        PathError::Invalid("docs/a".to_string())
    );
}

#[test]
fn ftp_and_share_forms_round_trip() {
    let inputs = [
        "/docs",
        "/docs/a",
        "/docs/a/b/c.txt",
        "/Public/with space/file name.bin",
        "/docs/caf\u{e9}/na\u{ef}ve",
    ];
    for input in inputs {
        let path = FtpPath::from_ftp_path(input).unwrap();
        let rebuilt =
            FtpPath::from_share_path(path.share_name().unwrap(), path.share_path().unwrap())
                .unwrap();
        assert_eq!(rebuilt.ftp_path(), input);
        assert_eq!(rebuilt.share_path(), path.share_path());
    }
}

#[test]
fn trailing_slash_normalisation_is_idempotent() {
    let once = FtpPath::from_ftp_path("/docs/a/").unwrap();
    assert_eq!(once.ftp_path(), "/docs/a");
    let twice = FtpPath::from_ftp_path(once.ftp_path()).unwrap();
    assert_eq!(twice.ftp_path(), once.ftp_path());
    assert_eq!(twice.share_path(), once.share_path());
}

#[test]
fn add_and_remove_keep_forms_consistent() {
    let mut path = FtpPath::from_ftp_path("/docs").unwrap();
    let steps: [fn(&mut FtpPath); 7] = [
        |p: &mut FtpPath| p.add_directory("a"),
        |p: &mut FtpPath| p.add_directory("b"),
        |p: &mut FtpPath| p.add_file("c.txt"),
        |p: &mut FtpPath| p.remove_directory(),
        |p: &mut FtpPath| p.remove_directory(),
        |p: &mut FtpPath| p.add_file("d"),
        |p: &mut FtpPath| p.remove_directory(),
    ];
    for step in steps {
        step(&mut path);
        let (ftp, native) = segments(&path);
        assert_eq!(ftp, native, "{:?}", path);
    }
    assert_eq!(path.ftp_path(), "/docs/a");
    assert!(path.is_dir());
}

#[test]
fn add_at_root_names_a_share() {
    let mut path = FtpPath::root();
    path.add_directory("docs");
    assert_eq!(path.share_name(), Some("docs"));
    assert!(path.is_root_share_path());
    path.remove_directory();
    assert!(path.is_root_path());
    path.remove_directory();
    assert!(path.is_root_path());
}

#[test]
fn resolve_relative_segments() {
    let cwd = FtpPath::from_ftp_path("/docs/a").unwrap();

    let same = cwd.resolve(".", false).unwrap();
    assert_eq!(same.ftp_path(), "/docs/a");

    let up = cwd.resolve("..", false).unwrap();
    assert_eq!(up.ftp_path(), "/docs");

    let file = cwd.resolve("./b/../c.txt", true).unwrap();
    assert_eq!(file.ftp_path(), "/docs/a/c.txt");
    assert_eq!(file.share_path(), Some("\\a\\c.txt"));
    assert!(!file.is_dir());

    let absolute = cwd.resolve("/other/x", false).unwrap();
    assert_eq!(absolute.share_name(), Some("other"));

    assert_eq!(
        FtpPath::root().resolve("..", false).unwrap_err(),
        PathError::AtRoot
    );
    assert_eq!(cwd.resolve("../../..", false).unwrap_err(), PathError::AtRoot);
}

#[test]
fn relative_name_at_root_is_a_share() {
    let path = FtpPath::root().resolve("docs", true).unwrap();
    assert_eq!(path.share_name(), Some("docs"));
    assert!(path.is_root_share_path());
}

#[test]
fn binds_share_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    let shares = vec![Arc::new(Share::new("Docs", Arc::new(LocalDisk::new(dir.path()))))];

    let mut path = FtpPath::from_ftp_path("/docs/x").unwrap();
    assert!(path.set_shared_device(&shares));
    assert_eq!(path.share().map(|s| s.name()), Some("Docs"));

    // the bound share survives moving within it and is dropped at the root
    path.remove_directory();
    assert!(path.share().is_some());
    path.remove_directory();
    assert!(path.share().is_none());

    let mut missing = FtpPath::from_ftp_path("/nope").unwrap();
    assert!(!missing.set_shared_device(&shares));
}

#[test]
fn share_path_to_file() {
    let root = FtpPath::from_ftp_path("/docs").unwrap();
    assert_eq!(root.make_share_path_to_file("x"), "\\x");
    let sub = FtpPath::from_ftp_path("/docs/a").unwrap();
    assert_eq!(sub.make_share_path_to_file("x"), "\\a\\x");
}
