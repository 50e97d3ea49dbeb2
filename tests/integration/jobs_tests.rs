use integrisync::explorer::{Eligibility, Explorer, Roots, Side};
use integrisync::jobs::{generate_new_hashes, verify_all_hashes, JobConfig, JobError};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

fn library(eligibility: Eligibility) -> (TempDir, Explorer) {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    for (path, content) in [
        ("2022/old.jpg", "old"),
        ("2023/a.jpg", "alpha"),
        ("2023/deep/er/b.jpg", "bravo"),
        ("2023/.hidden/c.jpg", "charlie"),
        ("2023/.d.jpg", "delta"),
        ("2023/e.JPG", "echo"),
        ("2023/f.txt", "foxtrot"),
        ("trash/g.jpg", "golf"),
    ] {
        let full = src.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    fs::create_dir_all(dir.path().join("dst")).unwrap();
    let explorer = Explorer::new(Roots::new(src, dir.path().join("dst")), eligibility, 3);
    (dir, explorer)
}

fn dirs(names: &[&str]) -> JobConfig {
    JobConfig::default()
        .with_directories(names.iter().map(PathBuf::from).collect())
        .with_io_threads(3)
}

#[test]
fn test_generate_respects_eligibility() {
    let (_dir, explorer) = library(Eligibility::default().with_extensions(["jpg"]));
    let report = generate_new_hashes(&explorer, &dirs(&["2023"])).unwrap();
    assert_eq!(report.paths, vec!["2023/a.jpg", "2023/deep/er/b.jpg", "2023/e.JPG"]);
    assert_eq!(report.analyzed, 3);
    assert!(report.failures.is_empty());
}

#[test]
fn test_whole_root_honors_top_level_rules() {
    let eligibility = Eligibility::default()
        .with_extensions(["jpg"])
        .with_blacklist(["trash"])
        .with_root_directories(["2022", "2023", "trash"]);
    let (_dir, explorer) = library(eligibility);
    let report = generate_new_hashes(&explorer, &JobConfig::default()).unwrap();
    assert_eq!(report.analyzed, 4);
    assert!(report.paths.iter().all(|p| !p.starts_with("trash")));
    assert_eq!(report.paths[0], "2022/old.jpg");
}

#[test]
fn test_verify_lifecycle() {
    let (dir, explorer) = library(Eligibility::default().with_extensions(["jpg"]));
    let config = dirs(&["2022", "2023"]);

    // unhashed files are never corrupt
    let report = verify_all_hashes(&explorer, &config).unwrap();
    assert_eq!(report.analyzed, 4);
    assert!(!report.has_paths());

    generate_new_hashes(&explorer, &config).unwrap();
    fs::write(dir.path().join("src/2023/deep/er/b.jpg"), "BRAVO").unwrap();
    fs::write(dir.path().join("src/2022/old.jpg"), "new").unwrap();

    let report = verify_all_hashes(&explorer, &config).unwrap();
    assert_eq!(report.paths, vec!["2022/old.jpg", "2023/deep/er/b.jpg"]);

    // refreshing one side-car clears it from the next report
    let file = explorer
        .resolve(Side::Source, "2022/old.jpg")
        .unwrap()
        .into_file()
        .unwrap();
    file.update_hash_file().unwrap();
    let report = verify_all_hashes(&explorer, &config).unwrap();
    assert_eq!(report.paths, vec!["2023/deep/er/b.jpg"]);
}

#[test]
fn test_generate_skips_files_with_sidecars() {
    let (dir, explorer) = library(Eligibility::default().with_extensions(["jpg"]));
    fs::write(dir.path().join("src/2023/a.jpg.blake2"), "f".repeat(128)).unwrap();
    let report = generate_new_hashes(&explorer, &dirs(&["2023"])).unwrap();
    assert!(!report.paths.contains(&"2023/a.jpg".to_string()));
    // the stale side-car is left for verify to flag
    let report = verify_all_hashes(&explorer, &dirs(&["2023"])).unwrap();
    assert_eq!(report.paths, vec!["2023/a.jpg"]);
}

#[test]
fn test_jobs_stop_on_shutdown() {
    let (_dir, explorer) = library(Eligibility::default());
    let flag = Arc::new(AtomicBool::new(true));
    let config = dirs(&["2023"]).with_shutdown_flag(flag);
    assert!(matches!(
        verify_all_hashes(&explorer, &config),
        Err(JobError::Interrupted)
    ));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_reported_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, explorer) = library(Eligibility::default().with_extensions(["jpg"]));
    let locked = dir.path().join("src/2023/a.jpg");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&locked).is_ok() {
        // running as root; permissions are not enforced
        return;
    }

    let report = generate_new_hashes(&explorer, &dirs(&["2023"])).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "2023/a.jpg");
    assert_eq!(report.analyzed, 2);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}
