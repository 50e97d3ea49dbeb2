use integrisync::explorer::{
    Eligibility, Explorer, ExplorerError, Item, PairRegistry, Roots, Side,
};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn explorer() -> (TempDir, Explorer) {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir_all(src.join("a")).unwrap();
    fs::create_dir_all(dst.join("a")).unwrap();
    (dir, Explorer::new(Roots::new(src, dst), Eligibility::default(), 16))
}

#[test]
fn test_entry_links_both_sides() {
    let (dir, explorer) = explorer();
    fs::write(dir.path().join("src/a/x.jpg"), b"x").unwrap();
    fs::write(dir.path().join("dst/a/x.jpg"), b"x").unwrap();

    explorer.resolve(Side::Source, "a/x.jpg").unwrap();
    let entry = explorer.lookup("a/x.jpg").unwrap();
    assert!(entry.src_file().is_some());
    assert!(entry.dst_file().is_none());

    explorer.resolve(Side::Destination, "a/x.jpg").unwrap();
    let same = explorer.lookup("a/x.jpg").unwrap();
    assert!(Arc::ptr_eq(&entry, &same));
    assert_eq!(same.dst_file().unwrap().side(), Side::Destination);
    assert_eq!(explorer.registry().len(), 1);
}

#[test]
fn test_deleted_file_drops_out_of_entry() {
    let (dir, explorer) = explorer();
    let path = dir.path().join("src/a/x.jpg");
    fs::write(&path, b"x").unwrap();
    explorer.resolve(Side::Source, "a/x.jpg").unwrap();

    fs::remove_file(&path).unwrap();
    let entry = explorer.lookup("a/x.jpg").unwrap();
    assert!(entry.src_file().is_none());
    // the entry itself survives
    assert!(explorer.lookup("a/x.jpg").is_ok());
}

#[test]
fn test_shared_registry_between_explorers() {
    let (dir, first) = explorer();
    let registry = Arc::new(PairRegistry::new());
    let first = first.with_registry(Arc::clone(&registry));
    let second = Explorer::new(
        Roots::new(dir.path().join("src"), dir.path().join("dst")),
        Eligibility::default(),
        16,
    )
    .with_registry(Arc::clone(&registry));

    fs::write(dir.path().join("src/a/x.jpg"), b"x").unwrap();
    first.resolve(Side::Source, "a/x.jpg").unwrap();
    assert!(second.lookup("a/x.jpg").unwrap().src_file().is_some());

    registry.clear();
    assert!(matches!(
        second.lookup("a/x.jpg"),
        Err(ExplorerError::NotFound(_))
    ));
}

#[test]
fn test_directories_are_not_registered() {
    let (_dir, explorer) = explorer();
    assert!(matches!(
        explorer.resolve(Side::Source, "a").unwrap(),
        Item::Directory(_)
    ));
    assert!(explorer.registry().is_empty());
}

#[test]
fn test_parallel_resolution_of_many_paths() {
    let (dir, explorer) = explorer();
    for i in 0..32 {
        fs::write(dir.path().join(format!("src/a/{i}.jpg")), i.to_string()).unwrap();
    }

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let explorer = explorer.clone();
            thread::spawn(move || {
                for i in 0..32 {
                    explorer
                        .resolve(Side::Source, format!("a/{i}.jpg"))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(explorer.registry().len(), 32);
    for i in 0..32 {
        assert!(explorer.lookup(format!("a/{i}.jpg")).unwrap().src_file().is_some());
    }
}
