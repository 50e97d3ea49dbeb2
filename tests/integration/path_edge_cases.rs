use integrisync::actions::{dir_sizes, transfer, TransferConfig};
use integrisync::explorer::{
    normalize_relative, Eligibility, Explorer, ExplorerError, Item, Roots, Side, SIDECAR_OVERHEAD,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn explorer() -> (TempDir, Explorer) {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dst).unwrap();
    (dir, Explorer::new(Roots::new(src, dst), Eligibility::default(), 32))
}

#[test]
fn test_dot_segments_share_entry() {
    let (dir, explorer) = explorer();
    fs::create_dir_all(dir.path().join("src/a")).unwrap();
    fs::write(dir.path().join("src/a/f.jpg"), b"f").unwrap();

    explorer.resolve(Side::Source, "./a/./f.jpg").unwrap();
    let plain = explorer.lookup("a/f.jpg").unwrap();
    let dotted = explorer.lookup("./a/f.jpg").unwrap();
    assert!(Arc::ptr_eq(&plain, &dotted));
    assert_eq!(plain.path(), Path::new("a/f.jpg"));
}

#[test]
fn test_unicode_forms_share_entry() {
    let (dir, explorer) = explorer();
    let composed = "caf\u{e9}.jpg";
    let decomposed = "cafe\u{301}.jpg";
    fs::write(dir.path().join("src").join(composed), b"coffee").unwrap();

    explorer.resolve(Side::Source, composed).unwrap();
    let entry = explorer.lookup(decomposed).unwrap();
    assert!(entry.src_file().is_some());
    assert_eq!(normalize_relative(Path::new(decomposed)).unwrap(), PathBuf::from(composed));
}

#[test]
fn test_escaping_paths_rejected() {
    let (_dir, explorer) = explorer();
    for bad in ["../x.jpg", "a/../../x.jpg", "/etc/passwd"] {
        assert!(
            matches!(
                explorer.resolve(Side::Source, bad),
                Err(ExplorerError::PathEscapesRoot(_))
            ),
            "{bad}"
        );
    }
    assert!(explorer.registry().is_empty());
}

#[test]
fn test_names_with_spaces_and_multiple_dots() {
    let (dir, explorer) = explorer();
    fs::create_dir_all(dir.path().join("src/My Photos")).unwrap();
    fs::write(dir.path().join("src/My Photos/img.final.v2.jpg"), b"v2").unwrap();

    let item = explorer
        .resolve(Side::Source, "My Photos/img.final.v2.jpg")
        .unwrap();
    let file = item.as_file().unwrap();
    assert_eq!(file.name(), "img.final.v2.jpg");
    file.update_hash_file().unwrap();
    assert!(dir
        .path()
        .join("src/My Photos/img.final.v2.jpg.blake2")
        .exists());
}

#[test]
fn test_resolve_at_root_paths() {
    let (dir, explorer) = explorer();
    let dst_root = dir.path().join("dst");
    assert!(matches!(
        explorer.resolve_at(&dst_root, "").unwrap(),
        Item::Directory(_)
    ));
    assert!(matches!(
        explorer.resolve_at(dir.path(), ""),
        Err(ExplorerError::InvalidRoot(_))
    ));
}

#[test]
fn test_same_root_on_both_sides_resolves_as_source() {
    let dir = TempDir::new().unwrap();
    let explorer = Explorer::new(
        Roots::new(dir.path(), dir.path()),
        Eligibility::default(),
        32,
    );
    let item = explorer.resolve_at(dir.path(), "").unwrap();
    assert_eq!(item.side(), Side::Source);
}

#[test]
fn test_decomposed_name_counts_and_transfers() {
    let (dir, explorer) = explorer();
    let decomposed = "cafe\u{301}.jpg";
    fs::create_dir_all(dir.path().join("src/album")).unwrap();
    fs::write(dir.path().join("src/album").join(decomposed), b"0123456789").unwrap();

    let sizes = dir_sizes(&explorer, Path::new("album")).unwrap();
    assert_eq!(sizes.src_size, 10 + SIDECAR_OVERHEAD);

    let summary = transfer(
        &explorer,
        Side::Source,
        Path::new("album"),
        &TransferConfig::default(),
    )
    .unwrap();
    assert!(summary.failures.is_empty());
    assert_eq!(summary.files.len(), 1);
    assert_eq!(
        fs::read(dir.path().join("dst/album").join(decomposed)).unwrap(),
        b"0123456789"
    );
    assert!(dir
        .path()
        .join("dst/album")
        .join(format!("{decomposed}.blake2"))
        .exists());
}
