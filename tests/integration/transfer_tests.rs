use integrisync::actions::{transfer, transfer_file, TransferConfig, TransferError};
use integrisync::explorer::{Eligibility, Explorer, ExplorerError, Roots, Side};
use std::fs;
use std::path::Path;
use std::thread;
use tempfile::TempDir;

fn explorer() -> (TempDir, Explorer) {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir_all(src.join("album")).unwrap();
    fs::create_dir_all(&dst).unwrap();
    let eligibility = Eligibility::default().with_extensions(["jpg"]);
    (dir, Explorer::new(Roots::new(src, dst), eligibility, 8))
}

#[test]
fn test_directory_transfer_mirrors_only_eligible_files() {
    let (dir, explorer) = explorer();
    fs::write(dir.path().join("src/album/a.jpg"), b"a photo").unwrap();
    fs::write(dir.path().join("src/album/notes.txt"), b"skip me").unwrap();
    fs::write(dir.path().join("src/album/.thumb.jpg"), b"hidden").unwrap();

    let summary = transfer(
        &explorer,
        Side::Source,
        Path::new("album"),
        &TransferConfig::default(),
    )
    .unwrap();

    assert_eq!(summary.files.len(), 1);
    assert!(dir.path().join("dst/album/a.jpg").exists());
    assert!(dir.path().join("dst/album/a.jpg.blake2").exists());
    assert!(!dir.path().join("dst/album/notes.txt").exists());
    assert!(!dir.path().join("dst/album/.thumb.jpg").exists());
}

#[test]
fn test_transfer_repairs_corrupt_destination() {
    let (dir, explorer) = explorer();
    fs::write(dir.path().join("src/album/a.jpg"), b"0123456789abcdef").unwrap();
    transfer_file(&explorer, Side::Source, Path::new("album/a.jpg")).unwrap();

    fs::write(dir.path().join("dst/album/a.jpg"), b"0123456789abXdef").unwrap();
    let dst = explorer
        .lookup("album/a.jpg")
        .unwrap()
        .dst_file()
        .unwrap();
    assert!(dst.corrupt().unwrap());

    let outcome = transfer_file(&explorer, Side::Source, Path::new("album/a.jpg")).unwrap();
    assert_eq!(outcome.stats.unwrap().chunks_written, 1);
    assert!(!dst.corrupt().unwrap());
    assert_eq!(
        fs::read(dir.path().join("dst/album/a.jpg")).unwrap(),
        b"0123456789abcdef"
    );
}

#[test]
fn test_sidecar_refreshed_even_without_changes() {
    let (dir, explorer) = explorer();
    fs::write(dir.path().join("src/album/a.jpg"), b"same").unwrap();
    fs::create_dir_all(dir.path().join("dst/album")).unwrap();
    fs::write(dir.path().join("dst/album/a.jpg"), b"same").unwrap();

    let outcome = transfer_file(&explorer, Side::Source, Path::new("album/a.jpg")).unwrap();
    assert!(outcome.stats.is_none());
    assert_eq!(
        fs::read_to_string(dir.path().join("dst/album/a.jpg.blake2")).unwrap(),
        outcome.digest
    );
}

#[test]
fn test_concurrent_transfers_of_same_path_converge() {
    let (dir, explorer) = explorer();
    let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(dir.path().join("src/album/big.jpg"), &content).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let explorer = explorer.clone();
            thread::spawn(move || {
                transfer_file(&explorer, Side::Source, Path::new("album/big.jpg")).unwrap()
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(fs::read(dir.path().join("dst/album/big.jpg")).unwrap(), content);
    // exactly one thread created the file; later ones found it in sync
    let created = outcomes
        .iter()
        .filter(|o| o.stats.is_some_and(|s| s.created))
        .count();
    assert_eq!(created, 1);
    assert!(outcomes.windows(2).all(|w| w[0].digest == w[1].digest));
}

#[test]
fn test_transfer_of_missing_path_is_not_found() {
    let (_dir, explorer) = explorer();
    let result = transfer(
        &explorer,
        Side::Destination,
        Path::new("album"),
        &TransferConfig::default(),
    );
    assert!(matches!(
        result,
        Err(TransferError::Explorer(ExplorerError::NotFound(_)))
    ));
}
