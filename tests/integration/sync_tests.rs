use integrisync::explorer::{Eligibility, Explorer, File, Roots, Side};
use std::fs;
use tempfile::TempDir;

fn explorer(chunk_size: usize) -> (TempDir, Explorer) {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dst).unwrap();
    (
        dir,
        Explorer::new(Roots::new(src, dst), Eligibility::default(), chunk_size),
    )
}

fn pair(explorer: &Explorer, name: &str) -> (File, File) {
    let src = explorer
        .resolve(Side::Source, name)
        .unwrap()
        .into_file()
        .unwrap();
    let dst = explorer.mirror(&src);
    (src, dst)
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

#[test]
fn test_large_file_single_byte_change() {
    let (dir, explorer) = explorer(4096);
    let content = pattern(1024 * 1024 + 17, 7);
    fs::write(dir.path().join("src/big.bin"), &content).unwrap();
    let (src, dst) = pair(&explorer, "big.bin");

    let stats = explorer.sync(&src, &dst).unwrap();
    assert!(stats.created);

    let mut changed = content.clone();
    changed[500_000] ^= 0xff;
    fs::write(dir.path().join("src/big.bin"), &changed).unwrap();

    let stats = explorer.sync(&src, &dst).unwrap();
    assert!(!stats.created);
    assert_eq!(stats.chunks_written, 1);
    assert_eq!(stats.bytes_written, 4096);
    assert_eq!(stats.chunks_compared, 257);
    assert_eq!(fs::read(dst.full_path()).unwrap(), changed);
}

#[test]
fn test_sync_then_hash_matches() {
    let (dir, explorer) = explorer(64);
    fs::write(dir.path().join("src/a.bin"), pattern(1000, 1)).unwrap();
    fs::write(dir.path().join("dst/a.bin"), pattern(700, 2)).unwrap();
    let (src, dst) = pair(&explorer, "a.bin");

    explorer.sync(&src, &dst).unwrap();
    assert_eq!(src.hash().unwrap(), dst.hash().unwrap());

    dst.update_hash_file().unwrap();
    assert!(!dst.corrupt().unwrap());
    assert_eq!(dst.clean_hash().unwrap(), src.hash().unwrap());
}

#[test]
fn test_chunk_size_does_not_change_result() {
    let content = pattern(333, 9);
    for chunk_size in [1, 2, 7, 64, 333, 334, 4096] {
        let (dir, explorer) = explorer(chunk_size);
        fs::write(dir.path().join("src/f.bin"), &content).unwrap();
        fs::write(dir.path().join("dst/f.bin"), pattern(500, 3)).unwrap();
        let (src, dst) = pair(&explorer, "f.bin");
        let stats = explorer.sync(&src, &dst).unwrap();
        assert!(stats.truncated, "chunk size {chunk_size}");
        assert_eq!(fs::read(dst.full_path()).unwrap(), content);
    }
}

#[test]
fn test_sync_into_nested_missing_directories() {
    let (dir, explorer) = explorer(16);
    fs::create_dir_all(dir.path().join("src/x/y/z")).unwrap();
    fs::write(dir.path().join("src/x/y/z/f.jpg"), b"deep").unwrap();
    let (src, dst) = pair(&explorer, "x/y/z/f.jpg");
    explorer.sync(&src, &dst).unwrap();
    assert_eq!(fs::read(dir.path().join("dst/x/y/z/f.jpg")).unwrap(), b"deep");
}
