use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use integrisync::config::{Config, ConfigError, ConfigOverrides, ENV_PREFIX};
use integrisync::explorer::{Side, DEFAULT_CHUNK_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // figment without Env so other tests' variables cannot leak in
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    assert_eq!(config.io_threads, 4);
    assert!(config.src_root.is_none());
}

#[test]
fn test_config_load_from_env() {
    // Only a name no other test uses, since tests share the process env
    std::env::set_var("INTEGRISYNC_BLACKLIST", "[zz_env_only, yy_env_only]");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.blacklist, vec!["zz_env_only", "yy_env_only"]);
    assert_eq!(config.io_threads, 4);

    std::env::remove_var("INTEGRISYNC_BLACKLIST");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
src_root = "/srv/photos"
dst_root = "/mnt/backup"
extensions = ["jpg", ".PNG"]
root_directories = ["2023"]
directories = ["2023/summer"]
io_threads = 8
"#,
    )
    .unwrap();

    let config = Config::load(Some(&config_path), &ConfigOverrides::default()).unwrap();
    assert_eq!(config.io_threads, 8);
    assert_eq!(config.directories, vec![PathBuf::from("2023/summer")]);

    let explorer = config.explorer().unwrap();
    assert_eq!(explorer.roots().root(Side::Source), Path::new("/srv/photos"));
    assert_eq!(explorer.roots().root(Side::Destination), Path::new("/mnt/backup"));
    assert!(explorer.eligibility().allows_file(Path::new("a/b.png")));
    assert!(!explorer.eligibility().allows_file(Path::new("a/b.gif")));
}

#[test]
fn test_cli_overrides_win_over_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "src_root = \"/file\"\nchunk_size = 4096\n").unwrap();

    let overrides = ConfigOverrides {
        src_root: Some(PathBuf::from("/cli")),
        chunk_size: Some(512),
        ..ConfigOverrides::default()
    };
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .merge(Serialized::defaults(&overrides))
        .extract()
        .unwrap();
    assert_eq!(config.src_root, Some(PathBuf::from("/cli")));
    assert_eq!(config.chunk_size, 512);
}

#[test]
fn test_invalid_toml_is_load_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "chunk_size = \"big\"\n").unwrap();
    let result = Config::load(Some(&config_path), &ConfigOverrides::default());
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_zero_chunk_size_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "chunk_size = 0\n").unwrap();
    let err = Config::load(Some(&config_path), &ConfigOverrides::default()).unwrap_err();
    assert!(err.to_string().contains("chunk_size"));
}
