/*
 * @Description  : 数据目录配置测试（环境变量、JSON 文件）
 */
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use disentangle_data::config::{
    ConfigError, DATA_ROOT_ENV, DOWNLOAD_ENV, DataConfig, default_data_dir,
};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_from_lookup_defaults() {
    let config = DataConfig::from_lookup(lookup_from(&[]));
    assert_eq!(config.data_root, default_data_dir());
    assert!(!config.download);
    assert_eq!(config, DataConfig::default());
}

#[test]
fn test_from_lookup_overrides() {
    let config = DataConfig::from_lookup(lookup_from(&[
        (DATA_ROOT_ENV, "/data/dislib"),
        (DOWNLOAD_ENV, "TRUE"),
    ]));
    assert_eq!(config.data_root, PathBuf::from("/data/dislib"));
    assert!(config.download);

    // 空字符串视为未设置
    let config =
        DataConfig::from_lookup(lookup_from(&[(DATA_ROOT_ENV, "  "), (DOWNLOAD_ENV, "0")]));
    assert_eq!(config.data_root, default_data_dir());
    assert!(!config.download);
}

#[test]
fn test_builder() {
    let config = DataConfig::new("/tmp/datasets").with_download(true);
    assert_eq!(config.data_root, PathBuf::from("/tmp/datasets"));
    assert!(config.download);
}

#[test]
fn test_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    fs::write(&path, r#"{"data_root": "/srv/datasets"}"#).unwrap();

    let config = DataConfig::from_json_file(&path).expect("读取配置失败");
    assert_eq!(config.data_root, PathBuf::from("/srv/datasets"));
    assert!(!config.download);
}

#[test]
fn test_from_json_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(
        DataConfig::from_json_file(&missing),
        Err(ConfigError::Io { ref path, .. }) if *path == missing
    ));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ data_root: ").unwrap();
    assert!(matches!(
        DataConfig::from_json_file(&broken),
        Err(ConfigError::Parse { .. })
    ));
}
