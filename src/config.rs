//! 数据目录配置
//!
//! 进程启动时确定一次，之后只读。来源优先级：
//! 1. 显式构造 / JSON 文件
//! 2. 环境变量 `DISENTANGLEMENT_LIB_DATA`（数据根目录）、`DISLIB_DOWNLOAD`（是否自动下载）
//! 3. 默认缓存目录 `~/.cache/disentangle_data/datasets`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 数据根目录环境变量
pub const DATA_ROOT_ENV: &str = "DISENTANGLEMENT_LIB_DATA";
/// 自动下载开关环境变量（`1` / `true` 开启）
pub const DOWNLOAD_ENV: &str = "DISLIB_DOWNLOAD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// 默认加载器的配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// 各数据集子目录所在的根目录
    pub data_root: PathBuf,
    /// 缺失文件时是否尝试下载（仅部分数据集支持）
    pub download: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_dir(),
            download: false,
        }
    }
}

impl DataConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            download: false,
        }
    }

    pub fn with_download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    /// 从环境变量读取，未设置的项取默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取，便于测试时不触碰进程环境
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_root = lookup(DATA_ROOT_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let download = lookup(DOWNLOAD_ENV)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self {
            data_root,
            download,
        }
    }

    /// 从 JSON 文件读取，缺失字段取默认值
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// 获取默认数据目录
pub fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("disentangle_data")
        .join("datasets")
}
