//! 数据加载与数据集解析的错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 数据集名称不在注册表中
///
/// 只携带出错的名称，不做任何回退构造。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("无效的数据集名称: {name:?}")]
pub struct UnknownDatasetError {
    pub name: String,
}

impl UnknownDatasetError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// 数据加载相关错误
#[derive(Debug, Error)]
pub enum DataError {
    /// 文件未找到
    #[error("文件未找到: {0}")]
    FileNotFound(PathBuf),

    /// IO 错误
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 格式错误（如 magic number 不匹配）
    #[error("格式错误: {0}")]
    FormatError(String),

    /// 索引越界
    #[error("索引越界: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// 形状不匹配
    #[error("形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// 因子取值越界
    #[error("第 {factor} 个因子取值越界: {value} >= {num_values}")]
    FactorOutOfRange {
        factor: usize,
        value: usize,
        num_values: usize,
    },

    /// 预设参数缺失或类型不符
    #[error("预设 {preset} 的参数无效: {message}")]
    InvalidPreset { preset: String, message: String },

    /// 通用加载器无法处理该预设
    #[error("通用加载器不支持的数据类型: {0}")]
    UnsupportedPreset(String),

    /// npz 归档读取失败
    #[error("npz 读取错误: {0}")]
    Npz(#[from] ndarray_npy::ReadNpzError),

    /// 图像解码失败
    #[error("图像错误: {0}")]
    Image(#[from] image::ImageError),

    /// 下载错误
    #[error("下载错误: {0}")]
    DownloadError(String),
}

/// 按名称解析数据集时的错误
///
/// 加载器自身的错误原样透传，不做包装或重新解释。
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    UnknownDataset(#[from] UnknownDatasetError),

    #[error(transparent)]
    Load(#[from] DataError),
}

impl ResolveError {
    /// 若为未知名称错误，返回出错的名称
    pub fn unknown_name(&self) -> Option<&str> {
        match self {
            Self::UnknownDataset(e) => Some(&e.name),
            Self::Load(_) => None,
        }
    }
}
