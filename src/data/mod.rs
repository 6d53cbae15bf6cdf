//! 数据集模块
//!
//! 按名称解析 ground-truth 数据集，并提供默认的磁盘加载器。
//!
//! # 主要组件
//!
//! - [`DatasetRegistry`]: 名称 → 数据集的只读注册表
//! - [`DatasetLoader`]: 注入注册表的数据集工厂；[`DiskLoader`] 为默认实现
//! - [`GroundTruthData`]: 数据集句柄接口（采样因子、由因子生成观测）
//! - [`preset`]: 通用加载器的参数预设
//! - [`datasets`]: 内置数据集实现
//! - [`DataError`] / [`ResolveError`] / [`UnknownDatasetError`]: 错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use disentangle_data::data::{DatasetRegistry, DiskLoader};
//! use disentangle_data::config::DataConfig;
//!
//! let registry = DatasetRegistry::new(DiskLoader::new(DataConfig::from_env()));
//! let dataset = registry.resolve("dsprites_full")?;
//!
//! let mut rng = rand::thread_rng();
//! let (factors, observations) = dataset.sample(64, &mut rng)?;
//! ```

pub mod datasets;
pub mod download;
pub mod error;
pub mod ground_truth;
pub mod loader;
pub mod preset;
pub mod registry;

#[cfg(test)]
mod tests;

// Re-exports
pub use error::{DataError, ResolveError, UnknownDatasetError};
pub use ground_truth::GroundTruthData;
pub use loader::{BuiltinDataset, DatasetLoader, DiskLoader};
pub use preset::{Preset, PresetValue};
pub use registry::{
    DatasetRegistry, DatasetSource, Discrepancy, KNOWN_DISCREPANCIES, REGISTRY, RegistryEntry,
    resolve,
};
