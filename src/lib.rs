//! # Disentangle Data
//!
//! 解耦表征学习（disentanglement learning）实验用的 ground-truth 数据集注册表：
//! 按名称（如 `dsprites_full`、`mpi3d_toy`、`arrow`）解析出因子已知的数据集，
//! 并为多个 VAE 变体的批量训练生成实验计划。
//!
//! - [`data`]: 注册表、参数预设、数据集接口与内置实现
//! - [`config`]: 数据目录配置
//! - [`experiment`]: 模型 × 重复次数的训练编排
//!

pub mod config;
pub mod data;
pub mod experiment;
