/*
 * @Description  : 按名称解析 ground-truth 数据集的注册表
 *
 * 注册表本身是一张编译期确定的只读表：名称 → 内置数据集变体，或 名称 → 通用加载器预设。
 * `resolve` 只做精确匹配与转发，没有内部状态，可在任意线程并发调用。
 */

use std::sync::Once;

use serde::Serialize;

use crate::config::DataConfig;

use super::datasets::Mpi3dMode;
use super::error::{ResolveError, UnknownDatasetError};
use super::ground_truth::GroundTruthData;
use super::loader::{BuiltinDataset, DatasetLoader, DiskLoader};
use super::preset::{ARROW, MODELNET, Preset, WRAPPED_PIXEL4, WRAPPED_PIXEL8};

/// 注册表条目的构造方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSource {
    /// 内置数据集
    Builtin(BuiltinDataset),
    /// 通用加载器 + 参数预设
    Preset(&'static Preset),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub name: &'static str,
    pub source: DatasetSource,
}

const ALL_DSPRITES_FACTORS: &[usize] = &[1, 2, 3, 4, 5];
const DSPRITES_NOSHAPE_FACTORS: &[usize] = &[2, 3, 4, 5];

const fn builtin(name: &'static str, dataset: BuiltinDataset) -> RegistryEntry {
    RegistryEntry {
        name,
        source: DatasetSource::Builtin(dataset),
    }
}

const fn preset(name: &'static str, preset: &'static Preset) -> RegistryEntry {
    RegistryEntry {
        name,
        source: DatasetSource::Preset(preset),
    }
}

/// 全部已知数据集
pub static REGISTRY: &[RegistryEntry] = &[
    builtin(
        "dsprites_full",
        BuiltinDataset::DSprites {
            latent_factor_indices: ALL_DSPRITES_FACTORS,
        },
    ),
    builtin(
        "dsprites_noshape",
        BuiltinDataset::DSprites {
            latent_factor_indices: DSPRITES_NOSHAPE_FACTORS,
        },
    ),
    builtin(
        "color_dsprites",
        BuiltinDataset::ColorDSprites {
            latent_factor_indices: ALL_DSPRITES_FACTORS,
        },
    ),
    builtin(
        "noisy_dsprites",
        BuiltinDataset::NoisyDSprites {
            latent_factor_indices: ALL_DSPRITES_FACTORS,
        },
    ),
    builtin(
        "scream_dsprites",
        BuiltinDataset::ScreamDSprites {
            latent_factor_indices: ALL_DSPRITES_FACTORS,
        },
    ),
    builtin("smallnorb", BuiltinDataset::SmallNorb),
    builtin("cars3d", BuiltinDataset::Cars3d),
    builtin(
        "mpi3d_toy",
        BuiltinDataset::Mpi3d {
            mode: Mpi3dMode::Toy,
        },
    ),
    builtin(
        "mpi3d_realistic",
        BuiltinDataset::Mpi3d {
            mode: Mpi3dMode::Realistic,
        },
    ),
    builtin(
        "mpi3d_real",
        BuiltinDataset::Mpi3d {
            mode: Mpi3dMode::Real,
        },
    ),
    builtin("shapes3d", BuiltinDataset::Shapes3d),
    builtin("dummy_data", BuiltinDataset::DummyData),
    preset("modelnet", &MODELNET),
    preset("arrow", &ARROW),
    preset("pixel4", &WRAPPED_PIXEL4),
    preset("pixel8", &WRAPPED_PIXEL8),
];

/// 已知但尚待确认的数据问题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    /// 受影响的注册表名称
    pub names: &'static [&'static str],
    pub summary: &'static str,
}

/// `pixel8` 的预设与 `pixel4` 完全相同，很可能应为 `square_size: 8`。
/// 维护者确认前不做修改，只在解析时告警。
pub static KNOWN_DISCREPANCIES: &[Discrepancy] = &[Discrepancy {
    names: &["pixel4", "pixel8"],
    summary: "pixel8 与 pixel4 的预设相同（square_size 均为 4），pixel8 可能应使用更大的方块",
}];

/// 名称相关的已知问题
pub fn discrepancies_for(name: &str) -> impl Iterator<Item = &'static Discrepancy> + '_ {
    KNOWN_DISCREPANCIES
        .iter()
        .filter(move |d| d.names.iter().any(|n| *n == name))
}

static DISCREPANCY_WARNING: Once = Once::new();

/// 数据集注册表
///
/// # 示例
/// ```ignore
/// use disentangle_data::data::{DatasetRegistry, DiskLoader};
///
/// let registry = DatasetRegistry::new(DiskLoader::default());
/// let dataset = registry.resolve("dummy_data")?;
/// let (factors, observations) = dataset.sample(16, &mut rand::thread_rng())?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry<L = DiskLoader> {
    loader: L,
}

impl DatasetRegistry<DiskLoader> {
    /// 以默认加载器构建
    pub fn from_config(config: DataConfig) -> Self {
        Self::new(DiskLoader::new(config))
    }
}

impl<L: DatasetLoader> DatasetRegistry<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// 按名称构造数据集
    ///
    /// 每次调用都重新构造一个独立的句柄；加载器的错误原样返回。
    pub fn resolve(&self, name: &str) -> Result<Box<dyn GroundTruthData>, ResolveError> {
        let entry = lookup(name)?;
        log::debug!("解析数据集 {name}");

        if discrepancies_for(name).next().is_some() {
            DISCREPANCY_WARNING.call_once(|| {
                for d in KNOWN_DISCREPANCIES {
                    log::warn!("数据集 {:?}: {}", d.names, d.summary);
                }
            });
        }

        let dataset = match entry.source {
            DatasetSource::Builtin(dataset) => self.loader.load_builtin(dataset)?,
            DatasetSource::Preset(preset) => self.loader.load_preset(preset)?,
        };
        Ok(dataset)
    }
}

/// 精确匹配名称，返回注册表条目
pub fn lookup(name: &str) -> Result<&'static RegistryEntry, UnknownDatasetError> {
    REGISTRY
        .iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| UnknownDatasetError::new(name))
}

/// 名称是否已注册
pub fn contains(name: &str) -> bool {
    lookup(name).is_ok()
}

/// 全部已知名称（注册表顺序）
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|entry| entry.name)
}

/// 以环境变量配置的默认加载器解析数据集
pub fn resolve(name: &str) -> Result<Box<dyn GroundTruthData>, ResolveError> {
    DatasetRegistry::<DiskLoader>::from_config(DataConfig::from_env()).resolve(name)
}
