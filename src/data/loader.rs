//! 数据集加载器
//!
//! 注册表只决定“哪个数据集、用什么参数”，真正的构造交给实现了 [`DatasetLoader`]
//! 的加载器。加载器在进程启动时注入一次；测试可注入记录参数的桩实现。

use std::fmt;

use serde::Serialize;

use crate::config::DataConfig;

use super::datasets::{
    ArchiveData, ArrowData, DSprites, DSpritesVariant, DummyData, Mpi3dMode, SmallNorb,
    WrappedPixelData, archive_path,
};
use super::error::DataError;
use super::ground_truth::GroundTruthData;
use super::preset::Preset;

/// 内置数据集变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuiltinDataset {
    #[serde(rename = "dsprites")]
    DSprites { latent_factor_indices: &'static [usize] },
    #[serde(rename = "color_dsprites")]
    ColorDSprites { latent_factor_indices: &'static [usize] },
    #[serde(rename = "noisy_dsprites")]
    NoisyDSprites { latent_factor_indices: &'static [usize] },
    #[serde(rename = "scream_dsprites")]
    ScreamDSprites { latent_factor_indices: &'static [usize] },
    #[serde(rename = "smallnorb")]
    SmallNorb,
    Cars3d,
    Mpi3d { mode: Mpi3dMode },
    Shapes3d,
    DummyData,
}

impl fmt::Display for BuiltinDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DSprites { latent_factor_indices } => {
                write!(f, "DSprites({latent_factor_indices:?})")
            }
            Self::ColorDSprites { latent_factor_indices } => {
                write!(f, "ColorDSprites({latent_factor_indices:?})")
            }
            Self::NoisyDSprites { latent_factor_indices } => {
                write!(f, "NoisyDSprites({latent_factor_indices:?})")
            }
            Self::ScreamDSprites { latent_factor_indices } => {
                write!(f, "ScreamDSprites({latent_factor_indices:?})")
            }
            Self::SmallNorb => write!(f, "SmallNORB"),
            Self::Cars3d => write!(f, "Cars3D"),
            Self::Mpi3d { mode } => write!(f, "MPI3D({})", mode.as_str()),
            Self::Shapes3d => write!(f, "Shapes3D"),
            Self::DummyData => write!(f, "DummyData"),
        }
    }
}

/// 注入注册表的数据集工厂
pub trait DatasetLoader: Send + Sync {
    /// 构造内置数据集
    fn load_builtin(&self, dataset: BuiltinDataset) -> Result<Box<dyn GroundTruthData>, DataError>;

    /// 以预设参数调用通用加载器，预设须原样使用
    fn load_preset(&self, preset: &'static Preset) -> Result<Box<dyn GroundTruthData>, DataError>;
}

impl<L: DatasetLoader + ?Sized> DatasetLoader for &L {
    fn load_builtin(&self, dataset: BuiltinDataset) -> Result<Box<dyn GroundTruthData>, DataError> {
        (**self).load_builtin(dataset)
    }

    fn load_preset(&self, preset: &'static Preset) -> Result<Box<dyn GroundTruthData>, DataError> {
        (**self).load_preset(preset)
    }
}

impl<L: DatasetLoader + ?Sized> DatasetLoader for Box<L> {
    fn load_builtin(&self, dataset: BuiltinDataset) -> Result<Box<dyn GroundTruthData>, DataError> {
        (**self).load_builtin(dataset)
    }

    fn load_preset(&self, preset: &'static Preset) -> Result<Box<dyn GroundTruthData>, DataError> {
        (**self).load_preset(preset)
    }
}

/// 默认加载器：从 `config.data_root` 读取内置数据集，按预设渲染或读取通用归档
#[derive(Debug, Clone, Default)]
pub struct DiskLoader {
    config: DataConfig,
}

impl DiskLoader {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    fn dsprites(
        &self,
        latent_factor_indices: &[usize],
        variant: DSpritesVariant,
    ) -> Result<Box<dyn GroundTruthData>, DataError> {
        let root = &self.config.data_root;
        Ok(Box::new(DSprites::load(
            root,
            latent_factor_indices,
            variant,
            self.config.download,
        )?))
    }
}

impl DatasetLoader for DiskLoader {
    fn load_builtin(&self, dataset: BuiltinDataset) -> Result<Box<dyn GroundTruthData>, DataError> {
        let root = &self.config.data_root;
        match dataset {
            BuiltinDataset::DSprites {
                latent_factor_indices,
            } => self.dsprites(latent_factor_indices, DSpritesVariant::Plain),
            BuiltinDataset::ColorDSprites {
                latent_factor_indices,
            } => self.dsprites(latent_factor_indices, DSpritesVariant::Color),
            BuiltinDataset::NoisyDSprites {
                latent_factor_indices,
            } => self.dsprites(latent_factor_indices, DSpritesVariant::Noisy),
            BuiltinDataset::ScreamDSprites {
                latent_factor_indices,
            } => {
                let background = DSprites::load_scream_background(root, self.config.download)?;
                self.dsprites(latent_factor_indices, DSpritesVariant::Scream(background))
            }
            BuiltinDataset::SmallNorb => Ok(Box::new(SmallNorb::load(root)?)),
            BuiltinDataset::Cars3d => Ok(Box::new(ArchiveData::cars3d(root)?)),
            BuiltinDataset::Mpi3d { mode } => Ok(Box::new(ArchiveData::mpi3d(root, mode)?)),
            BuiltinDataset::Shapes3d => Ok(Box::new(ArchiveData::shapes3d(root)?)),
            BuiltinDataset::DummyData => Ok(Box::new(DummyData::new())),
        }
    }

    fn load_preset(&self, preset: &'static Preset) -> Result<Box<dyn GroundTruthData>, DataError> {
        let data = preset.require_str("data")?;
        match data {
            "pixel" => Ok(Box::new(WrappedPixelData::from_preset(preset)?)),
            "arrow" => Ok(Box::new(ArrowData::from_preset(preset)?)),
            _ => match preset.get_str("dataset_filename") {
                Some(file_name) => {
                    let path = archive_path(&self.config.data_root, file_name);
                    Ok(Box::new(ArchiveData::load_generic(data, &path)?))
                }
                None => Err(DataError::UnsupportedPreset(data.to_string())),
            },
        }
    }
}
