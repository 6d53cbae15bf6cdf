/*
 * @Description  : 解耦实验的训练计划
 *
 * 对同一个数据集，按 模型 × 重复次数 展开训练任务，确定每次任务的输出目录与配置文件。
 * 训练本身（VAE 的前向、损失、优化）交给注入的 Trainer，本模块只负责编排。
 *
 * 输出目录布局：<base_path>/<dataset>_<model>_<repetition>/<model>
 */

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::data::UnknownDatasetError;
use crate::data::registry;

#[cfg(test)]
mod tests;

/// 训练器返回的错误
pub type TrainerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    UnknownDataset(#[from] UnknownDatasetError),

    #[error("实验计划为空：至少需要一个模型和一次重复")]
    EmptyStudy,

    #[error("输出目录已存在且未允许覆盖: {0}")]
    OutputExists(PathBuf),

    #[error("训练任务 {run} 失败: {source}")]
    Training { run: String, source: TrainerError },

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 支持的 VAE 变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "betavae")]
    BetaVae,
    #[serde(rename = "factorvae")]
    FactorVae,
    #[serde(rename = "tcvae")]
    BetaTcVae,
    #[serde(rename = "dipvae")]
    DipVae,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::BetaVae,
        ModelKind::FactorVae,
        ModelKind::BetaTcVae,
        ModelKind::DipVae,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BetaVae => "betavae",
            Self::FactorVae => "factorvae",
            Self::BetaTcVae => "tcvae",
            Self::DipVae => "dipvae",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("未知的模型: {s}"))
    }
}

/// 实验配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// 所有结果的根目录
    pub base_path: PathBuf,
    /// 注册表中的数据集名称
    pub dataset: String,
    pub models: Vec<ModelKind>,
    /// 每个模型的重复训练次数
    pub repetitions: usize,
    /// 是否覆盖已存在的输出目录
    pub overwrite: bool,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("results"),
            dataset: "modelnet".to_string(),
            models: vec![ModelKind::BetaTcVae, ModelKind::BetaVae, ModelKind::FactorVae],
            repetitions: 1,
            overwrite: false,
        }
    }
}

/// 单次训练任务
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingRun {
    pub dataset: String,
    pub model: ModelKind,
    pub repetition: usize,
    pub output_dir: PathBuf,
    /// 依次应用的配置文件，后者覆盖前者
    pub config_files: Vec<String>,
}

impl TrainingRun {
    /// 形如 `modelnet_tcvae_0`
    pub fn label(&self) -> String {
        format!("{}_{}_{}", self.dataset, self.model, self.repetition)
    }
}

impl StudyConfig {
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

    /// 展开训练任务；数据集名称必须已注册
    pub fn plan(&self) -> Result<Vec<TrainingRun>, StudyError> {
        registry::lookup(&self.dataset)?;
        if self.models.is_empty() || self.repetitions == 0 {
            return Err(StudyError::EmptyStudy);
        }

        let mut runs = Vec::with_capacity(self.models.len() * self.repetitions);
        for &model in &self.models {
            for repetition in 0..self.repetitions {
                let run_dir = format!("{}_{}_{}", self.dataset, model, repetition);
                runs.push(TrainingRun {
                    dataset: self.dataset.clone(),
                    model,
                    repetition,
                    output_dir: self.base_path.join(run_dir).join(model.as_str()),
                    config_files: vec![
                        "model.gin".to_string(),
                        format!("{}_{}.gin", self.dataset, model),
                    ],
                });
            }
        }
        Ok(runs)
    }
}

/// 执行单次训练的外部实现
pub trait Trainer {
    fn train(&self, run: &TrainingRun) -> Result<(), TrainerError>;
}

impl<F> Trainer for F
where
    F: Fn(&TrainingRun) -> Result<(), TrainerError>,
{
    fn train(&self, run: &TrainingRun) -> Result<(), TrainerError> {
        self(run)
    }
}

/// 实验执行结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct StudyReport {
    pub completed: Vec<TrainingRun>,
}

/// 按计划依次训练
///
/// 未允许覆盖时，任何一个输出目录已存在都会在开始训练前报错；
/// 允许覆盖时，先清空已存在的输出目录。
pub fn run_study(config: &StudyConfig, trainer: &dyn Trainer) -> Result<StudyReport, StudyError> {
    let runs = config.plan()?;

    if !config.overwrite {
        if let Some(run) = runs.iter().find(|run| run.output_dir.exists()) {
            return Err(StudyError::OutputExists(run.output_dir.clone()));
        }
    }

    log::info!(
        "数据集 {}：{} 个模型 × {} 次重复",
        config.dataset,
        config.models.len(),
        config.repetitions
    );

    let mut report = StudyReport::default();
    for run in runs {
        if run.output_dir.exists() {
            log::info!("覆盖已存在的输出目录 {:?}", run.output_dir);
            fs::remove_dir_all(&run.output_dir)?;
        }
        fs::create_dir_all(&run.output_dir)?;

        log::info!("开始训练 {} -> {:?}", run.label(), run.output_dir);
        trainer.train(&run).map_err(|source| StudyError::Training {
            run: run.label(),
            source,
        })?;
        report.completed.push(run);
    }
    Ok(report)
}
