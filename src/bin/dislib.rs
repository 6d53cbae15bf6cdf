//! 数据集注册表命令行工具
//!
//! ```text
//! dislib list
//! dislib show arrow
//! dislib sample dummy_data --num 8 --seed 0
//! dislib plan study.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use disentangle_data::config::DataConfig;
use disentangle_data::data::registry::{self, discrepancies_for};
use disentangle_data::data::{DatasetRegistry, DatasetSource, DiskLoader};
use disentangle_data::experiment::StudyConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ground-truth 数据集注册表")]
struct Cli {
    /// 数据配置文件（JSON），未指定时读取环境变量
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 覆盖数据根目录
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出全部已注册的数据集
    List,
    /// 以 JSON 打印某个数据集的注册信息
    Show { name: String },
    /// 加载数据集并采样，打印因子与观测的形状
    Sample {
        name: String,
        #[arg(long, default_value_t = 16)]
        num: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// 打印实验配置展开后的训练任务
    Plan { study: PathBuf },
}

fn load_config(cli: &Cli) -> Result<DataConfig> {
    let mut config = match &cli.config {
        Some(path) => DataConfig::from_json_file(path)?,
        None => DataConfig::from_env(),
    };
    if let Some(root) = &cli.data_root {
        config.data_root = root.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::List => {
            for entry in registry::REGISTRY {
                let source = match entry.source {
                    DatasetSource::Builtin(dataset) => dataset.to_string(),
                    DatasetSource::Preset(preset) => {
                        format!("preset {}", serde_json::to_string(preset)?)
                    }
                };
                println!("{:<18} {}", entry.name, source);
            }
        }
        Command::Show { name } => {
            let entry = registry::lookup(name)?;
            println!("{}", serde_json::to_string_pretty(entry)?);
            for d in discrepancies_for(name) {
                println!("注意: {}", d.summary);
            }
        }
        Command::Sample { name, num, seed } => {
            let config = load_config(&cli)?;
            let registry = DatasetRegistry::new(DiskLoader::new(config));
            let dataset = registry
                .resolve(name)
                .with_context(|| format!("无法加载数据集 {name}"))?;
            let mut rng = StdRng::seed_from_u64(*seed);
            let (factors, observations) = dataset.sample(*num, &mut rng)?;
            println!("因子取值个数: {:?}", dataset.factors_num_values());
            println!("因子形状: {:?}", factors.shape());
            println!("观测形状: {:?}", observations.shape());
        }
        Command::Plan { study } => {
            let study = StudyConfig::from_json_file(study)?;
            let runs = study.plan()?;
            println!("{}", serde_json::to_string_pretty(&runs)?);
        }
    }
    Ok(())
}
