//! 实验编排单元测试

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use super::{ModelKind, StudyConfig, StudyError, TrainerError, TrainingRun, run_study};

fn study_in(base_path: PathBuf) -> StudyConfig {
    StudyConfig {
        base_path,
        dataset: "dummy_data".to_string(),
        models: vec![ModelKind::BetaVae, ModelKind::BetaTcVae],
        repetitions: 2,
        overwrite: false,
    }
}

#[test]
fn test_plan_layout() {
    let config = study_in(PathBuf::from("/tmp/results"));
    let runs = config.plan().expect("展开计划失败");
    assert_eq!(runs.len(), 4);

    let labels: Vec<_> = runs.iter().map(TrainingRun::label).collect();
    assert_eq!(
        labels,
        [
            "dummy_data_betavae_0",
            "dummy_data_betavae_1",
            "dummy_data_tcvae_0",
            "dummy_data_tcvae_1"
        ]
    );
    assert_eq!(
        runs[2].output_dir,
        PathBuf::from("/tmp/results/dummy_data_tcvae_0/tcvae")
    );
    assert_eq!(
        runs[2].config_files,
        ["model.gin".to_string(), "dummy_data_tcvae.gin".to_string()]
    );
}

#[test]
fn test_plan_unknown_dataset() {
    let mut config = study_in(PathBuf::from("results"));
    config.dataset = "not_a_dataset".to_string();
    match config.plan() {
        Err(StudyError::UnknownDataset(e)) => assert_eq!(e.name, "not_a_dataset"),
        other => panic!("应为 UnknownDataset，实际为 {other:?}"),
    }
}

#[test]
fn test_plan_empty() {
    let mut config = study_in(PathBuf::from("results"));
    config.repetitions = 0;
    assert!(matches!(config.plan(), Err(StudyError::EmptyStudy)));

    let mut config = study_in(PathBuf::from("results"));
    config.models.clear();
    assert!(matches!(config.plan(), Err(StudyError::EmptyStudy)));
}

#[test]
fn test_run_study_creates_output_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let config = study_in(dir.path().to_path_buf());
    let seen = RefCell::new(Vec::new());
    let trainer = |run: &TrainingRun| -> Result<(), TrainerError> {
        assert!(run.output_dir.is_dir());
        seen.borrow_mut().push(run.label());
        Ok(())
    };

    let report = run_study(&config, &trainer).expect("实验执行失败");
    assert_eq!(report.completed.len(), 4);
    assert_eq!(seen.borrow().len(), 4);
    assert!(dir.path().join("dummy_data_betavae_1/betavae").is_dir());
}

#[test]
fn test_run_study_refuses_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = study_in(dir.path().to_path_buf());
    let existing = dir.path().join("dummy_data_tcvae_1/tcvae");
    fs::create_dir_all(&existing).unwrap();

    let calls = RefCell::new(0);
    let trainer = |_: &TrainingRun| -> Result<(), TrainerError> {
        *calls.borrow_mut() += 1;
        Ok(())
    };
    match run_study(&config, &trainer) {
        Err(StudyError::OutputExists(path)) => assert_eq!(path, existing),
        other => panic!("应为 OutputExists，实际为 {other:?}"),
    }
    // 报错发生在任何训练之前
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn test_run_study_overwrite_clears_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = study_in(dir.path().to_path_buf());
    config.overwrite = true;
    let stale = dir.path().join("dummy_data_betavae_0/betavae/stale.txt");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "old").unwrap();

    let trainer = |_: &TrainingRun| -> Result<(), TrainerError> { Ok(()) };
    run_study(&config, &trainer).expect("实验执行失败");
    assert!(!stale.exists());
    assert!(stale.parent().unwrap().is_dir());
}

#[test]
fn test_run_study_trainer_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = study_in(dir.path().to_path_buf());
    let trainer = |run: &TrainingRun| -> Result<(), TrainerError> {
        if run.model == ModelKind::BetaTcVae {
            return Err("梯度爆炸".into());
        }
        Ok(())
    };
    match run_study(&config, &trainer) {
        Err(StudyError::Training { run, source }) => {
            assert_eq!(run, "dummy_data_tcvae_0");
            assert_eq!(source.to_string(), "梯度爆炸");
        }
        other => panic!("应为 Training，实际为 {other:?}"),
    }
}

#[test]
fn test_study_config_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study.json");
    fs::write(&path, r#"{"dataset": "arrow", "models": ["dipvae"]}"#).unwrap();

    let config = StudyConfig::from_json_file(&path).expect("读取配置失败");
    assert_eq!(config.dataset, "arrow");
    assert_eq!(config.models, [ModelKind::DipVae]);
    assert_eq!(config.repetitions, 1);
    assert_eq!(config.base_path, PathBuf::from("results"));
    assert!(!config.overwrite);

    fs::write(&path, r#"{"models": ["vae"]}"#).unwrap();
    assert!(StudyConfig::from_json_file(&path).is_err());
}

#[test]
fn test_default_study() {
    let config = StudyConfig::default();
    assert_eq!(config.dataset, "modelnet");
    assert_eq!(
        config.models,
        [ModelKind::BetaTcVae, ModelKind::BetaVae, ModelKind::FactorVae]
    );
    assert_eq!(config.plan().expect("默认计划应合法").len(), 3);
}

#[test]
fn test_model_kind_from_str() {
    for model in ModelKind::ALL {
        assert_eq!(model.as_str().parse::<ModelKind>(), Ok(model));
    }
    assert_eq!("tcvae".parse::<ModelKind>(), Ok(ModelKind::BetaTcVae));
    assert!("BetaVAE".parse::<ModelKind>().is_err());
}
