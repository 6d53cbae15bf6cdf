/*
 * @Description  : 注册表端到端测试：通过公开接口按名称解析数据集并采样
 */
use disentangle_data::config::DataConfig;
use disentangle_data::data::registry;
use disentangle_data::data::{
    DatasetRegistry, DatasetSource, GroundTruthData, REGISTRY, ResolveError,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 无需磁盘文件即可构造的数据集
const IN_MEMORY: [&str; 4] = ["dummy_data", "arrow", "pixel4", "pixel8"];

#[test]
fn test_registry_has_sixteen_unique_names() {
    let names: Vec<_> = registry::names().collect();
    assert_eq!(names.len(), 16);
    for (i, name) in names.iter().enumerate() {
        assert!(!names[i + 1..].contains(name), "名称 {name} 重复");
        assert!(registry::contains(name));
    }
    assert_eq!(names.first(), Some(&"dsprites_full"));
    assert_eq!(names.last(), Some(&"pixel8"));
}

#[test]
fn test_in_memory_datasets_sample() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DatasetRegistry::from_config(DataConfig::new(dir.path()));
    let mut rng = StdRng::seed_from_u64(42);

    for name in IN_MEMORY {
        let dataset = registry
            .resolve(name)
            .unwrap_or_else(|e| panic!("解析 {name} 失败: {e}"));
        let (factors, observations) = dataset
            .sample(4, &mut rng)
            .unwrap_or_else(|e| panic!("{name} 采样失败: {e}"));

        assert_eq!(factors.shape(), &[4, dataset.num_factors()]);
        let mut expected = vec![4];
        expected.extend_from_slice(dataset.observation_shape());
        assert_eq!(observations.shape(), expected.as_slice());
        assert!(observations.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}

#[test]
fn test_same_seed_same_sample() {
    let registry = DatasetRegistry::from_config(DataConfig::default());
    let dataset = registry.resolve("arrow").expect("解析 arrow 失败");

    let (factors_a, observations_a) = dataset
        .sample(2, &mut StdRng::seed_from_u64(7))
        .expect("采样失败");
    let (factors_b, observations_b) = dataset
        .sample(2, &mut StdRng::seed_from_u64(7))
        .expect("采样失败");
    assert_eq!(factors_a, factors_b);
    assert_eq!(observations_a, observations_b);
}

#[test]
fn test_file_backed_datasets_report_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DatasetRegistry::from_config(DataConfig::new(dir.path()));

    for entry in REGISTRY {
        if IN_MEMORY.contains(&entry.name) {
            continue;
        }
        match registry.resolve(entry.name) {
            Err(ResolveError::Load(_)) => {}
            Err(e) => panic!("{} 应报加载错误，实际为 {e}", entry.name),
            Ok(_) => panic!("{} 在空目录下不应加载成功", entry.name),
        }
    }
}

#[test]
fn test_unknown_name() {
    let err = match registry::resolve("mnist") {
        Err(e) => e,
        Ok(_) => panic!("mnist 未注册"),
    };
    assert_eq!(err.unknown_name(), Some("mnist"));
    assert!(err.to_string().contains("mnist"));
}

#[test]
fn test_registry_json() {
    let entry = registry::lookup("mpi3d_toy").expect("mpi3d_toy 应已注册");
    assert_eq!(
        serde_json::to_value(entry).unwrap(),
        serde_json::json!({
            "name": "mpi3d_toy",
            "source": {"builtin": {"kind": "mpi3d", "mode": "toy"}}
        })
    );

    let entry = registry::lookup("pixel8").unwrap();
    assert!(matches!(
        entry.source,
        DatasetSource::Preset(p) if p.get_int("square_size") == Some(4)
    ));
}
