//! 合成数据集（环绕方块、箭头）单元测试

use image::Rgb;
use ndarray::arr2;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::data::datasets::{ArrowData, WrappedPixelData};
use crate::data::preset::{ARROW, Preset, PresetValue, WRAPPED_PIXEL4};
use crate::data::{DataError, GroundTruthData};

static TINY_ARROW: Preset = Preset::new(
    "tiny_arrow",
    &[
        ("data", PresetValue::Str("arrow")),
        ("arrow_size", PresetValue::Int(2)),
        ("n_hues", PresetValue::Int(8)),
        ("n_rotations", PresetValue::Int(8)),
    ],
);

static PIXEL_WITHOUT_SQUARE: Preset = Preset::new(
    "pixel_without_square",
    &[
        ("data", PresetValue::Str("pixel")),
        ("height", PresetValue::Int(16)),
        ("width", PresetValue::Int(16)),
        ("step_size_vert", PresetValue::Int(1)),
        ("step_size_hor", PresetValue::Int(1)),
    ],
);

#[test]
fn test_pixel_from_preset() {
    let dataset = WrappedPixelData::from_preset(&WRAPPED_PIXEL4).expect("构建失败");
    assert_eq!(dataset.factors_num_values(), &[64, 64]);
    assert_eq!(dataset.observation_shape(), &[64, 64, 1]);
    assert_eq!(dataset.square_size(), 4);
}

#[test]
fn test_pixel_square() {
    let mut rng = StdRng::seed_from_u64(0);
    let dataset = WrappedPixelData::from_preset(&WRAPPED_PIXEL4).expect("构建失败");
    let observations = dataset
        .sample_observations_from_factors(&arr2(&[[10, 20]]), &mut rng)
        .expect("生成观测失败");
    assert_eq!(observations.sum(), 16.0);
    assert_eq!(observations[[0, 10, 20, 0]], 1.0);
    assert_eq!(observations[[0, 13, 23, 0]], 1.0);
    assert_eq!(observations[[0, 14, 20, 0]], 0.0);
    assert_eq!(observations[[0, 9, 20, 0]], 0.0);
}

#[test]
fn test_pixel_wraps_around_edges() {
    let mut rng = StdRng::seed_from_u64(0);
    let dataset = WrappedPixelData::from_preset(&WRAPPED_PIXEL4).expect("构建失败");
    let observations = dataset
        .sample_observations_from_factors(&arr2(&[[62, 63]]), &mut rng)
        .expect("生成观测失败");
    // 行 62, 63, 0, 1；列 63, 0, 1, 2
    assert_eq!(observations.sum(), 16.0);
    assert_eq!(observations[[0, 62, 63, 0]], 1.0);
    assert_eq!(observations[[0, 0, 0, 0]], 1.0);
    assert_eq!(observations[[0, 1, 2, 0]], 1.0);
    assert_eq!(observations[[0, 63, 0, 0]], 1.0);
    assert_eq!(observations[[0, 61, 63, 0]], 0.0);
    assert_eq!(observations[[0, 2, 0, 0]], 0.0);
    assert_eq!(observations[[0, 0, 3, 0]], 0.0);
}

#[test]
fn test_pixel_step_sizes() {
    let mut rng = StdRng::seed_from_u64(0);
    let dataset = WrappedPixelData::new(8, 12, 2, 3, 1).expect("构建失败");
    assert_eq!(dataset.factors_num_values(), &[4, 4]);
    let observations = dataset
        .sample_observations_from_factors(&arr2(&[[3, 2]]), &mut rng)
        .expect("生成观测失败");
    assert_eq!(observations[[0, 6, 6, 0]], 1.0);
    assert_eq!(observations.sum(), 1.0);
}

#[test]
fn test_pixel_invalid_parameters() {
    assert!(matches!(
        WrappedPixelData::new(8, 8, 0, 1, 2),
        Err(DataError::InvalidPreset { .. })
    ));
    assert!(matches!(
        WrappedPixelData::new(8, 8, 1, 1, 9),
        Err(DataError::InvalidPreset { .. })
    ));
    assert!(matches!(
        WrappedPixelData::from_preset(&PIXEL_WITHOUT_SQUARE),
        Err(DataError::InvalidPreset { ref preset, .. }) if preset == "pixel_without_square"
    ));
}

#[test]
fn test_arrow_from_preset() {
    let mut rng = StdRng::seed_from_u64(1);
    let dataset = ArrowData::from_preset(&ARROW).expect("构建失败");
    assert_eq!(dataset.factors_num_values(), &[64, 64]);
    assert_eq!(dataset.observation_shape(), &[64, 64, 3]);

    let (factors, observations) = dataset.sample(3, &mut rng).expect("采样失败");
    assert_eq!(factors.shape(), &[3, 2]);
    assert_eq!(observations.shape(), &[3, 64, 64, 3]);
    assert!(observations.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_arrow_hue() {
    let mut rng = StdRng::seed_from_u64(2);
    let dataset = ArrowData::from_preset(&ARROW).expect("构建失败");
    // 色相 0 为纯红
    let observations = dataset
        .sample_observations_from_factors(&arr2(&[[0, 0]]), &mut rng)
        .expect("生成观测失败");
    let red: f32 = observations.slice(ndarray::s![0, .., .., 0]).sum();
    let green: f32 = observations.slice(ndarray::s![0, .., .., 1]).sum();
    let blue: f32 = observations.slice(ndarray::s![0, .., .., 2]).sum();
    assert!(red > 0.0);
    assert_eq!(green, 0.0);
    assert_eq!(blue, 0.0);
}

#[test]
fn test_arrow_rotation() {
    let dataset = ArrowData::from_preset(&ARROW).expect("构建失败");
    let upright = dataset.render(0, 0);
    let sideways = dataset.render(0, 16);

    // 箭头中心始终在杆上
    assert_eq!(*upright.get_pixel(32, 32), Rgb([255, 0, 0]));
    assert_eq!(*sideways.get_pixel(32, 32), Rgb([255, 0, 0]));
    // 朝上时箭头尖端附近有颜色，转 90 度后为背景
    assert_eq!(*upright.get_pixel(32, 12), Rgb([255, 0, 0]));
    assert_eq!(*sideways.get_pixel(32, 12), Rgb([0, 0, 0]));
    assert_ne!(upright, sideways);
}

#[test]
fn test_arrow_invalid_preset() {
    assert!(matches!(
        ArrowData::from_preset(&TINY_ARROW),
        Err(DataError::InvalidPreset { .. })
    ));
    assert!(matches!(
        ArrowData::new(16, 0, 4),
        Err(DataError::InvalidPreset { .. })
    ));
}
