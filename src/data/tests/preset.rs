//! 参数预设单元测试

use serde_json::json;

use crate::data::DataError;
use crate::data::preset::{ARROW, MODELNET, Preset, PresetValue, WRAPPED_PIXEL4};

static BROKEN: Preset = Preset::new(
    "broken",
    &[
        ("data", PresetValue::Str("pixel")),
        ("height", PresetValue::Str("64")),
        ("width", PresetValue::Int(-1)),
    ],
);

#[test]
fn test_preset_lookup() {
    assert_eq!(ARROW.name(), "arrow");
    assert_eq!(ARROW.len(), 4);
    assert_eq!(ARROW.get_str("data"), Some("arrow"));
    assert_eq!(ARROW.get_int("n_hues"), Some(64));
    assert_eq!(ARROW.get("missing"), None);
    // 类型不符时取不到
    assert_eq!(ARROW.get_int("data"), None);
    assert_eq!(ARROW.get_str("arrow_size"), None);
}

#[test]
fn test_preset_preserves_declaration_order() {
    let keys: Vec<_> = WRAPPED_PIXEL4.iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        [
            "data",
            "height",
            "width",
            "step_size_vert",
            "step_size_hor",
            "square_size"
        ]
    );
}

#[test]
fn test_preset_require() {
    assert_eq!(WRAPPED_PIXEL4.require_usize("square_size").unwrap(), 4);
    assert_eq!(MODELNET.require_str("data").unwrap(), "modelnet_colors");

    // 字符串不能当整数用
    assert!(matches!(
        BROKEN.require_usize("height"),
        Err(DataError::InvalidPreset { ref preset, .. }) if preset == "broken"
    ));
    // 非正整数
    assert!(matches!(
        BROKEN.require_usize("width"),
        Err(DataError::InvalidPreset { .. })
    ));
    // 缺失
    assert!(matches!(
        BROKEN.require_str("dataset_filename"),
        Err(DataError::InvalidPreset { .. })
    ));
}

#[test]
fn test_preset_serializes_as_object() {
    let value = serde_json::to_value(&ARROW).unwrap();
    assert_eq!(
        value,
        json!({"data": "arrow", "arrow_size": 64, "n_hues": 64, "n_rotations": 64})
    );

    let value = serde_json::to_value(&MODELNET).unwrap();
    assert_eq!(
        value,
        json!({"dataset_filename": "modelnet_color_single_64_64.h5", "data": "modelnet_colors"})
    );
}

#[test]
fn test_preset_value_display() {
    assert_eq!(PresetValue::Int(64).to_string(), "64");
    assert_eq!(PresetValue::Str("arrow").to_string(), "\"arrow\"");
}
