//! 通用数据加载器的参数预设
//!
//! 预设是编译期常量，进程内只读。注册表把预设原样转交给加载器，
//! 不做任何补全或修正。

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::error::DataError;

/// 预设中的单个取值（字符串或整数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum PresetValue {
    Int(i64),
    Str(&'static str),
}

impl fmt::Display for PresetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// 命名的参数预设：选项名 → 取值
#[derive(Debug, PartialEq, Eq)]
pub struct Preset {
    name: &'static str,
    entries: &'static [(&'static str, PresetValue)],
}

impl Preset {
    pub const fn new(name: &'static str, entries: &'static [(&'static str, PresetValue)]) -> Self {
        Self { name, entries }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, PresetValue)> + '_ {
        self.entries.iter().copied()
    }

    pub fn get(&self, key: &str) -> Option<PresetValue> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, v)| v)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(PresetValue::Int(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&'static str> {
        match self.get(key) {
            Some(PresetValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// 读取必须存在的正整数参数
    pub fn require_usize(&self, key: &str) -> Result<usize, DataError> {
        let value = self
            .get_int(key)
            .ok_or_else(|| self.invalid(format!("缺少整数参数 `{key}`")))?;
        usize::try_from(value)
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| self.invalid(format!("参数 `{key}` 必须为正整数，实际为 {value}")))
    }

    /// 读取必须存在的字符串参数
    pub fn require_str(&self, key: &str) -> Result<&'static str, DataError> {
        self.get_str(key)
            .ok_or_else(|| self.invalid(format!("缺少字符串参数 `{key}`")))
    }

    /// 转为有序映射，便于比较和打印
    pub fn to_map(&self) -> BTreeMap<String, PresetValue> {
        self.iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn invalid(&self, message: String) -> DataError {
        DataError::InvalidPreset {
            preset: self.name.to_string(),
            message,
        }
    }
}

impl Serialize for Preset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

use PresetValue::{Int, Str};

/// 箭头数据集：64 种色相 × 64 种旋转
pub static ARROW: Preset = Preset::new(
    "arrow",
    &[
        ("data", Str("arrow")),
        ("arrow_size", Int(64)),
        ("n_hues", Int(64)),
        ("n_rotations", Int(64)),
    ],
);

/// 环绕像素方块，边长 4
pub static WRAPPED_PIXEL4: Preset = Preset::new(
    "pixel4",
    &[
        ("data", Str("pixel")),
        ("height", Int(64)),
        ("width", Int(64)),
        ("step_size_vert", Int(1)),
        ("step_size_hor", Int(1)),
        ("square_size", Int(4)),
    ],
);

/// 环绕像素方块
///
/// 注意：取值与 [`WRAPPED_PIXEL4`] 完全相同（`square_size` 同为 4），
/// 见 [`crate::data::registry::KNOWN_DISCREPANCIES`]。在数据集维护者确认前保持原值。
pub static WRAPPED_PIXEL8: Preset = Preset::new(
    "pixel8",
    &[
        ("data", Str("pixel")),
        ("height", Int(64)),
        ("width", Int(64)),
        ("step_size_vert", Int(1)),
        ("step_size_hor", Int(1)),
        ("square_size", Int(4)),
    ],
);

/// 带颜色的 ModelNet 渲染图
pub static MODELNET: Preset = Preset::new(
    "modelnet",
    &[
        ("dataset_filename", Str("modelnet_color_single_64_64.h5")),
        ("data", Str("modelnet_colors")),
    ],
);
