//! 以 `.npz` 归档存储、按因子乘积顺序排列的图像数据集
//!
//! 归档中的图像数组形状为 `[N, H, W, C]`（或灰度 `[N, H, W]`），
//! 第 i 张图对应的因子组合由 [`ProductIndex`] 决定，最后一个因子变化最快。
//! MPI3D、Shapes3D、Cars3D 以及通用预设（如 modelnet）都走这条路径。

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ndarray::{Array, Array1, Array2, Array4, ArrayD, Axis, Dimension, Ix4};
use ndarray_npy::{NpzReader, ReadableElement};
use rand::RngCore;

use crate::data::error::DataError;
use crate::data::ground_truth::{
    GroundTruthData, ProductIndex, SplitDiscreteStateSpace, check_factors, gather_normalized,
};

/// Shapes3D 的因子：地板色相、墙面色相、物体色相、尺寸、形状、朝向
pub const SHAPES3D_FACTOR_SIZES: [usize; 6] = [10, 10, 10, 8, 4, 15];
const SHAPES3D_FILE: &str =
    "look-at-object-room_floor-hueXwall-hueXobj-hueXobj-sizeXobj-shapeXview-azi.npz";

/// Cars3D 的因子：仰角、方位角、车型
pub const CARS3D_FACTOR_SIZES: [usize; 3] = [4, 24, 183];

/// MPI3D 的三个子集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mpi3dMode {
    Toy,
    Realistic,
    Real,
}

impl Mpi3dMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toy => "mpi3d_toy",
            Self::Realistic => "mpi3d_realistic",
            Self::Real => "mpi3d_real",
        }
    }

    /// 物体颜色、形状、尺寸、相机高度、背景色、水平轴、垂直轴
    ///
    /// real 子集的颜色与形状各有 6 种，其余子集各 4 种。
    pub fn factor_sizes(&self) -> [usize; 7] {
        match self {
            Self::Toy | Self::Realistic => [4, 4, 2, 3, 3, 40, 40],
            Self::Real => [6, 6, 2, 3, 3, 40, 40],
        }
    }
}

/// 按乘积顺序排列的图像数据集
#[derive(Debug, Clone)]
pub struct ArchiveData {
    name: String,
    images: Array4<u8>,
    state_space: SplitDiscreteStateSpace,
    index: ProductIndex,
    observation_shape: [usize; 3],
}

impl ArchiveData {
    /// 由内存中的图像构建
    ///
    /// # 参数
    /// - `images`: `[N, H, W, C]`，N 必须等于所有因子取值数之积
    /// - `factor_sizes`: 全部因子的取值个数
    /// - `latent_factor_indices`: 对外暴露的因子下标
    pub fn from_images(
        name: impl Into<String>,
        images: Array4<u8>,
        factor_sizes: &[usize],
        latent_factor_indices: &[usize],
    ) -> Result<Self, DataError> {
        let index = ProductIndex::new(factor_sizes);
        let (n, h, w, c) = images.dim();
        if n != index.len() {
            return Err(DataError::ShapeMismatch {
                expected: vec![index.len(), h, w, c],
                got: vec![n, h, w, c],
            });
        }
        if let Some(&bad) = latent_factor_indices.iter().find(|&&i| i >= factor_sizes.len()) {
            return Err(DataError::IndexOutOfBounds {
                index: bad,
                len: factor_sizes.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            images,
            state_space: SplitDiscreteStateSpace::new(factor_sizes, latent_factor_indices),
            index,
            observation_shape: [h, w, c],
        })
    }

    /// 从 `.npz` 读取图像数组 `key`，全部因子均对外暴露
    pub fn load(
        name: impl Into<String>,
        path: &Path,
        key: &str,
        factor_sizes: &[usize],
    ) -> Result<Self, DataError> {
        let name = name.into();
        log::info!("正在加载 {name}: {path:?}");
        let images = into_nhwc(read_npz_array(path, key)?)?;
        let latent: Vec<usize> = (0..factor_sizes.len()).collect();
        Self::from_images(name, images, factor_sizes, &latent)
    }

    /// 通用归档：`images` 为图像，`factor_sizes` 为各因子取值个数
    pub fn load_generic(name: impl Into<String>, path: &Path) -> Result<Self, DataError> {
        let sizes: Array1<i64> = read_npz_array(path, "factor_sizes")?;
        let factor_sizes = sizes
            .iter()
            .map(|&s| {
                usize::try_from(s)
                    .ok()
                    .filter(|&s| s > 0)
                    .ok_or_else(|| DataError::FormatError(format!("无效的因子取值个数: {s}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::load(name, path, "images", &factor_sizes)
    }

    pub fn mpi3d(data_root: &Path, mode: Mpi3dMode) -> Result<Self, DataError> {
        let path = data_root
            .join(mode.as_str())
            .join(format!("{}.npz", mode.as_str()));
        Self::load(mode.as_str(), &path, "images", &mode.factor_sizes())
    }

    pub fn shapes3d(data_root: &Path) -> Result<Self, DataError> {
        let path = data_root.join("3dshapes").join(SHAPES3D_FILE);
        Self::load("shapes3d", &path, "images", &SHAPES3D_FACTOR_SIZES)
    }

    /// 需预先把原始的逐车型 `.mat` 文件按乘积顺序合并为 `cars/cars3d.npz`
    pub fn cars3d(data_root: &Path) -> Result<Self, DataError> {
        let path = data_root.join("cars").join("cars3d.npz");
        Self::load("cars3d", &path, "images", &CARS3D_FACTOR_SIZES)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 图像总数
    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GroundTruthData for ArchiveData {
    fn factors_num_values(&self) -> &[usize] {
        self.state_space.latent_sizes()
    }

    fn observation_shape(&self) -> &[usize] {
        &self.observation_shape
    }

    fn sample_factors(&self, num: usize, rng: &mut dyn RngCore) -> Array2<usize> {
        self.state_space.sample_latent_factors(num, rng)
    }

    fn sample_observations_from_factors(
        &self,
        factors: &Array2<usize>,
        rng: &mut dyn RngCore,
    ) -> Result<Array4<f32>, DataError> {
        check_factors(factors, self.state_space.latent_sizes())?;
        let all_factors = self.state_space.sample_all_factors(factors, rng);
        let indices: Vec<usize> = all_factors
            .rows()
            .into_iter()
            .map(|row| self.index.index_of(row))
            .collect();
        Ok(gather_normalized(&self.images, &indices))
    }
}

/// 从 `.npz` 中读取名为 `key` 的数组（兼容带或不带 `.npy` 后缀的条目名）
pub(crate) fn read_npz_array<A, D>(path: &Path, key: &str) -> Result<Array<A, D>, DataError>
where
    A: ReadableElement,
    D: Dimension,
{
    let file = File::open(path).map_err(|_| DataError::FileNotFound(path.to_path_buf()))?;
    let mut npz = NpzReader::new(BufReader::new(file))?;
    let entry = npz
        .names()?
        .into_iter()
        .find(|n| n == key || n.strip_suffix(".npy") == Some(key))
        .ok_or_else(|| DataError::FormatError(format!("{path:?} 中缺少数组 `{key}`")))?;
    Ok(npz.by_name(&entry)?)
}

/// `[N, H, W]` 或 `[N, H, W, C]` → `[N, H, W, C]`
pub(crate) fn into_nhwc(images: ArrayD<u8>) -> Result<Array4<u8>, DataError> {
    let images = match images.ndim() {
        3 => images.insert_axis(Axis(3)),
        4 => images,
        ndim => {
            return Err(DataError::FormatError(format!(
                "图像数组维度应为 3 或 4，实际为 {ndim}"
            )));
        }
    };
    images
        .into_dimensionality::<Ix4>()
        .map_err(|e| DataError::FormatError(e.to_string()))
}

/// 将 `.h5` 等文件名映射为同名 `.npz`
pub(crate) fn archive_path(data_root: &Path, dataset_filename: &str) -> PathBuf {
    let path = data_root.join(dataset_filename);
    match path.extension() {
        Some(ext) if ext == "npz" => path,
        _ => path.with_extension("npz"),
    }
}
