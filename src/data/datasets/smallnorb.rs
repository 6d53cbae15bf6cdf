//! SmallNORB 玩具三维物体数据集
//!
//! 支持：
//! - NORB 二进制矩阵格式解析（支持 .gz 压缩）
//! - 96x96 → 64x64 缩放
//! - 因子：类别(5)、实例(10)、仰角(9)、方位角(18)、光照(6)，实例为干扰因子

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use image::GrayImage;
use image::imageops::{self, FilterType};
use ndarray::{Array2, Array3, Array4, ArrayView1, Axis};
use rand::RngCore;

use crate::data::error::DataError;
use crate::data::ground_truth::{
    GroundTruthData, ProductIndex, SplitDiscreteStateSpace, check_factors, gather_normalized,
};

pub const SMALLNORB_FACTOR_SIZES: [usize; 5] = [5, 10, 9, 18, 6];
pub const SMALLNORB_LATENT_FACTORS: [usize; 4] = [0, 2, 3, 4];

/// 训练集与测试集两个分块，合并使用
const CHUNKS: [&str; 2] = [
    "5x46789x9x18x6x2x96x96-training",
    "5x01235x9x18x6x2x96x96-testing",
];

/// 字节矩阵
const MAGIC_BYTE: u32 = 0x1E3D_4C55;
/// int32 矩阵
const MAGIC_INT: u32 = 0x1E3D_4C54;

const TARGET_SIZE: u32 = 64;

/// NORB 矩阵最多 4 维
const MAX_NDIM: usize = 4;

/// NORB 二进制矩阵：维度 + 扁平数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NorbMatrix<T> {
    pub dims: Vec<usize>,
    pub data: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct SmallNorb {
    /// `[N, 64, 64]`
    images: Array3<u8>,
    state_space: SplitDiscreteStateSpace,
    index: ProductIndex,
    /// 因子组合的乘积下标 → 图像行号
    rows: HashMap<usize, usize>,
    observation_shape: [usize; 3],
}

impl SmallNorb {
    /// 从 `<data_root>/small_norb/` 加载训练、测试两个分块
    pub fn load(data_root: &Path) -> Result<Self, DataError> {
        let dir = data_root.join("small_norb");
        let mut images = Vec::new();
        let mut features = Vec::new();
        for chunk in CHUNKS {
            log::info!("正在加载 SmallNORB 分块 {chunk}");
            let (chunk_images, chunk_features) = load_chunk(&dir, chunk)?;
            images.push(chunk_images);
            features.push(chunk_features);
        }
        let image_views: Vec<_> = images.iter().map(|a| a.view()).collect();
        let feature_views: Vec<_> = features.iter().map(|a| a.view()).collect();
        let images = ndarray::concatenate(Axis(0), &image_views)
            .map_err(|e| DataError::FormatError(e.to_string()))?;
        let features = ndarray::concatenate(Axis(0), &feature_views)
            .map_err(|e| DataError::FormatError(e.to_string()))?;
        Self::from_parts(images, features)
    }

    /// 由缩放后的图像 `[N, H, W]` 与因子 `[N, 5]` 构建
    pub fn from_parts(images: Array3<u8>, features: Array2<usize>) -> Result<Self, DataError> {
        if images.len_of(Axis(0)) != features.nrows() {
            return Err(DataError::ShapeMismatch {
                expected: vec![features.nrows()],
                got: vec![images.len_of(Axis(0))],
            });
        }
        check_factors(&features, &SMALLNORB_FACTOR_SIZES)?;
        let index = ProductIndex::new(&SMALLNORB_FACTOR_SIZES);
        let rows = features
            .rows()
            .into_iter()
            .enumerate()
            .map(|(row, f)| (index.index_of(f), row))
            .collect();
        let (_, h, w) = images.dim();
        Ok(Self {
            images,
            state_space: SplitDiscreteStateSpace::new(
                &SMALLNORB_FACTOR_SIZES,
                &SMALLNORB_LATENT_FACTORS,
            ),
            index,
            rows,
            observation_shape: [h, w, 1],
        })
    }

    fn row_of(&self, factors: ArrayView1<'_, usize>) -> Result<usize, DataError> {
        self.rows
            .get(&self.index.index_of(factors))
            .copied()
            .ok_or_else(|| DataError::FormatError(format!("缺少因子组合 {factors} 对应的图像")))
    }
}

impl GroundTruthData for SmallNorb {
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
        let indices = all_factors
            .rows()
            .into_iter()
            .map(|row| self.row_of(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(gather_normalized(&self.images, &indices).insert_axis(Axis(3)))
    }
}

/// 读取一个分块：左相机图像缩放到 64x64，因子为 [类别, 实例, 仰角, 方位角/2, 光照]
fn load_chunk(dir: &Path, chunk: &str) -> Result<(Array3<u8>, Array2<usize>), DataError> {
    let dat = read_byte_matrix(&chunk_path(dir, chunk, "dat")?)?;
    let cat = read_int_matrix(&chunk_path(dir, chunk, "cat")?)?;
    let info = read_int_matrix(&chunk_path(dir, chunk, "info")?)?;

    // dat: [N, 2, H, W]
    let (n, h, w) = match dat.dims.as_slice() {
        &[n, 2, h, w] => (n, h, w),
        dims => {
            return Err(DataError::FormatError(format!(
                "图像矩阵形状应为 [N, 2, H, W]，实际为 {dims:?}"
            )));
        }
    };
    let images = resize_images(&dat.data, n, h, w)?;
    let features = assemble_features(&cat, &info)?;
    if features.nrows() != n {
        return Err(DataError::ShapeMismatch {
            expected: vec![n],
            got: vec![features.nrows()],
        });
    }
    Ok((images, features))
}

/// 优先使用解压后的文件，其次 `.gz`
fn chunk_path(dir: &Path, chunk: &str, kind: &str) -> Result<PathBuf, DataError> {
    let path = dir.join(format!("smallnorb-{chunk}-{kind}.mat"));
    if path.exists() {
        return Ok(path);
    }
    let gz_path = dir.join(format!("smallnorb-{chunk}-{kind}.mat.gz"));
    if gz_path.exists() {
        return Ok(gz_path);
    }
    Err(DataError::FileNotFound(path))
}

/// 类别 `[N]` 与信息 `[N, 4]`（实例、仰角、方位角、光照）拼成 `[N, 5]`
///
/// 原始方位角取值为 0, 2, ..., 34，此处除以 2。
pub fn assemble_features(
    cat: &NorbMatrix<i32>,
    info: &NorbMatrix<i32>,
) -> Result<Array2<usize>, DataError> {
    let n = cat.data.len();
    if info.dims != [n, 4] {
        return Err(DataError::ShapeMismatch {
            expected: vec![n, 4],
            got: info.dims.clone(),
        });
    }
    let to_usize = |v: i32| {
        usize::try_from(v).map_err(|_| DataError::FormatError(format!("因子取值为负: {v}")))
    };
    let mut features = Array2::zeros((n, 5));
    for i in 0..n {
        features[[i, 0]] = to_usize(cat.data[i])?;
        features[[i, 1]] = to_usize(info.data[i * 4])?;
        features[[i, 2]] = to_usize(info.data[i * 4 + 1])?;
        features[[i, 3]] = to_usize(info.data[i * 4 + 2])? / 2;
        features[[i, 4]] = to_usize(info.data[i * 4 + 3])?;
    }
    Ok(features)
}

/// 取每个样本的第一路相机图像并缩放到 64x64
fn resize_images(data: &[u8], n: usize, h: usize, w: usize) -> Result<Array3<u8>, DataError> {
    let size = TARGET_SIZE as usize;
    let frame = h * w;
    let mut out = Vec::with_capacity(n * size * size);
    for i in 0..n {
        let start = i * 2 * frame;
        let left = data[start..start + frame].to_vec();
        let image = GrayImage::from_raw(w as u32, h as u32, left)
            .ok_or_else(|| DataError::FormatError("图像数据长度不足".to_string()))?;
        let resized = imageops::resize(&image, TARGET_SIZE, TARGET_SIZE, FilterType::Lanczos3);
        out.extend_from_slice(resized.as_raw());
    }
    Array3::from_shape_vec((n, size, size), out).map_err(|e| DataError::FormatError(e.to_string()))
}

fn open_reader(path: &Path) -> Result<Box<dyn Read>, DataError> {
    let file = File::open(path).map_err(|_| DataError::FileNotFound(path.to_path_buf()))?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// 解析 NORB 矩阵头部，返回维度与元素总数
///
/// 格式（小端序）：
/// - [0-3] magic number
/// - [4-7] 维数 ndim，不超过 4
/// - 之后 max(3, ndim) 个 int32 维度，只有前 ndim 个有效
fn read_header(
    reader: &mut dyn Read,
    expected_magic: u32,
) -> Result<(Vec<usize>, usize), DataError> {
    let mut word = [0u8; 4];
    reader
        .read_exact(&mut word)
        .map_err(|e| DataError::FormatError(format!("读取头部失败: {e}")))?;
    let magic = u32::from_le_bytes(word);
    if magic != expected_magic {
        return Err(DataError::FormatError(format!(
            "无效的 magic number: {magic:#x} (期望 {expected_magic:#x})"
        )));
    }

    reader
        .read_exact(&mut word)
        .map_err(|e| DataError::FormatError(format!("读取维数失败: {e}")))?;
    let ndim = u32::from_le_bytes(word) as usize;
    if ndim > MAX_NDIM {
        return Err(DataError::FormatError(format!(
            "维数 {ndim} 超过上限 {MAX_NDIM}"
        )));
    }

    let mut dims = Vec::with_capacity(ndim);
    for i in 0..ndim.max(3) {
        reader
            .read_exact(&mut word)
            .map_err(|e| DataError::FormatError(format!("读取维度失败: {e}")))?;
        if i < ndim {
            dims.push(u32::from_le_bytes(word) as usize);
        }
    }
    let len = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| DataError::FormatError(format!("矩阵维度 {dims:?} 溢出")))?;
    Ok((dims, len))
}

/// 读取恰好 `len` 字节；按实际内容增长缓冲区，不按头部声明预分配
fn read_payload(reader: &mut dyn Read, len: usize, what: &str) -> Result<Vec<u8>, DataError> {
    let mut data = Vec::new();
    reader
        .take(len as u64)
        .read_to_end(&mut data)
        .map_err(|e| DataError::FormatError(format!("读取{what}失败: {e}")))?;
    if data.len() != len {
        return Err(DataError::FormatError(format!(
            "{what}长度不足: 期望 {len} 字节，实际 {} 字节",
            data.len()
        )));
    }
    Ok(data)
}

/// 读取字节矩阵（图像）
pub fn read_byte_matrix(path: &Path) -> Result<NorbMatrix<u8>, DataError> {
    let mut reader = open_reader(path)?;
    let (dims, len) = read_header(&mut reader, MAGIC_BYTE)?;
    let data = read_payload(&mut reader, len, "图像数据")?;
    Ok(NorbMatrix { dims, data })
}

/// 读取 int32 矩阵（类别、信息）
pub fn read_int_matrix(path: &Path) -> Result<NorbMatrix<i32>, DataError> {
    let mut reader = open_reader(path)?;
    let (dims, len) = read_header(&mut reader, MAGIC_INT)?;
    let byte_len = len
        .checked_mul(4)
        .ok_or_else(|| DataError::FormatError(format!("矩阵维度 {dims:?} 溢出")))?;
    let bytes = read_payload(&mut reader, byte_len, "整数数据")?;
    let data = bytes
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(NorbMatrix { dims, data })
}
