//! dSprites 数据集及其彩色、噪声、呐喊背景变体
//!
//! 原始数据为 737,280 张 64x64 二值图，因子依次为：
//! 颜色(1)、形状(3)、尺度(6)、朝向(40)、X 位置(32)、Y 位置(32)，按乘积顺序存储。
//!
//! 支持：
//! - `.npz` 归档解析（`imgs` 数组）
//! - 只暴露部分因子（其余因子在生成观测时随机补全）
//! - 可选自动下载

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ndarray::{Array2, Array3, Array4, Axis, s};
use rand::{Rng, RngCore};

use crate::data::download::download_file;
use crate::data::error::DataError;
use crate::data::ground_truth::{
    GroundTruthData, ProductIndex, SplitDiscreteStateSpace, check_factors,
};

use super::archive::read_npz_array;

/// dSprites 下载地址
const DSPRITES_URL: &str = "https://github.com/deepmind/dsprites-dataset/raw/master/dsprites_ndarray_co1sh3sc6or40x32y32_64x64.npz";
const DSPRITES_FILE: &str = "dsprites_ndarray_co1sh3sc6or40x32y32_64x64.npz";

/// 《呐喊》背景图下载地址
const SCREAM_URL: &str = "https://upload.wikimedia.org/wikipedia/commons/f/f4/The_Scream.jpg";

pub const DSPRITES_FACTOR_SIZES: [usize; 6] = [1, 3, 6, 40, 32, 32];

/// 背景裁剪块边长
const PATCH: usize = 64;

/// 观测的着色方式
#[derive(Debug, Clone)]
pub enum DSpritesVariant {
    /// 原始二值图，单通道
    Plain,
    /// 每个样本乘以 [0.5, 1) 内的随机 RGB 颜色
    Color,
    /// 背景叠加均匀噪声，截断到 1
    Noisy,
    /// 以《呐喊》随机裁剪块为背景，前景像素取反色
    Scream(ScreamBackground),
}

/// 缩略后的《呐喊》图，`[H, W, 3]`，取值 [0, 1]
#[derive(Debug, Clone)]
pub struct ScreamBackground {
    pixels: Array3<f32>,
}

impl ScreamBackground {
    /// 按比例缩到 350x274 以内
    pub fn from_image(image: &DynamicImage) -> Result<Self, DataError> {
        let rgb = image.thumbnail(350, 274).to_rgb8();
        let (w, h) = (rgb.width() as usize, rgb.height() as usize);
        if h <= PATCH || w <= PATCH {
            return Err(DataError::FormatError(format!(
                "背景图过小: {w}x{h}，至少需要 {}x{}",
                PATCH + 1,
                PATCH + 1
            )));
        }
        let pixels = Array3::from_shape_vec((h, w, 3), rgb.into_raw())
            .map_err(|e| DataError::FormatError(e.to_string()))?
            .mapv(|p| f32::from(p) / 255.0);
        Ok(Self { pixels })
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            return Err(DataError::FileNotFound(path.to_path_buf()));
        }
        Self::from_image(&image::open(path)?)
    }

    pub fn shape(&self) -> &[usize] {
        self.pixels.shape()
    }
}

/// dSprites 数据集
#[derive(Debug, Clone)]
pub struct DSprites {
    /// `[N, 64, 64]`，取值 0/1
    images: Array3<u8>,
    state_space: SplitDiscreteStateSpace,
    index: ProductIndex,
    variant: DSpritesVariant,
    observation_shape: [usize; 3],
}

impl DSprites {
    /// 完整加载 API
    ///
    /// # 参数
    /// - `data_root`: 数据根目录，归档位于 `dsprites/` 子目录
    /// - `latent_factor_indices`: 对外暴露的因子下标，如 `[1, 2, 3, 4, 5]`
    /// - `variant`: 着色方式
    /// - `download`: true=自动下载缺失文件
    pub fn load(
        data_root: &Path,
        latent_factor_indices: &[usize],
        variant: DSpritesVariant,
        download: bool,
    ) -> Result<Self, DataError> {
        let path = ensure_file(&data_root.join("dsprites"), DSPRITES_FILE, DSPRITES_URL, download)?;
        Self::from_archive(&path, &DSPRITES_FACTOR_SIZES, latent_factor_indices, variant)
    }

    /// 从 `.npz` 的 `imgs` 数组构建，图像须按 `factor_sizes` 的乘积顺序排列
    pub fn from_archive(
        path: &Path,
        factor_sizes: &[usize],
        latent_factor_indices: &[usize],
        variant: DSpritesVariant,
    ) -> Result<Self, DataError> {
        log::info!("正在加载 dSprites: {path:?}");
        let images: Array3<u8> = read_npz_array(path, "imgs")?;
        Self::from_images(images, factor_sizes, latent_factor_indices, variant)
    }

    /// 加载《呐喊》背景图（位于 `scream/scream.jpg`）
    pub fn load_scream_background(
        data_root: &Path,
        download: bool,
    ) -> Result<ScreamBackground, DataError> {
        let path = ensure_file(&data_root.join("scream"), "scream.jpg", SCREAM_URL, download)?;
        ScreamBackground::load(&path)
    }

    /// 由内存中的图像构建，`images` 须按 `factor_sizes` 的乘积顺序排列
    pub fn from_images(
        images: Array3<u8>,
        factor_sizes: &[usize],
        latent_factor_indices: &[usize],
        variant: DSpritesVariant,
    ) -> Result<Self, DataError> {
        let index = ProductIndex::new(factor_sizes);
        let (n, h, w) = images.dim();
        if n != index.len() {
            return Err(DataError::ShapeMismatch {
                expected: vec![index.len(), h, w],
                got: vec![n, h, w],
            });
        }
        if let Some(&bad) = latent_factor_indices.iter().find(|&&i| i >= factor_sizes.len()) {
            return Err(DataError::IndexOutOfBounds {
                index: bad,
                len: factor_sizes.len(),
            });
        }
        if matches!(variant, DSpritesVariant::Scream(_)) && (h != PATCH || w != PATCH) {
            return Err(DataError::ShapeMismatch {
                expected: vec![PATCH, PATCH],
                got: vec![h, w],
            });
        }
        let channels = match variant {
            DSpritesVariant::Plain => 1,
            _ => 3,
        };
        Ok(Self {
            images,
            state_space: SplitDiscreteStateSpace::new(factor_sizes, latent_factor_indices),
            index,
            variant,
            observation_shape: [h, w, channels],
        })
    }

    pub fn variant(&self) -> &DSpritesVariant {
        &self.variant
    }

    /// 未着色的观测 `[N, H, W, 1]`
    fn binary_observations(
        &self,
        factors: &Array2<usize>,
        rng: &mut dyn RngCore,
    ) -> Array4<f32> {
        let all_factors = self.state_space.sample_all_factors(factors, rng);
        let indices: Vec<usize> = all_factors
            .rows()
            .into_iter()
            .map(|row| self.index.index_of(row))
            .collect();
        self.images
            .select(Axis(0), &indices)
            .mapv(f32::from)
            .insert_axis(Axis(3))
    }
}

impl GroundTruthData for DSprites {
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
        let binary = self.binary_observations(factors, rng);
        let observations = match &self.variant {
            DSpritesVariant::Plain => binary,
            DSpritesVariant::Color => colorize(&binary, rng),
            DSpritesVariant::Noisy => add_background_noise(&binary, rng),
            DSpritesVariant::Scream(background) => composite_scream(&binary, background, rng),
        };
        Ok(observations)
    }
}

/// 单通道复制为三通道
fn to_rgb(binary: &Array4<f32>) -> Array4<f32> {
    let (n, h, w, _) = binary.dim();
    Array4::from_shape_fn((n, h, w, 3), |(i, y, x, _)| binary[[i, y, x, 0]])
}

fn colorize(binary: &Array4<f32>, rng: &mut dyn RngCore) -> Array4<f32> {
    let mut observations = to_rgb(binary);
    for mut sample in observations.outer_iter_mut() {
        let color: [f32; 3] = [
            rng.gen_range(0.5..1.0),
            rng.gen_range(0.5..1.0),
            rng.gen_range(0.5..1.0),
        ];
        for (c, mut channel) in sample.axis_iter_mut(Axis(2)).enumerate() {
            channel *= color[c];
        }
    }
    observations
}

fn add_background_noise(binary: &Array4<f32>, rng: &mut dyn RngCore) -> Array4<f32> {
    let mut observations = to_rgb(binary);
    observations.mapv_inplace(|v| (v + rng.gen_range(0.0..1.0f32)).min(1.0));
    observations
}

fn composite_scream(
    binary: &Array4<f32>,
    background: &ScreamBackground,
    rng: &mut dyn RngCore,
) -> Array4<f32> {
    let (n, h, w, _) = binary.dim();
    let (bg_h, bg_w, _) = background.pixels.dim();
    let mut observations = Array4::zeros((n, h, w, 3));
    for i in 0..n {
        let y0 = rng.gen_range(0..bg_h - PATCH);
        let x0 = rng.gen_range(0..bg_w - PATCH);
        let tint: [f32; 3] = [rng.r#gen(), rng.r#gen(), rng.r#gen()];
        let patch = background.pixels.slice(s![y0..y0 + PATCH, x0..x0 + PATCH, ..]);
        for ((y, x, c), value) in observations.slice_mut(s![i, .., .., ..]).indexed_iter_mut() {
            let bg = (patch[[y, x, c]] + tint[c]) / 2.0;
            *value = if binary[[i, y, x, 0]] == 1.0 { 1.0 - bg } else { bg };
        }
    }
    observations
}

/// 确保文件存在，必要时下载
fn ensure_file(
    data_dir: &Path,
    file_name: &str,
    url: &str,
    download: bool,
) -> Result<PathBuf, DataError> {
    let path = data_dir.join(file_name);
    if path.exists() {
        return Ok(path);
    }
    if download {
        std::fs::create_dir_all(data_dir)?;
        download_file(url, &path)?;
        Ok(path)
    } else {
        Err(DataError::FileNotFound(path))
    }
}
