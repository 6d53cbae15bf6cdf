/*
 * @Description  : 由预设参数即时渲染的合成数据集
 *
 * - WrappedPixelData：环面上平移的实心方块（`data = "pixel"`）
 * - ArrowData：不同色相、不同朝向的箭头（`data = "arrow"`）
 *
 * 两者都不读磁盘，观测在采样时按因子直接生成。
 */

use std::f32::consts::PI;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use ndarray::{Array2, Array4};
use rand::RngCore;

use crate::data::error::DataError;
use crate::data::ground_truth::{GroundTruthData, check_factors, sample_uniform_factors};
use crate::data::preset::Preset;

/// 环面上平移的方块
///
/// 因子：垂直位置（`height / step_size_vert` 种）、水平位置（`width / step_size_hor` 种）。
/// 方块越过边界时从另一侧绕回。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedPixelData {
    height: usize,
    width: usize,
    step_size_vert: usize,
    step_size_hor: usize,
    square_size: usize,
    factors_num_values: [usize; 2],
    observation_shape: [usize; 3],
}

impl WrappedPixelData {
    pub fn new(
        height: usize,
        width: usize,
        step_size_vert: usize,
        step_size_hor: usize,
        square_size: usize,
    ) -> Result<Self, DataError> {
        let invalid = |message: String| DataError::InvalidPreset {
            preset: "pixel".to_string(),
            message,
        };
        if [height, width, step_size_vert, step_size_hor, square_size].contains(&0) {
            return Err(invalid("所有尺寸参数都必须大于 0".to_string()));
        }
        if step_size_vert > height || step_size_hor > width {
            return Err(invalid(format!(
                "步长 ({step_size_vert}, {step_size_hor}) 超出图像尺寸 ({height}, {width})"
            )));
        }
        if square_size > height || square_size > width {
            return Err(invalid(format!(
                "方块边长 {square_size} 超出图像尺寸 ({height}, {width})"
            )));
        }
        Ok(Self {
            height,
            width,
            step_size_vert,
            step_size_hor,
            square_size,
            factors_num_values: [height / step_size_vert, width / step_size_hor],
            observation_shape: [height, width, 1],
        })
    }

    pub fn from_preset(preset: &Preset) -> Result<Self, DataError> {
        Self::new(
            preset.require_usize("height")?,
            preset.require_usize("width")?,
            preset.require_usize("step_size_vert")?,
            preset.require_usize("step_size_hor")?,
            preset.require_usize("square_size")?,
        )
    }

    pub fn square_size(&self) -> usize {
        self.square_size
    }
}

impl GroundTruthData for WrappedPixelData {
    fn factors_num_values(&self) -> &[usize] {
        &self.factors_num_values
    }

    fn observation_shape(&self) -> &[usize] {
        &self.observation_shape
    }

    fn sample_factors(&self, num: usize, rng: &mut dyn RngCore) -> Array2<usize> {
        sample_uniform_factors(num, &self.factors_num_values, rng)
    }

    fn sample_observations_from_factors(
        &self,
        factors: &Array2<usize>,
        _rng: &mut dyn RngCore,
    ) -> Result<Array4<f32>, DataError> {
        check_factors(factors, &self.factors_num_values)?;
        let mut observations = Array4::zeros((factors.nrows(), self.height, self.width, 1));
        for (i, row) in factors.rows().into_iter().enumerate() {
            let top = row[0] * self.step_size_vert;
            let left = row[1] * self.step_size_hor;
            for dy in 0..self.square_size {
                for dx in 0..self.square_size {
                    let y = (top + dy) % self.height;
                    let x = (left + dx) % self.width;
                    observations[[i, y, x, 0]] = 1.0;
                }
            }
        }
        Ok(observations)
    }
}

/// 箭头轮廓，单位坐标，中心在原点，箭头朝上（y 轴向下）
const ARROW_OUTLINE: [(f32, f32); 7] = [
    (-0.1, 0.4),
    (0.1, 0.4),
    (0.1, -0.05),
    (0.25, -0.05),
    (0.0, -0.4),
    (-0.25, -0.05),
    (-0.1, -0.05),
];

/// 黑底彩色箭头
///
/// 因子：色相（`n_hues` 种，HSV 色环等分）、朝向（`n_rotations` 种，整圈等分）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowData {
    arrow_size: usize,
    factors_num_values: [usize; 2],
    observation_shape: [usize; 3],
}

impl ArrowData {
    pub fn new(arrow_size: usize, n_hues: usize, n_rotations: usize) -> Result<Self, DataError> {
        if arrow_size < 4 || n_hues == 0 || n_rotations == 0 {
            return Err(DataError::InvalidPreset {
                preset: "arrow".to_string(),
                message: format!(
                    "arrow_size 至少为 4，色相与朝向数须大于 0: \
                     ({arrow_size}, {n_hues}, {n_rotations})"
                ),
            });
        }
        Ok(Self {
            arrow_size,
            factors_num_values: [n_hues, n_rotations],
            observation_shape: [arrow_size, arrow_size, 3],
        })
    }

    pub fn from_preset(preset: &Preset) -> Result<Self, DataError> {
        Self::new(
            preset.require_usize("arrow_size")?,
            preset.require_usize("n_hues")?,
            preset.require_usize("n_rotations")?,
        )
    }

    /// 渲染单个箭头
    pub fn render(&self, hue: usize, rotation: usize) -> RgbImage {
        let size = self.arrow_size as u32;
        let mut canvas = RgbImage::new(size, size);
        let [n_hues, n_rotations] = self.factors_num_values;
        let color = hsv_to_rgb(hue as f32 / n_hues as f32);
        let angle = 2.0 * PI * rotation as f32 / n_rotations as f32;
        let (sin, cos) = angle.sin_cos();
        let scale = self.arrow_size as f32;
        let center = scale / 2.0;

        let mut polygon: Vec<Point<i32>> = Vec::with_capacity(ARROW_OUTLINE.len());
        for &(x, y) in &ARROW_OUTLINE {
            let px = (x * cos - y * sin) * scale + center;
            let py = (x * sin + y * cos) * scale + center;
            let point = Point::new(px.round() as i32, py.round() as i32);
            if polygon.last() != Some(&point) {
                polygon.push(point);
            }
        }
        // 首尾重合的多边形会被 imageproc 拒绝
        while polygon.len() > 1 && polygon.first() == polygon.last() {
            polygon.pop();
        }
        if polygon.len() >= 3 {
            draw_polygon_mut(&mut canvas, &polygon, Rgb(color));
        }
        canvas
    }
}

impl GroundTruthData for ArrowData {
    fn factors_num_values(&self) -> &[usize] {
        &self.factors_num_values
    }

    fn observation_shape(&self) -> &[usize] {
        &self.observation_shape
    }

    fn sample_factors(&self, num: usize, rng: &mut dyn RngCore) -> Array2<usize> {
        sample_uniform_factors(num, &self.factors_num_values, rng)
    }

    fn sample_observations_from_factors(
        &self,
        factors: &Array2<usize>,
        _rng: &mut dyn RngCore,
    ) -> Result<Array4<f32>, DataError> {
        check_factors(factors, &self.factors_num_values)?;
        let s = self.arrow_size;
        let mut observations = Array4::zeros((factors.nrows(), s, s, 3));
        for (i, row) in factors.rows().into_iter().enumerate() {
            let image = self.render(row[0], row[1]);
            for (x, y, pixel) in image.enumerate_pixels() {
                for c in 0..3 {
                    observations[[i, y as usize, x as usize, c]] = f32::from(pixel[c]) / 255.0;
                }
            }
        }
        Ok(observations)
    }
}

/// 饱和度、明度均为 1 的 HSV → RGB，`hue` 取值 [0, 1)
fn hsv_to_rgb(hue: f32) -> [u8; 3] {
    let h = (hue.rem_euclid(1.0)) * 6.0;
    let sector = h.floor() as u32 % 6;
    let f = h - h.floor();
    let (r, g, b) = match sector {
        0 => (1.0, f, 0.0),
        1 => (1.0 - f, 1.0, 0.0),
        2 => (0.0, 1.0, f),
        3 => (0.0, 1.0 - f, 1.0),
        4 => (f, 0.0, 1.0),
        _ => (1.0, 0.0, 1.0 - f),
    };
    let to_u8 = |v: f32| (v * 255.0).round() as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}
