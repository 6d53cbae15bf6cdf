//! Ground-truth 数据集接口
//!
//! 生成因子（形状、颜色、旋转等）完全已知的数据集统一实现 [`GroundTruthData`]，
//! 注册表返回的数据集句柄即 `Box<dyn GroundTruthData>`。
//!
//! # 约定
//! - 因子矩阵形状为 `[N, num_factors]`，每个元素在 `0..factors_num_values()[j]` 内
//! - 观测张量形状为 `[N, H, W, C]`，取值在 [0, 1]

use ndarray::{Array2, Array4, ArrayView1, Axis};
use rand::{Rng, RngCore};

use super::error::DataError;

/// Ground-truth 数据集
pub trait GroundTruthData: Send + Sync {
    /// 因子个数
    fn num_factors(&self) -> usize {
        self.factors_num_values().len()
    }

    /// 每个因子的取值个数
    fn factors_num_values(&self) -> &[usize];

    /// 单个观测的形状 `[H, W, C]`
    fn observation_shape(&self) -> &[usize];

    /// 随机采样 `num` 组因子，形状 `[num, num_factors]`
    fn sample_factors(&self, num: usize, rng: &mut dyn RngCore) -> Array2<usize>;

    /// 由给定因子生成观测，形状 `[N, H, W, C]`
    fn sample_observations_from_factors(
        &self,
        factors: &Array2<usize>,
        rng: &mut dyn RngCore,
    ) -> Result<Array4<f32>, DataError>;

    /// 同时采样因子与对应观测
    fn sample(
        &self,
        num: usize,
        rng: &mut dyn RngCore,
    ) -> Result<(Array2<usize>, Array4<f32>), DataError> {
        let factors = self.sample_factors(num, rng);
        let observations = self.sample_observations_from_factors(&factors, rng)?;
        Ok((factors, observations))
    }

    /// 只采样观测
    fn sample_observations(
        &self,
        num: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Array4<f32>, DataError> {
        self.sample(num, rng).map(|(_, observations)| observations)
    }
}

/// 校验因子矩阵的列数与取值范围
pub fn check_factors(
    factors: &Array2<usize>,
    factors_num_values: &[usize],
) -> Result<(), DataError> {
    if factors.ncols() != factors_num_values.len() {
        return Err(DataError::ShapeMismatch {
            expected: vec![factors.nrows(), factors_num_values.len()],
            got: factors.shape().to_vec(),
        });
    }
    for row in factors.rows() {
        for (factor, (&value, &num_values)) in row.iter().zip(factors_num_values).enumerate() {
            if value >= num_values {
                return Err(DataError::FactorOutOfRange {
                    factor,
                    value,
                    num_values,
                });
            }
        }
    }
    Ok(())
}

/// 每列在各自取值范围内均匀采样
pub fn sample_uniform_factors(
    num: usize,
    factors_num_values: &[usize],
    rng: &mut dyn RngCore,
) -> Array2<usize> {
    Array2::from_shape_fn((num, factors_num_values.len()), |(_, j)| {
        rng.gen_range(0..factors_num_values[j])
    })
}

/// 混合进制索引：按因子的乘积顺序把因子组合映射到扁平下标
///
/// 最后一个因子变化最快，与按 C 顺序存储的图像归档一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductIndex {
    factor_sizes: Vec<usize>,
    bases: Vec<usize>,
    len: usize,
}

impl ProductIndex {
    pub fn new(factor_sizes: &[usize]) -> Self {
        let mut bases = vec![1; factor_sizes.len()];
        for i in (0..factor_sizes.len().saturating_sub(1)).rev() {
            bases[i] = bases[i + 1] * factor_sizes[i + 1];
        }
        Self {
            factor_sizes: factor_sizes.to_vec(),
            bases,
            len: factor_sizes.iter().product(),
        }
    }

    /// 组合总数
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn factor_sizes(&self) -> &[usize] {
        &self.factor_sizes
    }

    /// 调用方须保证 `factors` 已通过 [`check_factors`]
    pub fn index_of(&self, factors: ArrayView1<'_, usize>) -> usize {
        factors
            .iter()
            .zip(&self.bases)
            .map(|(&f, &b)| f * b)
            .sum()
    }
}

/// 潜在因子与干扰因子分离的离散状态空间
///
/// 只有 `latent_factor_indices` 中的因子对外暴露；其余因子在生成观测时随机补全。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDiscreteStateSpace {
    factor_sizes: Vec<usize>,
    latent_factor_indices: Vec<usize>,
    observation_factor_indices: Vec<usize>,
    latent_sizes: Vec<usize>,
}

impl SplitDiscreteStateSpace {
    pub fn new(factor_sizes: &[usize], latent_factor_indices: &[usize]) -> Self {
        let observation_factor_indices = (0..factor_sizes.len())
            .filter(|i| !latent_factor_indices.contains(i))
            .collect();
        let latent_sizes = latent_factor_indices
            .iter()
            .map(|&i| factor_sizes[i])
            .collect();
        Self {
            factor_sizes: factor_sizes.to_vec(),
            latent_factor_indices: latent_factor_indices.to_vec(),
            observation_factor_indices,
            latent_sizes,
        }
    }

    pub fn num_latent_factors(&self) -> usize {
        self.latent_factor_indices.len()
    }

    /// 潜在因子各自的取值个数
    pub fn latent_sizes(&self) -> &[usize] {
        &self.latent_sizes
    }

    pub fn factor_sizes(&self) -> &[usize] {
        &self.factor_sizes
    }

    pub fn sample_latent_factors(&self, num: usize, rng: &mut dyn RngCore) -> Array2<usize> {
        sample_uniform_factors(num, &self.latent_sizes, rng)
    }

    /// 潜在因子 `[N, num_latent]` → 全部因子 `[N, num_all]`
    pub fn sample_all_factors(
        &self,
        latent_factors: &Array2<usize>,
        rng: &mut dyn RngCore,
    ) -> Array2<usize> {
        let num = latent_factors.nrows();
        let mut all = Array2::zeros((num, self.factor_sizes.len()));
        for (col, &i) in self.latent_factor_indices.iter().enumerate() {
            all.column_mut(i).assign(&latent_factors.column(col));
        }
        for &i in &self.observation_factor_indices {
            let size = self.factor_sizes[i];
            for value in all.column_mut(i).iter_mut() {
                *value = rng.gen_range(0..size);
            }
        }
        all
    }
}

/// 按下标从 `[N, ...]` 的 u8 图像库中取出若干张并缩放到 [0, 1]
pub fn gather_normalized<D>(
    images: &ndarray::Array<u8, D>,
    indices: &[usize],
) -> ndarray::Array<f32, D>
where
    D: ndarray::RemoveAxis,
{
    images.select(Axis(0), indices).mapv(|p| f32::from(p) / 255.0)
}
