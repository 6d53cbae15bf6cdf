//! 占位数据集：10 个因子，每个 5 种取值，观测恒为全 1
//!
//! 不依赖任何磁盘文件，用于测试和流程打通。

use ndarray::{Array2, Array4};
use rand::RngCore;

use crate::data::error::DataError;
use crate::data::ground_truth::{GroundTruthData, check_factors, sample_uniform_factors};

const NUM_FACTORS: usize = 10;
const NUM_VALUES: usize = 5;

#[derive(Debug, Clone)]
pub struct DummyData {
    factors_num_values: [usize; NUM_FACTORS],
    observation_shape: [usize; 3],
}

impl DummyData {
    pub fn new() -> Self {
        Self {
            factors_num_values: [NUM_VALUES; NUM_FACTORS],
            observation_shape: [64, 64, 1],
        }
    }
}

impl Default for DummyData {
    fn default() -> Self {
        Self::new()
    }
}

impl GroundTruthData for DummyData {
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
        let [h, w, c] = self.observation_shape;
        Ok(Array4::ones((factors.nrows(), h, w, c)))
    }
}
