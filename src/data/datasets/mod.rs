//! 内置数据集
//!
//! 默认加载器 [`crate::data::DiskLoader`] 按注册表条目分派到这里的实现：
//! - dSprites 及其彩色、噪声、呐喊背景变体
//! - SmallNORB：NORB 二进制矩阵
//! - MPI3D、Shapes3D、Cars3D 及通用预设归档：按乘积顺序存储的 `.npz`
//! - 环绕像素方块、箭头：按预设即时渲染
//! - 占位数据

mod archive;
mod dsprites;
mod dummy;
mod smallnorb;
mod synthetic;

pub use archive::{ArchiveData, CARS3D_FACTOR_SIZES, Mpi3dMode, SHAPES3D_FACTOR_SIZES};
pub(crate) use archive::archive_path;
pub use dsprites::{DSPRITES_FACTOR_SIZES, DSprites, DSpritesVariant, ScreamBackground};
pub use dummy::DummyData;
pub use smallnorb::{
    NorbMatrix, SMALLNORB_FACTOR_SIZES, SMALLNORB_LATENT_FACTORS, SmallNorb, assemble_features,
    read_byte_matrix, read_int_matrix,
};
pub use synthetic::{ArrowData, WrappedPixelData};
