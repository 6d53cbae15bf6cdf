//! 数据文件下载工具
//!
//! 提供 HTTP 下载和 MD5 摘要，供需要自动下载的数据集（dSprites、背景图等）复用。

use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

use super::error::DataError;

/// 下载文件并保存到指定路径，日志中记录内容的 MD5
pub fn download_file(url: &str, dest_path: &Path) -> Result<(), DataError> {
    log::info!("正在下载 {url} ...");

    let response = ureq::get(url)
        .call()
        .map_err(|e| DataError::DownloadError(format!("HTTP 请求失败: {e}")))?;

    if response.status() != 200 {
        return Err(DataError::DownloadError(format!(
            "HTTP 状态码: {}",
            response.status()
        )));
    }

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| DataError::DownloadError(format!("读取响应失败: {e}")))?;

    std::fs::write(dest_path, &bytes)?;

    log::info!(
        "下载完成: {dest_path:?}（{} 字节，MD5 {}）",
        bytes.len(),
        compute_md5(&bytes)
    );
    Ok(())
}

/// 计算数据的 MD5 校验码
pub fn compute_md5(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

