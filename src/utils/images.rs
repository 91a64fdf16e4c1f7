//! 图片读取
//!
//! 把磁盘上的作业照片读成 `ImageData`（base64），MIME 类型按扩展名推断。

use std::path::Path;

use base64::prelude::*;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::ImageData;

/// 按扩展名推断 MIME 类型
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// 读取图片文件并编码为 base64
pub async fn load_image(path: impl AsRef<Path>) -> AppResult<ImageData> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Other(format!("无法读取图片 {}: {}", path.display(), e)))?;

    debug!("已读取图片 {} ({} 字节)", path.display(), bytes.len());

    Ok(ImageData::new(
        mime_type_for(path),
        BASE64_STANDARD.encode(&bytes),
    ))
}
