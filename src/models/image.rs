use serde::{Deserialize, Serialize};

/// 一张图片（题目或作业页）
///
/// 对核心流程而言是不透明的数据块：只携带 MIME 类型和 base64 内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub mime_type: String,
    pub base64_data: String,
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64_data: base64_data.into(),
        }
    }

    /// 手机拍照上传的默认格式
    pub fn jpeg(base64_data: impl Into<String>) -> Self {
        Self::new("image/jpeg", base64_data)
    }

    /// 转换为 `data:` URL（OpenAI 兼容接口使用）
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }

    pub fn is_empty(&self) -> bool {
        self.base64_data.is_empty()
    }
}
