//! 生成式服务抽象 - 业务能力层
//!
//! 对核心流程而言，生成式服务只是"文本 + 图片进，文本出"的边界，
//! 不关心具体走哪种传输协议。

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::config::GenerationSettings;
use crate::error::ServiceError;
use crate::models::ImageData;

/// 一次生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub text_prompt: String,
    pub images: Vec<ImageData>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    /// 纯文本请求
    pub fn text(prompt: impl Into<String>, settings: GenerationSettings) -> Self {
        Self {
            text_prompt: prompt.into(),
            images: Vec::new(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }

    /// 附带图片
    pub fn with_images(mut self, images: Vec<ImageData>) -> Self {
        self.images = images;
        self
    }
}

/// 生成式服务
///
/// 职责：
/// - 发送一次请求并返回原始文本
/// - 把传输失败、服务端拒绝、空响应区分开
/// - 不解析 JSON，不重试
pub trait GenerativeService: Send + Sync {
    /// 当前使用的模型名称（仅用于日志）
    fn model_name(&self) -> &str;

    /// 发送请求，返回模型输出的原始文本
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, Result<String, ServiceError>>;

    /// 用一个极小的请求验证密钥与端点是否可用
    fn check_credentials(&self) -> BoxFuture<'_, Result<(), ServiceError>> {
        Box::pin(async move {
            let request = GenerationRequest::text(
                "OK",
                GenerationSettings {
                    temperature: 0.0,
                    max_output_tokens: 10,
                },
            );
            self.generate(&request).await.map(|_| ())
        })
    }
}

impl<T: GenerativeService + ?Sized> GenerativeService for Box<T> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, Result<String, ServiceError>> {
        (**self).generate(request)
    }
}

impl<T: GenerativeService + ?Sized> GenerativeService for Arc<T> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, Result<String, ServiceError>> {
        (**self).generate(request)
    }
}
