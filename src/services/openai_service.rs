//! OpenAI 兼容服务 - 业务能力层
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServiceError;
use crate::services::generative::{GenerationRequest, GenerativeService};

const SYSTEM_MESSAGE: &str = "你是一位经验丰富的中学教师，只输出合法的 JSON，不输出任何其他内容。";

/// OpenAI 兼容服务
///
/// 图片以 `data:` URL 的形式附加在用户消息中。
pub struct OpenAiCompatService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiCompatService {
    /// 创建新的服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 构建 chat completion 请求
    fn build_request(
        &self,
        request: &GenerationRequest,
    ) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_MESSAGE)
            .build()?;

        let user_msg = if request.images.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.text_prompt.as_str())
                .build()?
        } else {
            // 图片在前，文本在后
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = request
                .images
                .iter()
                .map(|image| {
                    ChatCompletionRequestUserMessageContentPart::ImageUrl(
                        ChatCompletionRequestMessageContentPartImage {
                            image_url: ImageUrl {
                                url: image.data_url(),
                                detail: Some(ImageDetail::High),
                            },
                        },
                    )
                })
                .collect();

            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: request.text_prompt.clone(),
                },
            ));

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(
                    content_parts,
                ))
                .build()?
        };

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(request.temperature)
            .max_tokens(request.max_output_tokens)
            .build()
    }

    async fn send(&self, request: &GenerationRequest) -> Result<String, ServiceError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("提示词长度: {} 字符", request.text_prompt.len());
        if !request.images.is_empty() {
            debug!("使用 Vision API，包含 {} 张图片", request.images.len());
        }

        let chat_request = self.build_request(request).map_err(map_openai_error)?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            map_openai_error(e)
        })?;

        debug!("LLM API 调用成功");

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ServiceError::EmptyContent {
                model: self.model_name.clone(),
            })
    }
}

impl GenerativeService for OpenAiCompatService {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, Result<String, ServiceError>> {
        Box::pin(self.send(request))
    }
}

/// 服务端返回的错误原样透传，其余一律视为传输失败
fn map_openai_error(err: OpenAIError) -> ServiceError {
    match err {
        OpenAIError::ApiError(api_error) => ServiceError::ServiceRejected {
            status: None,
            message: api_error.message,
        },
        other => ServiceError::TransportFailure {
            status: None,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationSettings;
    use crate::models::ImageData;

    fn create_test_service() -> OpenAiCompatService {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            ..Config::default()
        };
        OpenAiCompatService::new(&config)
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            temperature: 0.3,
            max_output_tokens: 1024,
        }
    }

    #[test]
    fn test_build_text_request() {
        let service = create_test_service();
        let request = GenerationRequest::text("解方程 x + 1 = 2", settings());
        let chat_request = service.build_request(&request).unwrap();
        assert_eq!(chat_request.model, "gpt-4o-mini");
        assert_eq!(chat_request.messages.len(), 2);
        assert_eq!(chat_request.temperature, Some(0.3));
    }

    #[test]
    fn test_build_vision_request_puts_images_first() {
        let service = create_test_service();
        let request = GenerationRequest::text("批改", settings())
            .with_images(vec![ImageData::jpeg("AAAA"), ImageData::jpeg("BBBB")]);
        let chat_request = service.build_request(&request).unwrap();

        let json = serde_json::to_value(&chat_request).unwrap();
        let content = &json["messages"][1]["content"];
        assert_eq!(content.as_array().map(|parts| parts.len()), Some(3));
        assert_eq!(content[0]["image_url"]["url"], "data:image/jpeg;base64,AAAA");
        assert_eq!(content[2]["text"], "批改");
    }

    /// 需要真实的 API Key：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_check_credentials_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_check_credentials_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = OpenAiCompatService::new(&Config::from_env());
        match service.check_credentials().await {
            Ok(()) => println!("✅ API Key 可用"),
            Err(e) => panic!("API Key 验证失败: {}", e),
        }
    }
}
