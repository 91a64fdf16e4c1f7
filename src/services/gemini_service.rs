//! Gemini 原生接口服务 - 业务能力层
//!
//! 直接调用 `generateContent` REST 接口：图片作为 `inlineData` 放在文本之前，
//! 生成参数放在 `generationConfig` 中。

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServiceError;
use crate::services::generative::{GenerationRequest, GenerativeService};
use crate::utils::logging::truncate_text;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    #[serde(rename_all = "camelCase")]
    Inline { inline_data: GeminiInlineData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiApiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: Option<String>,
}

/// Gemini 服务
pub struct GeminiService {
    http: Client,
    api_base_url: String,
    api_key: String,
    model_name: String,
}

impl GeminiService {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            api_base_url: config.gemini_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
            model_name: config.gemini_model_name.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_base_url, self.model_name)
    }

    async fn send(&self, request: &GenerationRequest) -> Result<String, ServiceError> {
        debug!(
            "调用 Gemini API，模型: {}，图片 {} 张",
            self.model_name,
            request.images.len()
        );

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&build_request_body(request))
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini API 调用失败: {}", e);
                ServiceError::TransportFailure {
                    status: e.status().map(|s| s.as_u16()),
                    message: e.to_string(),
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::TransportFailure {
                status: Some(status),
                message: e.to_string(),
            })?;

        parse_response(status, &body, &self.model_name)
    }
}

impl GenerativeService for GeminiService {
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

fn build_request_body(request: &GenerationRequest) -> GeminiRequest {
    let mut parts: Vec<GeminiPart> = request
        .images
        .iter()
        .map(|image| GeminiPart::Inline {
            inline_data: GeminiInlineData {
                mime_type: image.mime_type.clone(),
                data: image.base64_data.clone(),
            },
        })
        .collect();
    parts.push(GeminiPart::Text {
        text: request.text_prompt.clone(),
    });

    GeminiRequest {
        contents: vec![GeminiContent { parts }],
        generation_config: GeminiGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        },
    }
}

/// 把 HTTP 状态与响应体映射为文本或分类后的错误
fn parse_response(status: u16, body: &str, model: &str) -> Result<String, ServiceError> {
    let parsed: Option<GeminiResponse> = serde_json::from_str(body).ok();

    let api_message = parsed
        .as_ref()
        .and_then(|r| r.error.as_ref())
        .map(|e| e.message.clone().unwrap_or_else(|| "API 调用出错".to_string()));

    if !(200..300).contains(&status) {
        return Err(match api_message {
            Some(message) => ServiceError::ServiceRejected {
                status: Some(status),
                message,
            },
            None => ServiceError::TransportFailure {
                status: Some(status),
                message: truncate_text(body, 200),
            },
        });
    }

    if let Some(message) = api_message {
        return Err(ServiceError::ServiceRejected {
            status: Some(status),
            message,
        });
    }

    let text = parsed
        .into_iter()
        .flat_map(|r| r.candidates)
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty());

    match text {
        Some(text) => Ok(text),
        None => {
            warn!("Gemini 返回内容为空");
            Err(ServiceError::EmptyContent {
                model: model.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationSettings;
    use crate::models::ImageData;

    fn settings() -> GenerationSettings {
        GenerationSettings {
            temperature: 0.1,
            max_output_tokens: 16384,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest::text("生成参考答案", settings())
            .with_images(vec![ImageData::jpeg("AAAA")]);
        let json = serde_json::to_value(build_request_body(&request)).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "AAAA");
        assert_eq!(parts[1]["text"], "生成参考答案");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 16384);
    }

    #[test]
    fn test_parse_success() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "{\"a\": 1}"}]}}]}"#;
        assert_eq!(parse_response(200, body, "m").unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_parse_rejected_passes_message_through() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}}"#;
        match parse_response(400, body, "m") {
            Err(ServiceError::ServiceRejected { status, message }) => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "API key not valid. Please pass a valid API key.");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_http_failure_without_body() {
        assert!(matches!(
            parse_response(503, "<html>Service Unavailable</html>", "m"),
            Err(ServiceError::TransportFailure {
                status: Some(503),
                ..
            })
        ));
    }

    #[test]
    fn test_parse_empty_candidates() {
        assert!(matches!(
            parse_response(200, r#"{"candidates": []}"#, "gemini-2.5-flash"),
            Err(ServiceError::EmptyContent { .. })
        ));
    }
}
