pub mod gemini_service;
pub mod generative;
pub mod history_store;
pub mod openai_service;
pub mod prompts;

pub use gemini_service::GeminiService;
pub use generative::{GenerationRequest, GenerativeService};
pub use history_store::{HistoryStore, JsonFileHistoryStore, MemoryHistoryStore};
pub use openai_service::OpenAiCompatService;

use crate::config::{Config, Provider};

/// 按配置选择生成式服务
pub fn service_from_config(config: &Config) -> Box<dyn GenerativeService> {
    match config.provider {
        Provider::OpenAi => Box::new(OpenAiCompatService::new(config)),
        Provider::Gemini => Box::new(GeminiService::new(config)),
    }
}
