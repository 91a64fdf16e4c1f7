use std::path::Path;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 生成式服务提供方
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI 兼容的 chat completions 接口
    OpenAi,
    /// Gemini 原生 generateContent 接口
    Gemini,
}

impl Provider {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            _ => Err(ConfigError::UnknownProvider {
                value: value.to_string(),
            }),
        }
    }
}

/// 单类请求的生成参数
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 生成式服务提供方
    pub provider: Provider,
    // --- OpenAI 兼容接口配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- Gemini 配置 ---
    pub gemini_api_base_url: String,
    pub gemini_model_name: String,
    /// 历史记录文件
    pub history_file: String,
    /// 批改任务描述文件（TOML）
    pub task_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 重新分析时，分数变化不超过该值视为"确认"
    pub confirm_threshold: f64,
    /// 生成参考答案
    pub solution_generation: GenerationSettings,
    /// 批改学生作业
    pub grading_generation: GenerationSettings,
    /// 复核参考答案 / 批改结果
    pub review_generation: GenerationSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            gemini_api_base_url: "https://generativelanguage.googleapis.com/v1beta/models"
                .to_string(),
            gemini_model_name: "gemini-2.5-flash".to_string(),
            history_file: "history.json".to_string(),
            task_file: "task.toml".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            confirm_threshold: 0.1,
            solution_generation: GenerationSettings {
                temperature: 0.1,
                max_output_tokens: 16384,
            },
            grading_generation: GenerationSettings {
                temperature: 0.3,
                max_output_tokens: 16384,
            },
            review_generation: GenerationSettings {
                temperature: 0.2,
                max_output_tokens: 8192,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，未出现的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        let config = toml::from_str(&content).map_err(|e| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        Ok(config)
    }

    /// 文件存在则先读文件，再用环境变量覆盖
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let base = if path.exists() {
            Self::from_toml_file(path)?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            provider: std::env::var("LLM_PROVIDER").ok().and_then(|v| Provider::parse(&v).ok()).unwrap_or(default.provider),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            gemini_api_base_url: std::env::var("GEMINI_API_BASE_URL").unwrap_or(default.gemini_api_base_url),
            gemini_model_name: std::env::var("GEMINI_MODEL_NAME").unwrap_or(default.gemini_model_name),
            history_file: std::env::var("HISTORY_FILE").unwrap_or(default.history_file),
            task_file: std::env::var("TASK_FILE").unwrap_or(default.task_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            confirm_threshold: std::env::var("CONFIRM_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.confirm_threshold),
            ..default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generation_settings() {
        let config = Config::default();
        assert_eq!(config.solution_generation.max_output_tokens, 16384);
        assert_eq!(config.review_generation.temperature, 0.2);
        assert_eq!(config.confirm_threshold, 0.1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            provider = "openai"
            llm_model_name = "gpt-4o"

            [grading_generation]
            temperature = 0.5
            max_output_tokens = 4096
            "#,
        )
        .unwrap();
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.llm_model_name, "gpt-4o");
        assert_eq!(config.grading_generation.max_output_tokens, 4096);
        assert_eq!(config.history_file, "history.json");
        assert_eq!(config.solution_generation.temperature, 0.1);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("Gemini").unwrap(), Provider::Gemini);
        assert_eq!(Provider::parse(" openai ").unwrap(), Provider::OpenAi);
        assert!(Provider::parse("claude").is_err());
    }
}
