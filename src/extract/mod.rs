//! 结构化响应提取
//!
//! 把生成式模型返回的自由文本还原成 JSON 对象。模型可能：
//! - 用 markdown 代码块包裹 JSON
//! - 在 JSON 前后夹带说明文字
//! - 因输出上限被截断
//!
//! 提取按固定顺序逐级回退，任何一级成功即返回；全部失败则显式报错，
//! 从不返回残缺或猜测的数据。

pub mod repair;

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

pub use repair::{repair_truncated, RepairError};

/// 诊断信息里保留的原文长度（字符数）
pub const SNIPPET_CHARS: usize = 500;

// 字面量正则，不会编译失败
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?\s*").expect("fence pattern is valid"));

/// 提取失败
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    /// 文本中没有任何 JSON 对象的迹象
    #[error("响应中没有找到 JSON 内容，请重试")]
    NoJsonFound,
    /// 找到了候选内容，但无法解析、修复或通过结构校验
    #[error("响应内容无法解析 ({reason})，请尝试更短或更简单的输入后重试")]
    UnrecoverableMalformedResponse {
        /// 原始响应的前 500 个字符
        snippet: String,
        reason: String,
    },
}

impl ExtractError {
    fn malformed(raw: &str, reason: impl Into<String>) -> Self {
        ExtractError::UnrecoverableMalformedResponse {
            snippet: raw.chars().take(SNIPPET_CHARS).collect(),
            reason: reason.into(),
        }
    }
}

/// 提取结果
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T = JsonValue> {
    pub value: T,
    /// 是否经过截断修复才得到
    pub repaired: bool,
}

/// 反序列化之后的结构校验
///
/// 模型返回的 JSON 即使能反序列化，也可能违反数据不变量（例如得分超过满分），
/// 实现方在这里拒绝这类结果。
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// 从原始文本中提取 JSON 对象
///
/// 回退顺序：
/// 1. 直接解析
/// 2. 去掉 markdown 代码块标记后解析
/// 3. 截取第一个 `{` 到最后一个 `}` 之间的内容解析
/// 4. 对候选内容做截断修复后解析
pub fn extract(raw: &str) -> Result<Extracted, ExtractError> {
    if let Some(value) = parse_object(raw) {
        return Ok(plain(value));
    }

    let cleaned = strip_fences(raw);
    if let Some(value) = parse_object(&cleaned) {
        debug!("去掉代码块标记后解析成功");
        return Ok(plain(value));
    }

    let Some(start) = cleaned.find('{') else {
        debug!("响应中没有 '{{'，放弃解析");
        return Err(ExtractError::NoJsonFound);
    };

    // 有 '}' 则截取到最后一个 '}'，否则一直到文本末尾（典型的截断输出）
    let tail = &cleaned[start..];
    let span = match tail.rfind('}') {
        Some(end) => &tail[..=end],
        None => tail,
    };

    if let Some(value) = parse_object(span) {
        debug!("截取 JSON 片段后解析成功");
        return Ok(plain(value));
    }

    // 先修复到文本末尾的完整尾部，保住最后一个 '}' 之后被截断的内容
    let mut candidates = vec![tail];
    if span.len() != tail.len() {
        candidates.push(span);
    }

    let mut last_reason = String::from("JSON 语法错误");
    for candidate in candidates {
        match repair_truncated(candidate) {
            Ok(repaired) => match serde_json::from_str::<JsonValue>(&repaired) {
                Ok(value) if value.is_object() => {
                    debug!("截断修复后解析成功");
                    return Ok(Extracted {
                        value,
                        repaired: true,
                    });
                }
                Ok(_) => last_reason = "修复结果不是 JSON 对象".to_string(),
                Err(e) => last_reason = format!("修复后仍无法解析: {}", e),
            },
            Err(e) => last_reason = e.to_string(),
        }
    }

    warn!(
        "无法解析模型响应 ({}), 原始内容: {}",
        last_reason,
        raw.chars().take(SNIPPET_CHARS).collect::<String>()
    );
    Err(ExtractError::malformed(raw, last_reason))
}

/// 提取并反序列化为指定类型，随后做结构校验
///
/// 结构不符同样视为 `UnrecoverableMalformedResponse`。
pub fn extract_as<T>(raw: &str) -> Result<Extracted<T>, ExtractError>
where
    T: DeserializeOwned + Validate,
{
    extract_as_patched(raw, |_| {})
}

/// 与 [`extract_as`] 相同，但在反序列化前允许调用方改写 JSON
///
/// 用于覆盖不应由模型决定的字段（例如学生姓名、原始图片）。
pub fn extract_as_patched<T, F>(raw: &str, patch: F) -> Result<Extracted<T>, ExtractError>
where
    T: DeserializeOwned + Validate,
    F: FnOnce(&mut JsonValue),
{
    let Extracted { mut value, repaired } = extract(raw)?;
    patch(&mut value);

    let typed: T = serde_json::from_value(value)
        .map_err(|e| ExtractError::malformed(raw, format!("结构不符: {}", e)))?;

    typed
        .validate()
        .map_err(|reason| ExtractError::malformed(raw, format!("校验失败: {}", reason)))?;

    if repaired {
        warn!("模型响应经过截断修复，部分内容可能不完整");
    }

    Ok(Extracted {
        value: typed,
        repaired,
    })
}

/// 去掉所有 ``` / ```json 标记（不区分大小写）并去掉首尾空白
pub fn strip_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").trim().to_string()
}

fn parse_object(text: &str) -> Option<JsonValue> {
    serde_json::from_str::<JsonValue>(text)
        .ok()
        .filter(JsonValue::is_object)
}

fn plain(value: JsonValue) -> Extracted {
    Extracted {
        value,
        repaired: false,
    }
}
