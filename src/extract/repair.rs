//! 截断 JSON 修复
//!
//! 模型输出经常因为 token 上限被截断在半路。这里只做一件事：
//! 单次从左到右扫描，推断缺失的收尾符号并补齐，不做语义校验。

use thiserror::Error;

/// 修复失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepairError {
    /// 候选文本为空
    #[error("候选文本为空")]
    Empty,
    /// 出现了没有对应开符号的闭合符号
    #[error("位置 {offset} 的 '{found}' 没有对应的开符号")]
    UnbalancedClosing { offset: usize, found: char },
}

/// 扫描结束时的状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanState {
    /// 是否停在字符串内部
    pub in_string: bool,
    /// 字符串内最后一个字符是否是未消费的反斜杠
    pub escaped: bool,
    /// 未闭合的 `{` 数量
    pub brace_depth: usize,
    /// 未闭合的 `[` 数量
    pub bracket_depth: usize,
    /// 未闭合的开符号，按出现顺序
    open: Vec<char>,
}

/// 扫描候选文本，记录字符串 / 转义 / 括号深度
///
/// 括号只在字符串外计数；`\\` 在字符串内作为一个转义整体消费，
/// 不会误切换 `in_string`。
pub fn scan(candidate: &str) -> Result<ScanState, RepairError> {
    let mut state = ScanState::default();

    for (offset, ch) in candidate.char_indices() {
        if state.in_string {
            if state.escaped {
                state.escaped = false;
                continue;
            }
            match ch {
                '\\' => state.escaped = true,
                '"' => state.in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => state.in_string = true,
            '{' => {
                state.brace_depth += 1;
                state.open.push('{');
            }
            '[' => {
                state.bracket_depth += 1;
                state.open.push('[');
            }
            '}' | ']' => {
                let expected = if ch == '}' { '{' } else { '[' };
                if state.open.last() != Some(&expected) {
                    return Err(RepairError::UnbalancedClosing { offset, found: ch });
                }
                state.open.pop();
                if ch == '}' {
                    state.brace_depth -= 1;
                } else {
                    state.bracket_depth -= 1;
                }
            }
            _ => {}
        }
    }

    Ok(state)
}

/// 补齐被截断的 JSON 文本
///
/// 顺序：
/// 1. 停在字符串内则补一个 `"`（末尾悬空的反斜杠先去掉）
/// 2. 去掉一个结尾逗号（允许其后有空白）
/// 3. 按嵌套顺序补齐 `]` 与 `}`，数量分别等于 `bracket_depth` / `brace_depth`
///    （按打开顺序的逆序逐个补齐，不是先补全部 `]` 再补全部 `}`：`{"a":[{"b":1` 补成 `…}]}`）
///
/// 结果只保证语法闭合，被截断的字段内容仍然是残缺的。
pub fn repair_truncated(candidate: &str) -> Result<String, RepairError> {
    if candidate.trim().is_empty() {
        return Err(RepairError::Empty);
    }

    let state = scan(candidate)?;
    let mut repaired = candidate.to_string();

    if state.in_string {
        if state.escaped {
            repaired.pop();
        }
        repaired.push('"');
    }

    let content_len = repaired.trim_end().len();
    if repaired[..content_len].ends_with(',') {
        repaired.truncate(content_len - 1);
    }

    for open in state.open.iter().rev() {
        repaired.push(if *open == '{' { '}' } else { ']' });
    }

    Ok(repaired)
}
