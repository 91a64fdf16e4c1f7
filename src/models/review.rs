//! 复核响应
//!
//! 让模型复核参考答案或某名学生的批改结果时使用的响应格式。
//! 模型要么确认原内容（`changed = false`），要么给出完整的修正版本。

use serde::{Deserialize, Serialize};

use super::{ExerciseSolutionSet, GradedSubmission};
use crate::extract::Validate;

/// 参考答案复核响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionReviewResponse {
    pub changed: bool,
    pub summary: String,
    #[serde(default)]
    pub change_log: Vec<String>,
    #[serde(default)]
    pub corrected_solution_set: Option<ExerciseSolutionSet>,
}

impl Validate for SolutionReviewResponse {
    fn validate(&self) -> Result<(), String> {
        if !self.changed {
            return Ok(());
        }
        match &self.corrected_solution_set {
            Some(set) => set.validate(),
            None => Err("changed = true 但缺少 correctedSolutionSet".to_string()),
        }
    }
}

/// 批改结果复核响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingReviewResponse {
    pub changed: bool,
    pub summary: String,
    #[serde(default)]
    pub change_log: Vec<String>,
    #[serde(default)]
    pub corrected_submission: Option<GradedSubmission>,
}

impl Validate for GradingReviewResponse {
    fn validate(&self) -> Result<(), String> {
        if !self.changed {
            return Ok(());
        }
        match &self.corrected_submission {
            Some(submission) => submission.validate(),
            None => Err("changed = true 但缺少 correctedSubmission".to_string()),
        }
    }
}
