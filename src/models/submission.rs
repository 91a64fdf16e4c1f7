use serde::{Deserialize, Serialize};

use super::{check_score, deserialize_label, ImageData, SCORE_EPSILON};
use crate::extract::Validate;

/// 单题批改状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStatus {
    Correct,
    Partial,
    Incorrect,
    NotAttempted,
}

impl std::fmt::Display for ExerciseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ExerciseStatus::Correct => "正确",
            ExerciseStatus::Partial => "部分正确",
            ExerciseStatus::Incorrect => "错误",
            ExerciseStatus::NotAttempted => "未作答",
        };
        write!(f, "{}", label)
    }
}

/// 单题批改结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedExercise {
    #[serde(deserialize_with = "deserialize_label")]
    pub number: String,
    /// 学生作答的转写，空字符串表示未作答
    pub student_answer_transcript: String,
    pub analysis: String,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub correct_points: Vec<String>,
    pub score: f64,
    pub max_score: f64,
    pub status: ExerciseStatus,
}

impl GradedExercise {
    pub fn is_attempted(&self) -> bool {
        !self.student_answer_transcript.trim().is_empty()
    }
}

impl Validate for GradedExercise {
    fn validate(&self) -> Result<(), String> {
        check_score(&format!("第 {} 题的 maxScore", self.number), self.max_score)?;
        check_score(&format!("第 {} 题的 score", self.number), self.score)?;
        if self.score > self.max_score + SCORE_EPSILON {
            return Err(format!(
                "第 {} 题得分 {} 超过满分 {}",
                self.number, self.score, self.max_score
            ));
        }
        let not_attempted = self.status == ExerciseStatus::NotAttempted;
        if not_attempted == self.is_attempted() {
            return Err(format!(
                "第 {} 题状态 '{}' 与作答内容不一致",
                self.number, self.status
            ));
        }
        Ok(())
    }
}

fn default_max_score() -> f64 {
    10.0
}

/// 一名学生的完整批改结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedSubmission {
    #[serde(default)]
    pub student_name: String,
    pub exercises: Vec<GradedExercise>,
    pub final_score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    pub general_assessment: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// 原始作业图片，用于之后重新分析；模型响应中不包含此字段
    #[serde(default)]
    pub source_images: Vec<ImageData>,
}

impl GradedSubmission {
    pub fn has_source_images(&self) -> bool {
        !self.source_images.is_empty()
    }

    /// 各题得分之和
    pub fn summed_score(&self) -> f64 {
        self.exercises.iter().map(|e| e.score).sum()
    }

    /// 最终得分是否与各题得分之和一致
    pub fn is_score_consistent(&self) -> bool {
        (self.summed_score() - self.final_score).abs() < 1e-6
    }
}

impl Validate for GradedSubmission {
    fn validate(&self) -> Result<(), String> {
        if self.student_name.trim().is_empty() {
            return Err("studentName 不能为空".to_string());
        }
        if self.exercises.is_empty() {
            return Err("批改结果中没有任何题目".to_string());
        }
        for exercise in &self.exercises {
            exercise.validate()?;
        }
        check_score("maxScore", self.max_score)?;
        check_score("finalScore", self.final_score)?;
        if self.final_score > self.max_score + SCORE_EPSILON {
            return Err(format!(
                "最终得分 {} 超过满分 {}",
                self.final_score, self.max_score
            ));
        }
        Ok(())
    }
}
