use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ExerciseSolutionSet, GradedSubmission};

/// 一次批改会话的不可变快照（保存到历史记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub subject: String,
    pub title: String,
    pub task_statement: String,
    pub solution_set: ExerciseSolutionSet,
    pub results: Vec<GradedSubmission>,
    pub student_count: usize,
    pub average_score: f64,
}

/// 历史记录：快照 + 存储分配的 id 与创建时间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

impl HistoryRecord {
    /// 创建日期（UTC，按天截断）
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}
