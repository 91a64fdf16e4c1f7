//! 会话操作的返回结果

use std::fmt::Display;

use crate::models::SCORE_EPSILON;

/// 复核（参考答案或批改结果）的结论
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionOutcome {
    /// 是否替换了原内容
    pub changed: bool,
    pub summary: String,
    pub change_log: Vec<String>,
}

/// 重新分析后的分数判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreVerdict {
    /// 分数变化在阈值以内，原批改得到确认
    Confirmed,
    /// 分数变化超过阈值
    Revised,
}

impl ScoreVerdict {
    /// 按分数变化的绝对值分类，恰好等于阈值时视为确认
    pub fn classify(delta: f64, threshold: f64) -> Self {
        if delta.abs() <= threshold + SCORE_EPSILON {
            ScoreVerdict::Confirmed
        } else {
            ScoreVerdict::Revised
        }
    }
}

impl Display for ScoreVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreVerdict::Confirmed => write!(f, "确认"),
            ScoreVerdict::Revised => write!(f, "修正"),
        }
    }
}

/// 重新分析的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReanalysisOutcome {
    pub previous_score: f64,
    pub new_score: f64,
    /// `new_score - previous_score`
    pub delta: f64,
    pub verdict: ScoreVerdict,
}

impl ReanalysisOutcome {
    pub fn new(previous_score: f64, new_score: f64, threshold: f64) -> Self {
        let delta = new_score - previous_score;
        Self {
            previous_score,
            new_score,
            delta,
            verdict: ScoreVerdict::classify(delta, threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_change_is_confirmed() {
        let outcome = ReanalysisOutcome::new(6.0, 6.05, 0.1);
        assert!((outcome.delta - 0.05).abs() < 1e-9);
        assert_eq!(outcome.verdict, ScoreVerdict::Confirmed);
    }

    #[test]
    fn test_large_change_is_revised() {
        assert_eq!(
            ReanalysisOutcome::new(6.0, 7.0, 0.1).verdict,
            ScoreVerdict::Revised
        );
        assert_eq!(
            ReanalysisOutcome::new(6.0, 5.5, 0.1).verdict,
            ScoreVerdict::Revised
        );
    }

    #[test]
    fn test_boundary_is_confirmed() {
        // 恰好相差 0.1 的分数在浮点运算下不应被判为修正
        assert_eq!(ScoreVerdict::classify(7.1 - 7.0, 0.1), ScoreVerdict::Confirmed);
        assert_eq!(ScoreVerdict::classify(6.0 - 5.9, 0.1), ScoreVerdict::Confirmed);
        assert_eq!(ScoreVerdict::classify(-0.1, 0.1), ScoreVerdict::Confirmed);
    }
}
