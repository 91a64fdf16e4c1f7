//! 数据模型
//!
//! 与生成式服务之间交换的 JSON 结构，以及会话快照。
//! 字段名统一使用 camelCase，模型的提示词中也按这个格式约定输出。

pub mod image;
pub mod review;
pub mod snapshot;
pub mod solution;
pub mod submission;

pub use image::ImageData;
pub use review::{GradingReviewResponse, SolutionReviewResponse};
pub use snapshot::{HistoryRecord, SessionSnapshot};
pub use solution::{ExerciseSolution, ExerciseSolutionSet};
pub use submission::{ExerciseStatus, GradedExercise, GradedSubmission};

/// 浮点分数比较的容差
pub(crate) const SCORE_EPSILON: f64 = 1e-9;

/// 题号既可能是字符串也可能是整数，统一转成字符串
pub(crate) fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct LabelVisitor;

    impl<'de> Visitor<'de> for LabelVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or numeric exercise label")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        // 1.0 写成 "1"，其余原样保留
        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.is_finite() && value.fract() == 0.0 {
                Ok(format!("{:.0}", value))
            } else {
                Ok(value.to_string())
            }
        }
    }

    deserializer.deserialize_any(LabelVisitor)
}

/// 分数必须是有限且非负的数
pub(crate) fn check_score(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} 必须是非负数，实际为 {}", field, value));
    }
    Ok(())
}
