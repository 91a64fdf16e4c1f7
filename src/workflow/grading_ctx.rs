//! 批改上下文
//!
//! 封装"我正在批改哪名学生、对应第几条结果"这一信息，只用于日志

use std::fmt::Display;

/// 批改上下文
#[derive(Debug, Clone)]
pub struct GradingCtx {
    /// 学生姓名
    pub student_name: String,

    /// 在结果列表中的索引（新批改的学生尚无索引）
    pub result_index: Option<usize>,

    /// 学科
    pub subject: String,
}

impl GradingCtx {
    /// 新批改的学生
    pub fn new(student_name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            result_index: None,
            subject: subject.into(),
        }
    }

    /// 已有结果的学生（复核、重新分析）
    pub fn at(index: usize, student_name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            result_index: Some(index),
            subject: subject.into(),
        }
    }
}

impl Display for GradingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.result_index {
            Some(index) => write!(
                f,
                "[学生 {} 结果#{} 学科 {}]",
                self.student_name, index, self.subject
            ),
            None => write!(f, "[学生 {} 学科 {}]", self.student_name, self.subject),
        }
    }
}
