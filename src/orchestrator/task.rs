//! 批改任务文件加载
//!
//! 任务文件（TOML）描述一次批改：学科、题目、以及每名学生的作业照片。
//! 文件中的相对路径以任务文件所在目录为基准。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::fs;

/// 一名学生的作业
#[derive(Debug, Clone, Deserialize)]
pub struct StudentEntry {
    pub name: String,
    /// 作业照片路径，按页码顺序
    pub pages: Vec<PathBuf>,
}

/// 批改任务
#[derive(Debug, Clone, Deserialize)]
pub struct ExamTask {
    pub subject: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub statement: String,
    /// 题目照片（可选）
    #[serde(default)]
    pub statement_image: Option<PathBuf>,
    /// 生成参考答案后是否复核一次
    #[serde(default)]
    pub review_solutions: bool,
    /// 复核参考答案时附带的意见
    #[serde(default)]
    pub review_notes: Option<String>,
    #[serde(default)]
    pub students: Vec<StudentEntry>,
}

impl ExamTask {
    /// 把相对路径改写为相对于 `base_dir`
    fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };
        if let Some(image) = self.statement_image.as_mut() {
            resolve(image);
        }
        for student in &mut self.students {
            student.pages.iter_mut().for_each(resolve);
        }
    }
}

/// 从 TOML 文件加载批改任务
pub async fn load_task(task_file_path: &Path) -> Result<ExamTask> {
    let content = fs::read_to_string(task_file_path)
        .await
        .with_context(|| format!("无法读取任务文件: {}", task_file_path.display()))?;

    let mut task = parse_task(&content)
        .with_context(|| format!("无法解析任务文件: {}", task_file_path.display()))?;

    if let Some(base_dir) = task_file_path.parent() {
        task.resolve_paths(base_dir);
    }

    tracing::info!(
        "成功加载任务: {} ({} 名学生)",
        task.subject,
        task.students.len()
    );
    Ok(task)
}

fn parse_task(content: &str) -> Result<ExamTask> {
    let task: ExamTask = toml::from_str(content)?;
    if task.statement.trim().is_empty() && task.statement_image.is_none() {
        anyhow::bail!("任务文件缺少题目（statement 或 statement_image）");
    }
    Ok(task)
}
