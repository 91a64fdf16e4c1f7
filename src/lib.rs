//! # Exam Grader
//!
//! 一个借助生成式模型批改学生试卷的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据与提取（Models / Extract）
//! - `models/` - 参考答案、批改结果、复核响应、历史快照
//! - `extract/` - 从模型的自由文本中提取 JSON，必要时修复截断，并做结构校验
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `GenerativeService` - 文本 + 图片进，文本出（OpenAI 兼容 / Gemini）
//! - `prompts` - 提示词构建
//! - `HistoryStore` - 会话快照的保存与查询
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一次批改会话的状态与操作
//! - `GradingSession` - 生成参考答案 → 批改 → 复核 / 重新分析
//! - `GradingCtx` - 上下文封装（学生姓名 + 结果索引）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_grader` - 按任务文件批量批改
//! - `orchestrator/task` - 任务文件加载
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod extract;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Provider};
pub use error::{AppError, AppResult};
pub use extract::{extract, extract_as, ExtractError};
pub use models::{ExerciseSolutionSet, GradedExercise, GradedSubmission, ImageData};
pub use orchestrator::App;
pub use services::{GenerativeService, HistoryStore};
pub use workflow::{GradingSession, ReanalysisOutcome, RevisionOutcome, ScoreVerdict, SessionState};
