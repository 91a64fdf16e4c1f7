//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次批改任务的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_grader` - 批量批改器
//! - 管理应用生命周期（初始化、运行）
//! - 生成并复核参考答案
//! - 依次批改任务文件中的每名学生
//! - 保存历史记录，输出统计信息
//!
//! ### `task` - 任务文件加载
//! - 解析 TOML 任务文件（学科、题目、学生作业路径）
//!
//! ## 层次关系
//!
//! ```text
//! batch_grader (处理 Vec<StudentEntry>)
//!     ↓
//! workflow::GradingSession (状态机：参考答案 / 批改 / 复核 / 重新分析)
//!     ↓
//! extract (从模型输出中提取并校验 JSON)
//!     ↓
//! services (能力层：生成式服务 / 提示词 / 历史记录)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：编排层只管批量与统计
//! 2. **向下依赖**：编排层 → workflow → services
//! 3. **无业务逻辑**：分数、校验、替换规则全部在 workflow 中

pub mod batch_grader;
pub mod task;

// 重新导出主要类型
pub use batch_grader::App;
pub use task::{load_task, ExamTask, StudentEntry};
