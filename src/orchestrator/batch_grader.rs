//! 批量批改器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次批改任务的调度和统计。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化日志文件、选择生成式服务、加载任务文件
//! 2. **参考答案**：生成参考答案，按需复核一次
//! 3. **逐个批改**：按任务文件顺序批改每名学生，单个失败不影响其他学生
//! 4. **保存历史**：把会话快照写入历史记录
//! 5. **全局统计**：汇总成功/失败数与平均分
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单次批改的细节，全部委托给 `GradingSession`
//! - **串行执行**：同一会话的操作不能并发

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::ImageData;
use crate::orchestrator::task::{self, ExamTask, StudentEntry};
use crate::services::{self, GenerativeService, JsonFileHistoryStore};
use crate::utils::images::load_image;
use crate::utils::logging::{
    init_log_file, log_startup, log_student_start, print_final_stats, truncate_text,
};
use crate::workflow::{GradingSession, SessionSettings};

/// 应用主结构
pub struct App {
    config: Config,
    task: ExamTask,
    session: GradingSession<Box<dyn GenerativeService>>,
    history: JsonFileHistoryStore,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let task = task::load_task(Path::new(&config.task_file)).await?;

        let title = task
            .title
            .clone()
            .unwrap_or_else(|| format!("{} exam", task.subject));
        init_log_file(&config.output_log_file, &title)?;

        let service = services::service_from_config(&config);
        log_startup(service.model_name(), task.students.len());

        let session = GradingSession::new(service, SessionSettings::from_config(&config));
        let history = JsonFileHistoryStore::with_path(&config.history_file);

        Ok(Self {
            config,
            task,
            session,
            history,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        if self.task.students.is_empty() {
            warn!("⚠️ 任务文件中没有学生，程序结束");
            return Ok(());
        }

        self.prepare_solutions().await?;

        let stats = self.grade_all_students().await;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            self.session.average_score(),
            &self.config.output_log_file,
        );

        if stats.success > 0 {
            self.session
                .save_to_history(&self.history)
                .await
                .context("保存历史记录失败")?;
            info!("📁 历史文件: {}", self.history.path().display());
        } else {
            warn!("⚠️ 没有成功批改的学生，不保存历史记录");
        }

        Ok(())
    }

    /// 生成参考答案，按需复核
    async fn prepare_solutions(&mut self) -> Result<()> {
        let statement_image = match &self.task.statement_image {
            Some(path) => Some(load_image(path).await?),
            None => None,
        };

        info!("\n📐 正在生成参考答案...");
        let solution_set = self
            .session
            .draft_solution_set(
                &self.task.statement,
                statement_image,
                &self.task.subject,
                self.task.title.as_deref(),
            )
            .await
            .context("生成参考答案失败")?;

        for exercise in &solution_set.exercises {
            info!(
                "  第 {} 题 [{} 分] {} → {}",
                exercise.number,
                exercise.max_score,
                exercise.title,
                truncate_text(&exercise.result, 60)
            );
        }

        if self.task.review_solutions {
            let outcome = self
                .session
                .revise_solution_set(self.task.review_notes.as_deref())
                .await
                .context("复核参考答案失败")?;
            info!("🔍 复核结论: {}", outcome.summary);
            for change in &outcome.change_log {
                info!("  - {}", change);
            }
        }

        Ok(())
    }

    /// 依次批改所有学生
    async fn grade_all_students(&mut self) -> GradingStats {
        let students = self.task.students.clone();
        let mut stats = GradingStats {
            total: students.len(),
            ..Default::default()
        };

        for (idx, student) in students.iter().enumerate() {
            log_student_start(idx + 1, stats.total, &student.name, student.pages.len());

            match self.grade_student(student).await {
                Ok(()) => stats.success += 1,
                Err(e) => {
                    error!("[学生 {}] ❌ 批改失败: {:#}", student.name, e);
                    stats.failed += 1;
                }
            }

            self.session.reset_for_next_student();
        }

        stats
    }

    /// 批改单名学生
    async fn grade_student(&mut self, student: &StudentEntry) -> Result<()> {
        let pages = load_pages(&student.pages).await?;

        self.session.set_student_name(&student.name);
        for page in pages {
            self.session.queue_page(page);
        }

        let submission = self.session.grade_pending().await?;

        for exercise in &submission.exercises {
            info!(
                "  第 {} 题: {}/{} ({})",
                exercise.number, exercise.score, exercise.max_score, exercise.status
            );
        }
        info!(
            "[学生 {}] 📝 {}",
            student.name,
            truncate_text(&submission.general_assessment, 120)
        );

        Ok(())
    }
}

async fn load_pages(paths: &[impl AsRef<Path>]) -> Result<Vec<ImageData>> {
    let mut pages = Vec::with_capacity(paths.len());
    for path in paths {
        pages.push(load_image(path).await?);
    }
    Ok(pages)
}

/// 批改统计
#[derive(Debug, Default)]
struct GradingStats {
    success: usize,
    failed: usize,
    total: usize,
}
