//! 批改会话 - 流程层
//!
//! 核心职责：持有一次批改工作的全部状态，并定义每个操作的完整流程
//!
//! 状态流转：
//! 1. 无参考答案 → 生成参考答案（可反复复核）
//! 2. 暂存学生作业 → 批改 → 追加到结果列表
//! 3. 任意一条结果可以单独复核或基于原图重新分析
//!
//! 所有修改都是"要么整体替换，要么什么都不变"：
//! 生成式服务失败或响应无法通过提取与校验时，会话状态保持调用前的样子。

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::config::{Config, GenerationSettings};
use crate::error::{AppResult, PreconditionError};
use crate::extract::{extract_as, extract_as_patched, Extracted};
use crate::models::{
    ExerciseSolutionSet, GradedSubmission, GradingReviewResponse, ImageData, SessionSnapshot,
    SolutionReviewResponse,
};
use crate::services::generative::{GenerationRequest, GenerativeService};
use crate::services::history_store::HistoryStore;
use crate::services::prompts;
use crate::workflow::grading_ctx::GradingCtx;
use crate::workflow::outcome::{ReanalysisOutcome, RevisionOutcome};

/// 会话所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 还没有参考答案
    NoSolutionSet,
    /// 已有参考答案，等待学生作业
    SolutionSetDrafted,
    /// 已暂存学生作业页面，尚未批改
    SubmissionQueued,
    /// 至少批改了一名学生
    SubmissionGraded,
}

/// 会话用到的生成参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub solution: GenerationSettings,
    pub grading: GenerationSettings,
    pub review: GenerationSettings,
    /// 重新分析时分数变化不超过该值视为确认
    pub confirm_threshold: f64,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            solution: config.solution_generation,
            grading: config.grading_generation,
            review: config.review_generation,
            confirm_threshold: config.confirm_threshold,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 批改会话
///
/// - 同一会话的操作必须串行调用
/// - 不同会话之间不共享任何内存状态
pub struct GradingSession<S> {
    service: S,
    settings: SessionSettings,
    subject: String,
    title: String,
    task_statement: String,
    active_solution_set: Option<ExerciseSolutionSet>,
    results: Vec<GradedSubmission>,
    pending_images: Vec<ImageData>,
    pending_student_name: Option<String>,
}

impl<S: GenerativeService> GradingSession<S> {
    pub fn new(service: S, settings: SessionSettings) -> Self {
        Self {
            service,
            settings,
            subject: String::new(),
            title: String::new(),
            task_statement: String::new(),
            active_solution_set: None,
            results: Vec::new(),
            pending_images: Vec::new(),
            pending_student_name: None,
        }
    }

    // ========== 只读访问 ==========

    pub fn state(&self) -> SessionState {
        if self.active_solution_set.is_none() {
            SessionState::NoSolutionSet
        } else if !self.pending_images.is_empty() {
            SessionState::SubmissionQueued
        } else if !self.results.is_empty() {
            SessionState::SubmissionGraded
        } else {
            SessionState::SolutionSetDrafted
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn task_statement(&self) -> &str {
        &self.task_statement
    }

    pub fn active_solution_set(&self) -> Option<&ExerciseSolutionSet> {
        self.active_solution_set.as_ref()
    }

    /// 批改结果，顺序即批改顺序
    pub fn results(&self) -> &[GradedSubmission] {
        &self.results
    }

    pub fn pending_images(&self) -> &[ImageData] {
        &self.pending_images
    }

    pub fn pending_student_name(&self) -> Option<&str> {
        self.pending_student_name.as_deref()
    }

    /// 班级平均分，没有结果时为 `None`
    pub fn average_score(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        let total: f64 = self.results.iter().map(|r| r.final_score).sum();
        Some(total / self.results.len() as f64)
    }

    // ========== 参考答案 ==========

    /// 根据题目文字和/或题目图片生成参考答案
    ///
    /// 成功后才会更新题目、标题、学科和参考答案；失败时保留原有内容。
    pub async fn draft_solution_set(
        &mut self,
        statement: &str,
        statement_image: Option<ImageData>,
        subject: &str,
        title: Option<&str>,
    ) -> AppResult<ExerciseSolutionSet> {
        let statement_image = statement_image.filter(|image| !image.is_empty());
        if statement.trim().is_empty() && statement_image.is_none() {
            return Err(PreconditionError::EmptyStatement.into());
        }

        info!("[{}] 正在生成参考答案...", subject);

        let prompt = prompts::solution_prompt(subject, statement);
        let request = GenerationRequest::text(prompt, self.settings.solution)
            .with_images(statement_image.into_iter().collect());

        let raw = self.service.generate(&request).await?;
        let Extracted { value: solution_set, repaired } =
            extract_as::<ExerciseSolutionSet>(&raw)?;

        if !solution_set.is_total_consistent() {
            debug!(
                "总分 {} 与各题满分之和 {} 不一致",
                solution_set.total_max_score,
                solution_set.summed_max_score()
            );
        }
        if repaired {
            warn!("[{}] 参考答案来自截断修复，请检查最后几题", subject);
        }

        self.subject = subject.to_string();
        self.title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} exam", subject));
        self.task_statement = statement.to_string();
        self.active_solution_set = Some(solution_set.clone());

        info!(
            "[{}] ✓ 参考答案已生成，共 {} 题，满分 {}",
            subject,
            solution_set.exercises.len(),
            solution_set.total_max_score
        );
        Ok(solution_set)
    }

    /// 复核当前参考答案，`changed = true` 时整体替换
    pub async fn revise_solution_set(&mut self, notes: Option<&str>) -> AppResult<RevisionOutcome> {
        let current = self
            .active_solution_set
            .as_ref()
            .ok_or(PreconditionError::NoSolutionSet)?;

        info!("[{}] 正在复核参考答案...", self.subject);

        let prompt =
            prompts::solution_review_prompt(&self.subject, &self.task_statement, current, notes);
        let request = GenerationRequest::text(prompt, self.settings.review);

        let raw = self.service.generate(&request).await?;
        let review = extract_as_patched::<SolutionReviewResponse, _>(&raw, |value| {
            drop_unless_changed(value, "correctedSolutionSet")
        })?
        .value;

        let outcome = RevisionOutcome {
            changed: review.changed,
            summary: review.summary,
            change_log: review.change_log,
        };

        match (review.changed, review.corrected_solution_set) {
            (true, Some(corrected)) => {
                info!(
                    "[{}] ✓ 参考答案已修正 ({} 处修改)",
                    self.subject,
                    outcome.change_log.len()
                );
                self.active_solution_set = Some(corrected);
            }
            _ => info!("[{}] ✓ 参考答案确认无误", self.subject),
        }

        Ok(outcome)
    }

    // ========== 批改 ==========

    /// 批改一名学生的作业（多页作为一个整体），结果追加到列表末尾
    pub async fn grade_submission(
        &mut self,
        student_name: &str,
        images: Vec<ImageData>,
    ) -> AppResult<GradedSubmission> {
        let solution_set = self
            .active_solution_set
            .as_ref()
            .ok_or(PreconditionError::NoSolutionSet)?;
        let student_name = student_name.trim();
        if student_name.is_empty() {
            return Err(PreconditionError::EmptyStudentName.into());
        }
        if images.is_empty() {
            return Err(PreconditionError::NoImages.into());
        }

        let ctx = GradingCtx::new(student_name, &self.subject);
        info!("{} 📝 正在批改 {} 页作业...", ctx, images.len());

        let submission = self
            .run_grading(solution_set, student_name, &images, &ctx)
            .await?;

        self.results.push(submission.clone());
        info!(
            "{} ✓ 批改完成: {}/{}",
            ctx, submission.final_score, submission.max_score
        );
        Ok(submission)
    }

    /// 暂存一页作业
    pub fn queue_page(&mut self, image: ImageData) {
        self.pending_images.push(image);
        debug!("已暂存第 {} 页", self.pending_images.len());
    }

    /// 移除暂存的某一页
    pub fn remove_page(&mut self, index: usize) -> AppResult<ImageData> {
        if index >= self.pending_images.len() {
            return Err(PreconditionError::IndexOutOfRange {
                index,
                len: self.pending_images.len(),
            }
            .into());
        }
        Ok(self.pending_images.remove(index))
    }

    pub fn set_student_name(&mut self, name: impl Into<String>) {
        self.pending_student_name = Some(name.into());
    }

    /// 用暂存的姓名和页面批改
    ///
    /// 暂存内容在批改后保留，由 [`Self::reset_for_next_student`] 清空。
    pub async fn grade_pending(&mut self) -> AppResult<GradedSubmission> {
        let name = self.pending_student_name.clone().unwrap_or_default();
        let images = self.pending_images.clone();
        self.grade_submission(&name, images).await
    }

    /// 复核某条批改结果，`changed = true` 时整体替换该条
    ///
    /// 替换后的记录保留原学生姓名与原始图片。
    pub async fn review_grading(
        &mut self,
        index: usize,
        notes: Option<&str>,
    ) -> AppResult<RevisionOutcome> {
        let existing = self.result_at(index)?;
        let solution_set = self
            .active_solution_set
            .as_ref()
            .ok_or(PreconditionError::NoSolutionSet)?;

        let ctx = GradingCtx::at(index, &existing.student_name, &self.subject);
        info!("{} 🔍 正在复核批改...", ctx);

        let prompt =
            prompts::grading_review_prompt(&self.subject, solution_set, existing, notes);
        let request = GenerationRequest::text(prompt, self.settings.review);

        let raw = self.service.generate(&request).await?;
        let student_name = existing.student_name.clone();
        let review = extract_as_patched::<GradingReviewResponse, _>(&raw, |value| {
            drop_unless_changed(value, "correctedSubmission");
            if let Some(corrected) = value.get_mut("correctedSubmission") {
                pin_identity(corrected, &student_name);
            }
        })?
        .value;

        let outcome = RevisionOutcome {
            changed: review.changed,
            summary: review.summary,
            change_log: review.change_log,
        };

        match (review.changed, review.corrected_submission) {
            (true, Some(mut corrected)) => {
                corrected.source_images = existing.source_images.clone();
                info!(
                    "{} ✓ 批改已修正: {} → {}",
                    ctx, existing.final_score, corrected.final_score
                );
                self.results[index] = corrected;
            }
            _ => info!("{} ✓ 批改确认无误", ctx),
        }

        Ok(outcome)
    }

    /// 基于保存的原始图片重新批改，并整体替换该条结果
    pub async fn reanalyze_from_source(&mut self, index: usize) -> AppResult<ReanalysisOutcome> {
        let existing = self.result_at(index)?;
        if !existing.has_source_images() {
            return Err(PreconditionError::NoSourceImages { index }.into());
        }
        let solution_set = self
            .active_solution_set
            .as_ref()
            .ok_or(PreconditionError::NoSolutionSet)?;

        let ctx = GradingCtx::at(index, &existing.student_name, &self.subject);
        info!("{} 🔄 正在基于原图重新分析...", ctx);

        let fresh = self
            .run_grading(
                solution_set,
                &existing.student_name,
                &existing.source_images,
                &ctx,
            )
            .await?;

        let outcome = ReanalysisOutcome::new(
            existing.final_score,
            fresh.final_score,
            self.settings.confirm_threshold,
        );
        info!(
            "{} ✓ 重新分析完成: {} → {} ({:+.2}，{})",
            ctx, outcome.previous_score, outcome.new_score, outcome.delta, outcome.verdict
        );

        self.results[index] = fresh;
        Ok(outcome)
    }

    // ========== 重置 ==========

    /// 清空暂存的页面和学生姓名，保留参考答案与结果
    pub fn reset_for_next_student(&mut self) {
        self.pending_images.clear();
        self.pending_student_name = None;
    }

    /// 回到没有参考答案的初始状态（保留学科）
    pub fn reset_session(&mut self) {
        self.active_solution_set = None;
        self.task_statement.clear();
        self.title.clear();
        self.results.clear();
        self.reset_for_next_student();
        info!("会话已重置");
    }

    // ========== 历史记录 ==========

    /// 生成不可变快照
    pub fn snapshot(&self) -> AppResult<SessionSnapshot> {
        let solution_set = self
            .active_solution_set
            .clone()
            .ok_or(PreconditionError::NoSolutionSet)?;
        let average_score = self.average_score().ok_or(PreconditionError::NoResults)?;

        Ok(SessionSnapshot {
            subject: self.subject.clone(),
            title: self.title.clone(),
            task_statement: self.task_statement.clone(),
            solution_set,
            results: self.results.clone(),
            student_count: self.results.len(),
            average_score,
        })
    }

    /// 从历史快照恢复，丢弃当前全部状态
    ///
    /// 旧记录可能不带原始图片，这些结果只能复核，不能重新分析。
    pub fn restore_snapshot(&mut self, snapshot: SessionSnapshot) {
        self.reset_for_next_student();
        self.subject = snapshot.subject;
        self.title = snapshot.title;
        self.task_statement = snapshot.task_statement;
        self.active_solution_set = Some(snapshot.solution_set);
        self.results = snapshot.results;
        info!(
            "[{}] 已从历史记录恢复 {} 名学生的结果",
            self.subject,
            self.results.len()
        );
    }

    /// 保存快照，返回历史记录 id
    pub async fn save_to_history<H: HistoryStore + ?Sized>(&self, store: &H) -> AppResult<String> {
        let snapshot = self.snapshot()?;
        let id = store.save(snapshot).await?;
        info!("💾 会话已保存到历史记录: {}", id);
        Ok(id)
    }

    // ========== 内部流程 ==========

    fn result_at(&self, index: usize) -> AppResult<&GradedSubmission> {
        self.results.get(index).ok_or_else(|| {
            PreconditionError::IndexOutOfRange {
                index,
                len: self.results.len(),
            }
            .into()
        })
    }

    /// 一次批改请求：发送全部页面，提取结果并附上原始图片
    async fn run_grading(
        &self,
        solution_set: &ExerciseSolutionSet,
        student_name: &str,
        images: &[ImageData],
        ctx: &GradingCtx,
    ) -> AppResult<GradedSubmission> {
        let prompt =
            prompts::grading_prompt(&self.subject, student_name, solution_set, images.len());
        let request =
            GenerationRequest::text(prompt, self.settings.grading).with_images(images.to_vec());

        let raw = self.service.generate(&request).await?;
        let Extracted {
            value: mut submission,
            repaired,
        } = extract_as_patched::<GradedSubmission, _>(&raw, |value| {
            pin_identity(value, student_name)
        })?;

        if repaired {
            warn!("{} 批改结果来自截断修复，请检查最后几题", ctx);
        }
        if !submission.is_score_consistent() {
            debug!(
                "{} 最终得分 {} 与各题得分之和 {} 不一致",
                ctx,
                submission.final_score,
                submission.summed_score()
            );
        }

        submission.source_images = images.to_vec();
        Ok(submission)
    }
}

/// 学生姓名以请求为准；原始图片只来自请求，不接受模型返回的内容
fn pin_identity(value: &mut JsonValue, student_name: &str) {
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "studentName".to_string(),
            JsonValue::String(student_name.to_string()),
        );
        obj.remove("sourceImages");
    }
}

/// 模型确认无误时忽略它附带的任何修正内容
fn drop_unless_changed(value: &mut JsonValue, payload_key: &str) {
    let changed = value.get("changed").and_then(JsonValue::as_bool);
    if changed == Some(false) {
        if let Some(obj) = value.as_object_mut() {
            obj.remove(payload_key);
        }
    }
}
