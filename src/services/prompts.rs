//! 提示词构建
//!
//! 每个函数只负责把业务数据拼成一段提示词，并约定模型输出的 JSON 格式。
//! 字段名必须与 `models` 中的 serde 命名保持一致。

use serde_json::Value as JsonValue;

use crate::models::{ExerciseSolutionSet, GradedSubmission};

fn pretty(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// 复核时提交给模型的批改记录，不带原始图片
fn submission_without_images(submission: &GradedSubmission) -> JsonValue {
    let mut value = serde_json::to_value(submission).unwrap_or(JsonValue::Null);
    if let Some(obj) = value.as_object_mut() {
        obj.remove("sourceImages");
    }
    value
}

fn notes_section(notes: Option<&str>, fallback: &str) -> String {
    match notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => format!("教师的具体意见：{}", n),
        None => fallback.to_string(),
    }
}

/// 生成参考答案
pub fn solution_prompt(subject: &str, statement: &str) -> String {
    format!(
        r#"你是一位高中{subject}教师。

题目：
{statement}

（如果附有图片，图片中是题目原文，请以图片内容为准。）

请为每道题给出简洁的参考解答，只返回如下格式的 JSON：
{{
  "exercises": [
    {{
      "number": "1",
      "title": "简短标题",
      "method": "关键解题步骤",
      "result": "最终结果",
      "maxScore": 3
    }}
  ],
  "totalMaxScore": 10
}}

要求：
- 简洁，避免冗长的解释
- 公式使用 LaTeX：$公式$
- 只返回 JSON，不要任何其他文字"#
    )
}

/// 复核参考答案
pub fn solution_review_prompt(
    subject: &str,
    statement: &str,
    solution_set: &ExerciseSolutionSet,
    notes: Option<&str>,
) -> String {
    format!(
        r#"你是一位{subject}专家。你之前为一份试卷生成了以下参考答案，现在需要核实它们是否正确。

题目：
{statement}

当前参考答案：
{solutions}

{notes}

步骤：
1. 逐题检查解题过程
2. 核对所有计算
3. 发现错误则修正
4. 返回（修正后或确认无误的）参考答案

只返回如下格式的 JSON：
{{
  "changed": true/false,
  "summary": "修改说明，或确认全部正确",
  "changeLog": ["修改 1", "修改 2"]（没有修改时为 []）,
  "correctedSolutionSet": {{ ...与原格式相同的完整参考答案... }}
}}"#,
        solutions = pretty(solution_set),
        notes = notes_section(notes, "请复核所有计算与解答。"),
    )
}

/// 批改学生作业
pub fn grading_prompt(
    subject: &str,
    student_name: &str,
    solution_set: &ExerciseSolutionSet,
    page_count: usize,
) -> String {
    let pages_hint = if page_count > 1 {
        format!(
            "注意：这份作业共 {} 页/张图片，请分析全部页面后整体批改。\n",
            page_count
        )
    } else {
        String::new()
    };

    format!(
        r#"你是一位经验丰富的高中{subject}教师，正在批改学生 {student_name} 的作业。
{pages_hint}
参考答案（作为评分依据）：
{solutions}

请分析学生作业图片，对每道题：
1. 转写学生写下的内容（未作答则为空字符串）
2. 与参考答案对比
3. 找出错误（概念、计算、步骤）
4. 给出分数，不得超过该题满分

评分标准：
- 满分：解答正确且论证完整
- 部分分：思路正确但有小错误
- 低分：有严重错误但包含部分正确内容
- 零分：未作答或完全错误

状态取值：correct / partial / incorrect / not_attempted
（当且仅当转写为空时使用 not_attempted）

只返回如下格式的 JSON：
{{
  "studentName": "{student_name}",
  "exercises": [
    {{
      "number": "1",
      "studentAnswerTranscript": "学生所写内容的转写",
      "analysis": "详细分析",
      "errors": ["错误 1"],
      "correctPoints": ["做得好的地方"],
      "score": 2.5,
      "maxScore": 3,
      "status": "partial"
    }}
  ],
  "finalScore": 7.5,
  "maxScore": 10,
  "generalAssessment": "总体评价",
  "suggestions": ["改进建议 1", "改进建议 2"]
}}"#,
        solutions = pretty(solution_set),
    )
}

/// 复核某名学生的批改结果
pub fn grading_review_prompt(
    subject: &str,
    solution_set: &ExerciseSolutionSet,
    submission: &GradedSubmission,
    notes: Option<&str>,
) -> String {
    format!(
        r#"你是一位{subject}专家。你批改了学生 "{student}" 的作业，现在需要复核这份批改。

参考答案：
{solutions}

对 {student} 的批改：
{grading}

{notes}

步骤：
1. 仔细检查批改内容
2. 核对各题分数是否合理
3. 发现错误则修正
4. 返回（修正后或确认无误的）批改结果

只返回如下格式的 JSON：
{{
  "changed": true/false,
  "summary": "修改说明，或确认批改无误",
  "changeLog": ["修改 1", "修改 2"]（没有修改时为 []）,
  "correctedSubmission": {{ ...与原格式相同的完整批改结果... }}
}}"#,
        student = submission.student_name,
        solutions = pretty(solution_set),
        grading = pretty(&submission_without_images(submission)),
        notes = notes_section(notes, "请复核所有分数与评价。"),
    )
}
