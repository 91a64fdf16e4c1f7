use anyhow::Result;
/// 日志工具模块
///
/// 提供批量批改时的日志格式化和输出辅助函数
use std::fs;
use tracing::info;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `title`: 本次批改的试卷标题
pub fn init_log_file(log_file_path: &str, title: &str) -> Result<()> {
    let log_header = format!(
        "{}\n批改日志 - {} - {}\n{}\n\n",
        "=".repeat(60),
        title,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `model_name`: 使用的模型
/// - `student_count`: 待批改学生数
pub fn log_startup(model_name: &str, student_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量批改模式");
    info!("🤖 模型: {}", model_name);
    info!("👥 待批改学生: {}", student_count);
    info!("{}", "=".repeat(60));
}

/// 记录单名学生开始批改
pub fn log_student_start(position: usize, total: usize, student_name: &str, pages: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "📄 [{}/{}] 学生 {} ({} 页)",
        position, total, student_name, pages
    );
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `average_score`: 平均分（没有成功批改时为 None）
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    success: usize,
    failed: usize,
    total: usize,
    average_score: Option<f64>,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部批改完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    if let Some(avg) = average_score {
        info!("📈 平均分: {:.2}", avg);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
