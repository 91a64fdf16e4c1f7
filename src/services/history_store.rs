//! 历史记录存储 - 业务能力层
//!
//! 只负责"保存/读取会话快照"能力，不关心批改流程。
//! 快照一经保存即不可变，存储层对会话状态机一无所知。

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{HistoryRecord, SessionSnapshot};

/// 备份文件格式
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportPayload<'a> {
    records: &'a [HistoryRecord],
    export_date: String,
}

/// 历史记录存储
///
/// 后端只需实现整表读写 `load_all` / `store_all`，
/// 其余操作都建立在这两者之上。记录按创建时间倒序排列（最新在前）。
pub trait HistoryStore: Send + Sync {
    /// 读取全部记录
    fn load_all(&self) -> BoxFuture<'_, AppResult<Vec<HistoryRecord>>>;

    /// 用给定记录整体替换存储内容
    fn store_all(&self, records: Vec<HistoryRecord>) -> BoxFuture<'_, AppResult<()>>;

    /// 保存快照，返回新分配的 id
    fn save(&self, snapshot: SessionSnapshot) -> BoxFuture<'_, AppResult<String>> {
        Box::pin(async move {
            let mut records = self.load_all().await?;
            let record = HistoryRecord {
                id: Uuid::new_v4().to_string(),
                created_at: Utc::now(),
                snapshot,
            };
            let id = record.id.clone();
            records.insert(0, record);
            self.store_all(records).await?;
            debug!("历史记录已保存: {}", id);
            Ok(id)
        })
    }

    fn list(&self) -> BoxFuture<'_, AppResult<Vec<HistoryRecord>>> {
        self.load_all()
    }

    fn get_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, AppResult<Option<HistoryRecord>>> {
        Box::pin(async move {
            let records = self.load_all().await?;
            Ok(records.into_iter().find(|r| r.id == id))
        })
    }

    /// 删除记录；id 不存在时什么也不做
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, AppResult<()>> {
        Box::pin(async move {
            let records = self.load_all().await?;
            let before = records.len();
            let kept: Vec<HistoryRecord> = records.into_iter().filter(|r| r.id != id).collect();
            if kept.len() != before {
                self.store_all(kept).await?;
                debug!("历史记录已删除: {}", id);
            }
            Ok(())
        })
    }

    /// 按学科（精确匹配）和创建日期（UTC，按天）过滤，`None` 表示不过滤
    fn filter<'a>(
        &'a self,
        subject: Option<&'a str>,
        date: Option<NaiveDate>,
    ) -> BoxFuture<'a, AppResult<Vec<HistoryRecord>>> {
        Box::pin(async move {
            let records = self.load_all().await?;
            Ok(records
                .into_iter()
                .filter(|r| subject.map_or(true, |s| r.snapshot.subject == s))
                .filter(|r| date.map_or(true, |d| r.created_on() == d))
                .collect())
        })
    }

    /// 导出全部记录为 JSON 备份
    fn export_all(&self) -> BoxFuture<'_, AppResult<String>> {
        Box::pin(async move {
            let records = self.load_all().await?;
            let payload = ExportPayload {
                records: &records,
                export_date: Utc::now().to_rfc3339(),
            };
            serde_json::to_string_pretty(&payload)
                .map_err(|e| AppError::Other(format!("导出历史记录失败: {}", e)))
        })
    }

    /// 从备份导入，整体替换现有记录，返回导入条数
    ///
    /// 备份中没有 `records` 数组时不做任何修改，返回 0。
    fn import_all<'a>(&'a self, json: &'a str) -> BoxFuture<'a, AppResult<usize>> {
        Box::pin(async move {
            let mut payload: JsonValue =
                serde_json::from_str(json).map_err(AppError::history_corrupted)?;
            let records = match payload.get_mut("records") {
                Some(value @ JsonValue::Array(_)) => value.take(),
                _ => return Ok(0),
            };
            let records: Vec<HistoryRecord> =
                serde_json::from_value(records).map_err(AppError::history_corrupted)?;
            let count = records.len();
            self.store_all(records).await?;
            info!("已导入 {} 条历史记录", count);
            Ok(count)
        })
    }
}

/// 进程内存储
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Vec<HistoryRecord>>> {
        self.records
            .lock()
            .map_err(|e| AppError::Other(format!("历史记录锁已损坏: {}", e)))
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load_all(&self) -> BoxFuture<'_, AppResult<Vec<HistoryRecord>>> {
        let result = self.lock().map(|records| records.clone());
        Box::pin(async move { result })
    }

    fn store_all(&self, records: Vec<HistoryRecord>) -> BoxFuture<'_, AppResult<()>> {
        let result = self.lock().map(|mut guard| *guard = records);
        Box::pin(async move { result })
    }
}

/// JSON 文件存储
///
/// 每次操作都整体读写文件，并发写入时后写者覆盖先写者。
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    /// 使用默认路径 `history.json`
    pub fn new() -> Self {
        Self::with_path("history.json")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> AppResult<Vec<HistoryRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            // 文件不存在视为空历史
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::history_read_failed(self.path.display().to_string(), e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(AppError::history_corrupted)
    }

    async fn write(&self, records: Vec<HistoryRecord>) -> AppResult<()> {
        let display = self.path.display().to_string();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::history_write_failed(display.clone(), e))?;
        }
        let content = serde_json::to_string_pretty(&records)
            .map_err(|e| AppError::Other(format!("序列化历史记录失败: {}", e)))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::history_write_failed(display, e))?;
        debug!("历史文件已写入: {} 条记录", records.len());
        Ok(())
    }
}

impl Default for JsonFileHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn load_all(&self) -> BoxFuture<'_, AppResult<Vec<HistoryRecord>>> {
        Box::pin(self.read())
    }

    fn store_all(&self, records: Vec<HistoryRecord>) -> BoxFuture<'_, AppResult<()>> {
        Box::pin(self.write(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HistoryError;
    use crate::models::{ExerciseSolution, ExerciseSolutionSet};

    fn snapshot(subject: &str) -> SessionSnapshot {
        SessionSnapshot {
            subject: subject.to_string(),
            title: format!("{} exam", subject),
            task_statement: "1) x + 1 = 2".to_string(),
            solution_set: ExerciseSolutionSet {
                exercises: vec![ExerciseSolution {
                    number: "1".to_string(),
                    title: "方程".to_string(),
                    method: "移项".to_string(),
                    result: "x = 1".to_string(),
                    max_score: 10.0,
                }],
                total_max_score: 10.0,
            },
            results: Vec::new(),
            student_count: 0,
            average_score: 0.0,
        }
    }

    #[tokio::test]
    async fn test_save_list_newest_first() {
        let store = MemoryHistoryStore::new();
        let first = store.save(snapshot("math")).await.unwrap();
        let second = store.save(snapshot("physics")).await.unwrap();
        assert_ne!(first, second);

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second);
        assert_eq!(records[1].id, first);
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let store = MemoryHistoryStore::new();
        let id = store.save(snapshot("math")).await.unwrap();

        assert!(store.get_by_id(&id).await.unwrap().is_some());
        assert!(store.get_by_id("missing").await.unwrap().is_none());

        store.delete("missing").await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);

        store.delete(&id).await.unwrap();
        assert!(store.get_by_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filter_by_subject_and_date() {
        let store = MemoryHistoryStore::new();
        store.save(snapshot("math")).await.unwrap();
        store.save(snapshot("physics")).await.unwrap();
        store.save(snapshot("math")).await.unwrap();

        let today = Utc::now().date_naive();
        assert_eq!(store.filter(Some("math"), None).await.unwrap().len(), 2);
        assert_eq!(store.filter(None, None).await.unwrap().len(), 3);
        assert_eq!(store.filter(Some("physics"), Some(today)).await.unwrap().len(), 1);

        let long_ago = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        assert!(store.filter(None, Some(long_ago)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_then_import_replaces_records() {
        let source = MemoryHistoryStore::new();
        source.save(snapshot("math")).await.unwrap();
        source.save(snapshot("physics")).await.unwrap();
        let backup = source.export_all().await.unwrap();
        assert!(backup.contains("\"exportDate\""));

        let target = MemoryHistoryStore::new();
        target.save(snapshot("chemistry")).await.unwrap();
        assert_eq!(target.import_all(&backup).await.unwrap(), 2);
        assert_eq!(target.list().await.unwrap(), source.list().await.unwrap());
    }

    #[tokio::test]
    async fn test_import_without_records_is_noop() {
        let store = MemoryHistoryStore::new();
        store.save(snapshot("math")).await.unwrap();
        assert_eq!(store.import_all(r#"{"exportDate": "x"}"#).await.unwrap(), 0);
        assert_eq!(store.list().await.unwrap().len(), 1);

        let err = store.import_all("not json").await.unwrap_err();
        assert!(matches!(err, AppError::History(HistoryError::Corrupted { .. })));
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("exam_grader_{}", Uuid::new_v4()))
            .join("history.json");
        let store = JsonFileHistoryStore::with_path(&path);

        // 文件不存在时为空
        assert!(store.list().await.unwrap().is_empty());

        let id = store.save(snapshot("math")).await.unwrap();
        let reopened = JsonFileHistoryStore::with_path(&path);
        assert_eq!(reopened.path(), path.as_path());
        let record = reopened.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(record.snapshot.subject, "math");

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[tokio::test]
    async fn test_file_store_corrupted() {
        let path = std::env::temp_dir().join(format!("exam_grader_{}.json", Uuid::new_v4()));
        std::fs::write(&path, "[{broken").unwrap();
        let store = JsonFileHistoryStore::with_path(&path);
        assert!(matches!(
            store.list().await,
            Err(AppError::History(HistoryError::Corrupted { .. }))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_file_store_write_failure_reports_path() {
        // 父目录位置上是一个普通文件，无法创建目录
        let blocker = std::env::temp_dir().join(format!("exam_grader_{}", Uuid::new_v4()));
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("history.json");
        let store = JsonFileHistoryStore::with_path(&path);

        match store.save(snapshot("math")).await {
            Err(AppError::History(HistoryError::WriteFailed { path: reported, .. })) => {
                assert_eq!(reported, path.display().to_string());
            }
            other => panic!("应该是写入失败: {:?}", other.map(|_| ())),
        }
        let _ = std::fs::remove_file(&blocker);
    }
}
