#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use exam_grader::error::ServiceError;
use exam_grader::models::ImageData;
use exam_grader::services::{GenerationRequest, GenerativeService};
use exam_grader::workflow::{GradingSession, SessionSettings};
use futures::future::BoxFuture;
use serde_json::json;

/// 按顺序回放预设响应，并记录收到的请求
#[derive(Default)]
pub struct ScriptedService {
    responses: Mutex<VecDeque<Result<String, ServiceError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_ok(&self, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
    }

    pub fn push_err(&self, err: ServiceError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> GenerationRequest {
        self.requests.lock().unwrap().last().cloned().expect("没有请求")
    }
}

impl GenerativeService for ScriptedService {
    fn model_name(&self) -> &str {
        "scripted"
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, Result<String, ServiceError>> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ServiceError::TransportFailure {
                    status: None,
                    message: "没有更多预设响应".to_string(),
                })
            });
        Box::pin(async move { next })
    }
}

pub fn new_session(service: &Arc<ScriptedService>) -> GradingSession<Arc<ScriptedService>> {
    GradingSession::new(Arc::clone(service), SessionSettings::default())
}

pub fn page(tag: &str) -> ImageData {
    ImageData::jpeg(format!("PAGE-{}", tag))
}

/// 两道题，满分 10
pub fn solution_json() -> String {
    json!({
        "exercises": [
            {"number": "1", "title": "一次方程", "method": "移项", "result": "x = 1", "maxScore": 4},
            {"number": "2a", "title": "导数", "method": "求导", "result": "f'(x) = 2x", "maxScore": 6}
        ],
        "totalMaxScore": 10
    })
    .to_string()
}

/// 批改结果：第 1 题得分 `first`，第 2 题得分 `second`
pub fn grading_json(name: &str, first: f64, second: f64) -> String {
    json!({
        "studentName": name,
        "exercises": [
            {
                "number": "1",
                "studentAnswerTranscript": "x = 1",
                "analysis": "正确",
                "errors": [],
                "correctPoints": ["移项正确"],
                "score": first,
                "maxScore": 4,
                "status": "correct"
            },
            {
                "number": "2a",
                "studentAnswerTranscript": "f'(x) = x",
                "analysis": "系数错误",
                "errors": ["漏掉系数 2"],
                "score": second,
                "maxScore": 6,
                "status": "partial"
            }
        ],
        "finalScore": first + second,
        "maxScore": 10,
        "generalAssessment": "整体不错",
        "suggestions": ["复习求导法则"]
    })
    .to_string()
}

/// 已生成参考答案的会话
pub async fn drafted_session(
    service: &Arc<ScriptedService>,
) -> GradingSession<Arc<ScriptedService>> {
    let mut session = new_session(service);
    service.push_ok(solution_json());
    session
        .draft_solution_set("1) x + 1 = 2\n2a) 求 x^2 的导数", None, "数学", None)
        .await
        .expect("生成参考答案失败");
    session
}
