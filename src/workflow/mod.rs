pub mod grading_ctx;
pub mod outcome;
pub mod session;

pub use grading_ctx::GradingCtx;
pub use outcome::{ReanalysisOutcome, RevisionOutcome, ScoreVerdict};
pub use session::{GradingSession, SessionSettings, SessionState};
