use futures::future::BoxFuture;
use thiserror::Error;

use crate::state::game::Question;

/// Source of playable questions for new games.
pub trait QuestionProvider: Send + Sync {
    /// Pick a random playable question, `None` when no content is loaded.
    fn pick_random(&self) -> BoxFuture<'static, Option<Question>>;
}

/// Error raised when question content fails validation at seeding time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestionError {
    /// A playable board needs at least two answers.
    #[error("a playable question needs at least 2 answers, got {0}")]
    TooFewAnswers(usize),
    /// Two answers collapse to the same case-folded key.
    #[error("duplicate answer title `{0}` after case folding")]
    DuplicateTitle(String),
    /// Every answer must be worth at least one point.
    #[error("answer `{0}` has a zero score")]
    ZeroScore(String),
    /// The board must distribute exactly 100 points.
    #[error("answer scores must sum to 100, got {0}")]
    ScoreSum(u32),
}
