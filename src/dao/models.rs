use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::stage::GameStage;

/// Question definition embedded in a game document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Question text shown to the conversation.
    pub title: String,
    /// Answer board in authoring order.
    pub answers: Vec<AnswerEntity>,
}

/// Answer entry inside a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Position of the answer in the authored board.
    pub id: u32,
    /// Canonical answer text.
    pub title: String,
    /// Points awarded when this answer is opened.
    pub score: u32,
}

/// Game rules captured when the game was created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileEntity {
    /// Seconds the registration window stays open.
    pub registration_timeout_secs: u64,
    /// Seconds a respondent has to send an answer.
    pub answer_timeout_secs: u64,
    /// Smallest roster the game starts with.
    pub min_players: u32,
    /// Roster size that closes registration early.
    pub max_players: u32,
}

/// Participant row stored with the game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Platform user identifier.
    pub user_id: i64,
    /// Display name resolved at registration time.
    pub name: String,
}

/// Record of an answer opened by a player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimedAnswerEntity {
    /// Player who opened the answer.
    pub player_id: i64,
    /// Identifier of the opened answer within the question.
    pub answer_id: u32,
}

/// Aggregate game document persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Conversation the game belongs to.
    pub conversation_id: i64,
    /// Current lifecycle stage.
    pub stage: GameStage,
    /// User who opened the game, once known.
    pub admin_id: Option<i64>,
    /// Message id of the pinned roster, once pinned.
    pub pinned_message_id: Option<i64>,
    /// Player currently holding the answer turn.
    pub responding_player: Option<i64>,
    /// Rules the game runs under.
    pub profile: ProfileEntity,
    /// Question played in this game.
    pub question: QuestionEntity,
    /// Registered players in join order.
    pub players: Vec<PlayerEntity>,
    /// Answers opened so far with their openers.
    pub claimed_answers: Vec<ClaimedAnswerEntity>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game document was updated.
    pub updated_at: SystemTime,
}

impl GameEntity {
    /// Build a fresh document in [`GameStage::WaitInit`] with an empty roster.
    pub fn new(conversation_id: i64, profile: ProfileEntity, question: QuestionEntity) -> Self {
        let timestamp = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            stage: GameStage::WaitInit,
            admin_id: None,
            pinned_message_id: None,
            responding_player: None,
            profile,
            question,
            players: Vec::new(),
            claimed_answers: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

/// One scoreboard line aggregated by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreRow {
    /// Platform user identifier of the scorer.
    pub player_id: i64,
    /// Display name recorded at registration time.
    pub name: String,
    /// Sum of the scores of every answer this player opened.
    pub total: u32,
}
