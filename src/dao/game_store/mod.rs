pub mod memory;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::config::GameProfile;
use crate::dao::models::{GameEntity, ScoreRow};
use crate::dao::storage::StorageResult;
use crate::state::game::{Player, Question};
use crate::state::stage::GameStage;

/// Outcome of persisting a player registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPlayerOutcome {
    /// The player row was inserted.
    Added,
    /// A row for this player already existed; nothing was written.
    AlreadyRegistered,
}

/// Abstraction over the persistence layer for game documents.
///
/// Writes are incremental: the engine never re-saves a whole game, it records
/// each stage change, roster change and opened answer as it happens.
pub trait GameStore: Send + Sync {
    fn create_game(
        &self,
        conversation_id: i64,
        profile: GameProfile,
        question: Question,
    ) -> BoxFuture<'static, StorageResult<GameEntity>>;
    fn update_stage(&self, game_id: Uuid, stage: GameStage)
    -> BoxFuture<'static, StorageResult<()>>;
    fn add_player(
        &self,
        game_id: Uuid,
        player: Player,
    ) -> BoxFuture<'static, StorageResult<AddPlayerOutcome>>;
    fn remove_player(&self, game_id: Uuid, user_id: i64) -> BoxFuture<'static, StorageResult<()>>;
    fn record_answer(
        &self,
        game_id: Uuid,
        player_id: i64,
        answer_id: u32,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn scoreboard(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreRow>>>;
    fn load_active_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn set_pinned_message(
        &self,
        game_id: Uuid,
        message_id: Option<i64>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn set_responding_player(
        &self,
        game_id: Uuid,
        player_id: Option<i64>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn set_admin(&self, game_id: Uuid, admin_id: i64) -> BoxFuture<'static, StorageResult<()>>;
}
