use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use futures::future::BoxFuture;
use rand::seq::IndexedRandom;
use uuid::Uuid;

use crate::config::GameProfile;
use crate::dao::game_store::{AddPlayerOutcome, GameStore};
use crate::dao::models::{ClaimedAnswerEntity, GameEntity, ScoreRow};
use crate::dao::questions::{QuestionError, QuestionProvider};
use crate::dao::storage::{StorageError, StorageResult};
use crate::state::game::{Player, Question, answer_key};
use crate::state::stage::GameStage;

/// In-memory storage backend used by tests and embedders without a database.
///
/// Doubles as a [`QuestionProvider`] over the questions seeded through
/// [`MemoryStore::add_question`].
#[derive(Default)]
pub struct MemoryStore {
    games: Arc<DashMap<Uuid, GameEntity>>,
    questions: Arc<DashMap<Uuid, Question>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and seed one question, returning its id.
    pub fn add_question(&self, question: Question) -> Result<Uuid, QuestionError> {
        validate_question(&question)?;
        let id = question.id;
        self.questions.insert(id, question);
        Ok(id)
    }
}

/// Content rules enforced at seeding time; the engine never re-validates mid-game.
fn validate_question(question: &Question) -> Result<(), QuestionError> {
    if question.answers.len() < 2 {
        return Err(QuestionError::TooFewAnswers(question.answers.len()));
    }

    let mut seen = HashSet::new();
    let mut sum: u32 = 0;
    for answer in &question.answers {
        if answer.score == 0 {
            return Err(QuestionError::ZeroScore(answer.title.clone()));
        }
        if !seen.insert(answer_key(&answer.title)) {
            return Err(QuestionError::DuplicateTitle(answer.title.clone()));
        }
        // Saturate so absurd scores cannot wrap back onto 100.
        sum = sum.saturating_add(answer.score);
    }

    if sum != 100 {
        return Err(QuestionError::ScoreSum(sum));
    }

    Ok(())
}

fn missing_game(game_id: Uuid) -> StorageError {
    StorageError::not_found(format!("game `{game_id}`"))
}

impl GameStore for MemoryStore {
    fn create_game(
        &self,
        conversation_id: i64,
        profile: GameProfile,
        question: Question,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let entity = GameEntity::new(conversation_id, profile.into(), question.into());
            games.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn update_stage(
        &self,
        game_id: Uuid,
        stage: GameStage,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut game = games.get_mut(&game_id).ok_or_else(|| missing_game(game_id))?;
            game.stage = stage;
            game.updated_at = SystemTime::now();
            Ok(())
        })
    }

    fn add_player(
        &self,
        game_id: Uuid,
        player: Player,
    ) -> BoxFuture<'static, StorageResult<AddPlayerOutcome>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut game = games.get_mut(&game_id).ok_or_else(|| missing_game(game_id))?;
            if game
                .players
                .iter()
                .any(|existing| existing.user_id == player.user_id)
            {
                return Ok(AddPlayerOutcome::AlreadyRegistered);
            }
            game.players.push(player.into());
            game.updated_at = SystemTime::now();
            Ok(AddPlayerOutcome::Added)
        })
    }

    fn remove_player(&self, game_id: Uuid, user_id: i64) -> BoxFuture<'static, StorageResult<()>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut game = games.get_mut(&game_id).ok_or_else(|| missing_game(game_id))?;
            game.players.retain(|player| player.user_id != user_id);
            game.updated_at = SystemTime::now();
            Ok(())
        })
    }

    fn record_answer(
        &self,
        game_id: Uuid,
        player_id: i64,
        answer_id: u32,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut game = games.get_mut(&game_id).ok_or_else(|| missing_game(game_id))?;
            if !game.question.answers.iter().any(|a| a.id == answer_id) {
                return Err(StorageError::not_found(format!(
                    "answer `{answer_id}` in game `{game_id}`"
                )));
            }
            if game.claimed_answers.iter().any(|c| c.answer_id == answer_id) {
                return Err(StorageError::conflict(format!(
                    "answer `{answer_id}` already recorded for game `{game_id}`"
                )));
            }
            game.claimed_answers.push(ClaimedAnswerEntity {
                player_id,
                answer_id,
            });
            game.updated_at = SystemTime::now();
            Ok(())
        })
    }

    fn scoreboard(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreRow>>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let game = games.get(&game_id).ok_or_else(|| missing_game(game_id))?;
            let mut rows: Vec<ScoreRow> = game
                .players
                .iter()
                .filter_map(|player| {
                    let total: u32 = game
                        .claimed_answers
                        .iter()
                        .filter(|claim| claim.player_id == player.user_id)
                        .filter_map(|claim| {
                            game.question
                                .answers
                                .iter()
                                .find(|answer| answer.id == claim.answer_id)
                        })
                        .map(|answer| answer.score)
                        .sum();
                    (total > 0).then(|| ScoreRow {
                        player_id: player.user_id,
                        name: player.name.clone(),
                        total,
                    })
                })
                .collect();
            // stable sort keeps roster order between equal totals
            rows.sort_by(|a, b| b.total.cmp(&a.total));
            Ok(rows)
        })
    }

    fn load_active_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            Ok(games
                .iter()
                .filter(|entry| !entry.value().stage.is_terminal())
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn set_pinned_message(
        &self,
        game_id: Uuid,
        message_id: Option<i64>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut game = games.get_mut(&game_id).ok_or_else(|| missing_game(game_id))?;
            game.pinned_message_id = message_id;
            game.updated_at = SystemTime::now();
            Ok(())
        })
    }

    fn set_responding_player(
        &self,
        game_id: Uuid,
        player_id: Option<i64>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut game = games.get_mut(&game_id).ok_or_else(|| missing_game(game_id))?;
            game.responding_player = player_id;
            game.updated_at = SystemTime::now();
            Ok(())
        })
    }

    fn set_admin(&self, game_id: Uuid, admin_id: i64) -> BoxFuture<'static, StorageResult<()>> {
        let games = Arc::clone(&self.games);
        Box::pin(async move {
            let mut game = games.get_mut(&game_id).ok_or_else(|| missing_game(game_id))?;
            game.admin_id = Some(admin_id);
            game.updated_at = SystemTime::now();
            Ok(())
        })
    }
}

impl QuestionProvider for MemoryStore {
    fn pick_random(&self) -> BoxFuture<'static, Option<Question>> {
        let questions = Arc::clone(&self.questions);
        Box::pin(async move {
            let all: Vec<Question> = questions.iter().map(|entry| entry.value().clone()).collect();
            all.choose(&mut rand::rng()).cloned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::Answer;

    fn question() -> Question {
        Question {
            id: Uuid::new_v4(),
            title: "Name something you plug in".into(),
            answers: vec![
                Answer {
                    id: 1,
                    title: "Kettle".into(),
                    score: 43,
                },
                Answer {
                    id: 2,
                    title: "Lamp".into(),
                    score: 15,
                },
                Answer {
                    id: 3,
                    title: "Phone".into(),
                    score: 27,
                },
                Answer {
                    id: 4,
                    title: "Router".into(),
                    score: 15,
                },
            ],
        }
    }

    fn player(user_id: i64, name: &str) -> Player {
        Player {
            user_id,
            name: name.into(),
        }
    }

    #[test]
    fn question_validation_enforces_content_rules() {
        let store = MemoryStore::new();

        let mut one_answer = question();
        one_answer.answers.truncate(1);
        assert_eq!(
            store.add_question(one_answer),
            Err(QuestionError::TooFewAnswers(1))
        );

        let mut folded_duplicate = question();
        folded_duplicate.answers[3].title = " KETTLE ".into();
        assert!(matches!(
            store.add_question(folded_duplicate),
            Err(QuestionError::DuplicateTitle(_))
        ));

        let mut zero_score = question();
        zero_score.answers[1].score = 0;
        assert!(matches!(
            store.add_question(zero_score),
            Err(QuestionError::ZeroScore(_))
        ));

        let mut bad_sum = question();
        bad_sum.answers[0].score = 50;
        assert_eq!(store.add_question(bad_sum), Err(QuestionError::ScoreSum(107)));

        // Would wrap to exactly 100 if the sum were unchecked.
        let mut wrapping_sum = question();
        wrapping_sum.answers[0].score = u32::MAX;
        wrapping_sum.answers[1].score = 59;
        assert_eq!(
            store.add_question(wrapping_sum),
            Err(QuestionError::ScoreSum(u32::MAX))
        );

        assert!(store.add_question(question()).is_ok());
    }

    #[tokio::test]
    async fn pick_random_is_none_without_content() {
        let store = MemoryStore::new();
        assert!(store.pick_random().await.is_none());
        store.add_question(question()).unwrap();
        assert!(store.pick_random().await.is_some());
    }

    #[tokio::test]
    async fn add_player_reports_duplicates_without_writing() {
        let store = MemoryStore::new();
        let game = store
            .create_game(10, GameProfile::default(), question())
            .await
            .unwrap();

        let first = store.add_player(game.id, player(42, "Ann")).await.unwrap();
        assert_eq!(first, AddPlayerOutcome::Added);

        let second = store.add_player(game.id, player(42, "Ann again")).await.unwrap();
        assert_eq!(second, AddPlayerOutcome::AlreadyRegistered);

        let games = store.load_active_games().await.unwrap();
        assert_eq!(games[0].players.len(), 1);
        assert_eq!(games[0].players[0].name, "Ann");
    }

    #[tokio::test]
    async fn scoreboard_sums_claims_and_orders_descending() {
        let store = MemoryStore::new();
        let game = store
            .create_game(10, GameProfile::default(), question())
            .await
            .unwrap();
        store.add_player(game.id, player(1, "P1")).await.unwrap();
        store.add_player(game.id, player(2, "P2")).await.unwrap();
        store.add_player(game.id, player(3, "Silent")).await.unwrap();

        store.record_answer(game.id, 1, 1).await.unwrap(); // 43
        store.record_answer(game.id, 2, 3).await.unwrap(); // 27
        store.record_answer(game.id, 1, 2).await.unwrap(); // 15

        let rows = store.scoreboard(game.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "P1");
        assert_eq!(rows[0].total, 58);
        assert_eq!(rows[1].name, "P2");
        assert_eq!(rows[1].total, 27);
    }

    #[tokio::test]
    async fn record_answer_rejects_double_claims() {
        let store = MemoryStore::new();
        let game = store
            .create_game(10, GameProfile::default(), question())
            .await
            .unwrap();
        store.record_answer(game.id, 1, 1).await.unwrap();
        assert!(matches!(
            store.record_answer(game.id, 2, 1).await,
            Err(StorageError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn load_active_games_skips_terminal_stages() {
        let store = MemoryStore::new();
        let live = store
            .create_game(10, GameProfile::default(), question())
            .await
            .unwrap();
        let finished = store
            .create_game(11, GameProfile::default(), question())
            .await
            .unwrap();
        store
            .update_stage(finished.id, GameStage::Finished)
            .await
            .unwrap();

        let games = store.load_active_games().await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, live.id);
    }
}
