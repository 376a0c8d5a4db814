use indexmap::IndexMap;
use uuid::Uuid;

use crate::config::GameProfile;
use crate::dao::models::{
    AnswerEntity, GameEntity, PlayerEntity, ProfileEntity, QuestionEntity,
};
use crate::state::stage::GameStage;

/// Case-folded lookup key used for answer matching.
///
/// Matching ignores case and surrounding whitespace; the canonical title is
/// kept on the [`Answer`] itself.
pub fn answer_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// One answer on the question board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Position of the answer in the authored board.
    pub id: u32,
    /// Canonical answer text, shown once the answer is opened.
    pub title: String,
    /// Points awarded for opening this answer.
    pub score: u32,
}

/// A question together with its full answer board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Stable identifier of the question.
    pub id: Uuid,
    /// Question text shown to the conversation.
    pub title: String,
    /// Answer board in authoring order.
    pub answers: Vec<Answer>,
}

/// Participant registered in one game instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Platform user identifier.
    pub user_id: i64,
    /// Display name resolved at registration time.
    pub name: String,
}

/// Mutable state of one running game, exclusively owned by its worker.
#[derive(Debug, Clone)]
pub struct GameInstance {
    /// Primary key of the game.
    pub id: Uuid,
    /// Conversation this game belongs to.
    pub conversation_id: i64,
    /// User who opened the game, recorded when the game starts.
    pub admin_id: Option<i64>,
    /// Message id of the pinned roster, once pinned.
    pub pinned_message_id: Option<i64>,
    /// Player currently holding the answer turn.
    pub responding_player: Option<i64>,
    /// Rules this game runs under.
    pub profile: GameProfile,
    /// The question being played.
    pub question: Question,
    remaining: IndexMap<String, Answer>,
    players: IndexMap<i64, Player>,
    stage: GameStage,
}

impl GameInstance {
    /// Build a fresh instance in [`GameStage::WaitInit`] with the full board open.
    pub fn new(conversation_id: i64, profile: GameProfile, question: Question) -> Self {
        let remaining = question
            .answers
            .iter()
            .map(|answer| (answer_key(&answer.title), answer.clone()))
            .collect();

        Self {
            id: Uuid::new_v4(),
            conversation_id,
            admin_id: None,
            pinned_message_id: None,
            responding_player: None,
            profile,
            question,
            remaining,
            players: IndexMap::new(),
            stage: GameStage::WaitInit,
        }
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> GameStage {
        self.stage
    }

    /// Move the instance to `stage`.
    pub fn set_stage(&mut self, stage: GameStage) {
        self.stage = stage;
    }

    /// Registered players in join order.
    pub fn players(&self) -> &IndexMap<i64, Player> {
        &self.players
    }

    /// Number of registered players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Whether `user_id` is on the roster.
    pub fn is_registered(&self, user_id: i64) -> bool {
        self.players.contains_key(&user_id)
    }

    /// Add a player to the roster. Returns `false` when already registered.
    pub fn register(&mut self, player: Player) -> bool {
        if self.players.contains_key(&player.user_id) {
            return false;
        }
        self.players.insert(player.user_id, player);
        true
    }

    /// Remove a player, preserving the join order of the rest.
    pub fn unregister(&mut self, user_id: i64) -> Option<Player> {
        self.players.shift_remove(&user_id)
    }

    /// Match `text` against the open answers, removing the hit from the board.
    pub fn take_answer(&mut self, text: &str) -> Option<Answer> {
        self.remaining.shift_remove(&answer_key(text))
    }

    /// Whether every answer has been opened.
    pub fn answers_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Iterate the board in authoring order, flagging answers already opened.
    pub fn board(&self) -> impl Iterator<Item = (&Answer, bool)> {
        self.question
            .answers
            .iter()
            .map(|answer| (answer, !self.remaining.contains_key(&answer_key(&answer.title))))
    }
}

impl From<AnswerEntity> for Answer {
    fn from(value: AnswerEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            score: value.score,
        }
    }
}

impl From<Answer> for AnswerEntity {
    fn from(value: Answer) -> Self {
        Self {
            id: value.id,
            title: value.title,
            score: value.score,
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            answers: value.answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Question> for QuestionEntity {
    fn from(value: Question) -> Self {
        Self {
            id: value.id,
            title: value.title,
            answers: value.answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            user_id: value.user_id,
            name: value.name,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            user_id: value.user_id,
            name: value.name,
        }
    }
}

impl From<ProfileEntity> for GameProfile {
    fn from(value: ProfileEntity) -> Self {
        Self {
            registration_timeout_secs: value.registration_timeout_secs,
            answer_timeout_secs: value.answer_timeout_secs,
            min_players: value.min_players,
            max_players: value.max_players,
        }
    }
}

impl From<GameProfile> for ProfileEntity {
    fn from(value: GameProfile) -> Self {
        Self {
            registration_timeout_secs: value.registration_timeout_secs,
            answer_timeout_secs: value.answer_timeout_secs,
            min_players: value.min_players,
            max_players: value.max_players,
        }
    }
}

impl From<GameEntity> for GameInstance {
    fn from(entity: GameEntity) -> Self {
        let question: Question = entity.question.into();
        let claimed: Vec<u32> = entity
            .claimed_answers
            .iter()
            .map(|claim| claim.answer_id)
            .collect();
        let remaining = question
            .answers
            .iter()
            .filter(|answer| !claimed.contains(&answer.id))
            .map(|answer| (answer_key(&answer.title), answer.clone()))
            .collect();
        let players = entity
            .players
            .into_iter()
            .map(|player| (player.user_id, player.into()))
            .collect();

        Self {
            id: entity.id,
            conversation_id: entity.conversation_id,
            admin_id: entity.admin_id,
            pinned_message_id: entity.pinned_message_id,
            responding_player: entity.responding_player,
            profile: entity.profile.into(),
            question,
            remaining,
            players,
            stage: entity.stage,
        }
    }
}
