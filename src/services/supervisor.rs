//! Conversation registry and event routing across game workers.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, GameProfile};
use crate::dao::game_store::GameStore;
use crate::dao::questions::QuestionProvider;
use crate::dto::update::{CallbackUpdate, Command, MessageUpdate};
use crate::error::GameError;
use crate::platform::directory::UserDirectory;
use crate::platform::messenger::Messenger;
use crate::services::game_logic::{GameLogic, InstanceEvent};
use crate::services::render;
use crate::services::timer::TimerController;
use crate::services::word_filter::WordFilter;
use crate::state::game::GameInstance;
use crate::state::stage::GameStage;

/// Routing handle for one live game worker.
struct InstanceHandle {
    game_id: Uuid,
    events: mpsc::UnboundedSender<InstanceEvent>,
}

/// One live game worker per conversation.
///
/// The supervisor routes every inbound update to the worker owning its
/// conversation, creates a worker when a game opens and forgets it once
/// the game reaches a terminal stage. Workers for different conversations
/// run in parallel; a single worker consumes its queue strictly in order,
/// so nothing else ever mutates that game.
pub struct GameSupervisor {
    registry: Arc<DashMap<i64, InstanceHandle>>,
    creation: Mutex<()>,
    profile: GameProfile,
    word_filter: WordFilter,
    store: Arc<dyn GameStore>,
    questions: Arc<dyn QuestionProvider>,
    messenger: Arc<dyn Messenger>,
    directory: Arc<dyn UserDirectory>,
}

impl GameSupervisor {
    /// Build a supervisor with no live games.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn GameStore>,
        questions: Arc<dyn QuestionProvider>,
        messenger: Arc<dyn Messenger>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            registry: Arc::new(DashMap::new()),
            creation: Mutex::new(()),
            profile: config.profile().clone(),
            word_filter: WordFilter::new(config.reaction_words()),
            store,
            questions,
            messenger,
            directory,
        }
    }

    /// Number of conversations with a live game.
    pub fn live_games(&self) -> usize {
        self.registry.len()
    }

    /// Route one chat message.
    ///
    /// A message can open a game: when the conversation has no live worker
    /// and the text carries the start command, an instance is created
    /// first. Any other message for a game-less conversation is dropped.
    pub async fn dispatch_message(&self, update: MessageUpdate) {
        if self.word_filter.matches(&update.text) {
            debug!(
                conversation_id = update.conversation_id,
                "reaction word found"
            );
            if let Err(err) = self
                .messenger
                .react(update.conversation_id, update.message_id)
                .await
            {
                warn!(
                    conversation_id = update.conversation_id,
                    error = %err,
                    "failed to react to message"
                );
            }
        }

        let conversation_id = update.conversation_id;
        let may_create = Command::parse(&update.text) == Some(Command::Start);
        self.route(conversation_id, InstanceEvent::Message(update), may_create)
            .await;
    }

    /// Route one button press. Button presses never open a game.
    pub async fn dispatch_callback(&self, update: CallbackUpdate) {
        let conversation_id = update.conversation_id;
        self.route(conversation_id, InstanceEvent::Callback(update), false)
            .await;
    }

    /// Reload every non-terminal game from the store and spawn its worker.
    ///
    /// Restored games get a full new deadline window for whatever stage
    /// they were in; the previous window died with the previous process.
    /// Returns the number of games brought back.
    pub async fn hydrate(&self) -> Result<usize, GameError> {
        let _creating = self.creation.lock().await;
        let games = self.store.load_active_games().await?;
        let mut restored = 0;

        for entity in games {
            let conversation_id = entity.conversation_id;
            if self.registry.contains_key(&conversation_id) {
                debug!(conversation_id, "conversation already has a live worker");
                continue;
            }
            let instance = GameInstance::from(entity);
            info!(
                conversation_id,
                game_id = %instance.id,
                stage = %instance.stage(),
                "restoring game"
            );
            let handle = self.spawn_worker(conversation_id, instance);
            self.registry.insert(conversation_id, handle);
            restored += 1;
        }

        Ok(restored)
    }

    async fn route(&self, conversation_id: i64, event: InstanceEvent, may_create: bool) {
        let mut event = event;
        if let Some(handle) = self.registry.get(&conversation_id) {
            match handle.events.send(event) {
                Ok(()) => return,
                // The worker retired between lookup and send; take the
                // event back and fall through.
                Err(mpsc::error::SendError(returned)) => event = returned,
            }
        }

        if !may_create {
            debug!(
                conversation_id,
                "dropping event for a conversation without a live game"
            );
            return;
        }

        if let Err(err) = self.open_game(conversation_id, event).await {
            warn!(conversation_id, error = %err, "could not open a game");
        }
    }

    /// Create the game document, spawn its worker and hand it the opening
    /// event.
    ///
    /// The slow calls (question pick, storage write) run before the
    /// creation lock is taken; the lock covers only the registry check and
    /// insert, so one stalling backend never delays other conversations.
    async fn open_game(&self, conversation_id: i64, event: InstanceEvent) -> Result<(), GameError> {
        let Some(question) = self.questions.pick_random().await else {
            if let Err(err) = self
                .messenger
                .broadcast(conversation_id, render::NO_QUESTIONS.to_string(), None)
                .await
            {
                warn!(conversation_id, error = %err, "failed to deliver the no-content notice");
            }
            return Err(GameError::NoQuestions);
        };

        let (instance, persisted) = match self
            .store
            .create_game(conversation_id, self.profile.clone(), question.clone())
            .await
        {
            Ok(entity) => (GameInstance::from(entity), true),
            Err(err) => {
                warn!(
                    conversation_id,
                    error = %err,
                    "failed to persist the new game, playing from memory"
                );
                (
                    GameInstance::new(conversation_id, self.profile.clone(), question),
                    false,
                )
            }
        };
        let game_id = instance.id;

        let creating = self.creation.lock().await;

        // A concurrent dispatch may have claimed the conversation while we
        // were building the game.
        let mut event = event;
        if let Some(handle) = self.registry.get(&conversation_id) {
            match handle.events.send(event) {
                Ok(()) => {
                    drop(handle);
                    drop(creating);
                    // Lost the race; retire the record written above so
                    // hydration never resurrects it.
                    if persisted {
                        if let Err(err) =
                            self.store.update_stage(game_id, GameStage::Canceled).await
                        {
                            warn!(
                                conversation_id,
                                game_id = %game_id,
                                error = %err,
                                "failed to retire a duplicate game record"
                            );
                        }
                    }
                    return Ok(());
                }
                // The occupant retired between lookup and send; take the
                // event back and claim the slot.
                Err(mpsc::error::SendError(returned)) => event = returned,
            }
        }

        info!(conversation_id, game_id = %game_id, "opening a game");
        let handle = self.spawn_worker(conversation_id, instance);
        if handle.events.send(event).is_err() {
            warn!(conversation_id, "fresh worker rejected its opening event");
        }
        self.registry.insert(conversation_id, handle);
        Ok(())
    }

    /// Spawn the task that owns one game and drains its queue.
    fn spawn_worker(&self, conversation_id: i64, instance: GameInstance) -> InstanceHandle {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let game_id = instance.id;
        let mut logic = GameLogic::new(
            instance,
            TimerController::new(events_tx.clone()),
            Arc::clone(&self.store),
            Arc::clone(&self.messenger),
            Arc::clone(&self.directory),
        );

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            logic.resume();
            while let Some(event) = events_rx.recv().await {
                logic.handle_event(event).await;
                if logic.stage().is_terminal() {
                    break;
                }
            }
            // Another worker may already own the conversation slot.
            registry.remove_if(&conversation_id, |_, handle| handle.game_id == game_id);
            debug!(conversation_id, game_id = %game_id, "worker retired");
        });

        InstanceHandle {
            game_id,
            events: events_tx,
        }
    }
}
