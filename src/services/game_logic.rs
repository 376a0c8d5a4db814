//! The game engine for a single conversation.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dao::game_store::{AddPlayerOutcome, GameStore};
use crate::dao::storage::StorageError;
use crate::dto::keyboard::{Keyboard, KeyboardError};
use crate::dto::update::{CallbackAction, CallbackUpdate, Command, MessageUpdate};
use crate::platform::directory::UserDirectory;
use crate::platform::messenger::Messenger;
use crate::services::render;
use crate::services::timer::{TimerController, TimerKind};
use crate::state::game::{GameInstance, Player};
use crate::state::stage::GameStage;

/// One unit of work on an instance queue.
///
/// Everything that can change a game funnels through this type, inbound
/// platform traffic and fired deadline timers alike. The worker consumes
/// its queue one event at a time, which is what serializes all mutation of
/// a single game.
#[derive(Debug)]
pub enum InstanceEvent {
    /// Chat message posted in the conversation.
    Message(MessageUpdate),
    /// Button press in the conversation.
    Callback(CallbackUpdate),
    /// A deadline timer fired.
    Timeout {
        /// Which deadline fired.
        kind: TimerKind,
        /// Arming generation the timer was started with.
        epoch: u64,
    },
}

/// State machine of one running game.
///
/// Owns its [`GameInstance`] exclusively; the supervisor only talks to it
/// through the event queue. External calls (storage, messaging, the user
/// directory) are best effort: a failed write or send is logged and play
/// continues, with the in-memory state as the source of truth while the
/// game runs.
pub struct GameLogic {
    instance: GameInstance,
    timers: TimerController,
    store: Arc<dyn GameStore>,
    messenger: Arc<dyn Messenger>,
    directory: Arc<dyn UserDirectory>,
}

impl GameLogic {
    /// Wrap an instance together with its collaborators.
    pub fn new(
        instance: GameInstance,
        timers: TimerController,
        store: Arc<dyn GameStore>,
        messenger: Arc<dyn Messenger>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            instance,
            timers,
            store,
            messenger,
            directory,
        }
    }

    /// Id of the underlying game document.
    pub fn game_id(&self) -> Uuid {
        self.instance.id
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> GameStage {
        self.instance.stage()
    }

    /// Arm the deadline matching the current stage.
    ///
    /// Called once when a worker starts. Fresh games sit in
    /// [`GameStage::WaitInit`] and need no timer; games restored from the
    /// store get a full new window, the original deadline died with the
    /// previous process.
    pub fn resume(&mut self) {
        match self.instance.stage() {
            GameStage::RegistrationGamers => {
                self.timers.arm(
                    TimerKind::Registration,
                    self.instance.profile.registration_timeout(),
                );
            }
            GameStage::WaitingAnswer => {
                self.timers
                    .arm(TimerKind::Answer, self.instance.profile.answer_timeout());
            }
            _ => {}
        }
    }

    /// Apply one queued event to the game.
    pub async fn handle_event(&mut self, event: InstanceEvent) {
        match event {
            InstanceEvent::Message(update) => self.handle_message(update).await,
            InstanceEvent::Callback(update) => self.handle_callback(update).await,
            InstanceEvent::Timeout {
                kind: TimerKind::Registration,
                epoch,
            } => self.registration_timeout(epoch).await,
            InstanceEvent::Timeout {
                kind: TimerKind::Answer,
                epoch,
            } => self.answer_timeout(epoch).await,
        }
    }

    /// Route a chat message through the command set and the answer path.
    ///
    /// The text is always offered to the answer arbiter, commands included:
    /// whoever holds the answer turn is answering with whatever they type
    /// next.
    async fn handle_message(&mut self, update: MessageUpdate) {
        let command = Command::parse(&update.text);

        if command == Some(Command::Start) {
            self.start_game(update.user_id).await;
        }

        self.submit_answer(update.user_id, &update.text).await;

        match command {
            Some(Command::Stop) => {
                self.cancel_game(update.user_id).await;
            }
            Some(Command::Finish) => {
                self.finish_game(update.user_id).await;
            }
            _ => {}
        }
    }

    async fn handle_callback(&mut self, update: CallbackUpdate) {
        let Some(action) = CallbackAction::parse(&update.payload) else {
            debug!(
                conversation_id = self.instance.conversation_id,
                payload = %update.payload,
                "ignoring unknown callback payload"
            );
            return;
        };
        match action {
            CallbackAction::RegisterOn => {
                self.register_player(&update.event_id, update.user_id).await;
            }
            CallbackAction::RegisterOff => {
                self.unregister_player(&update.event_id, update.user_id)
                    .await;
            }
            CallbackAction::GiveAnswer => {
                self.claim_answer_turn(&update.event_id, update.user_id)
                    .await;
            }
        }
    }

    /// Open the game: record the admin, announce the registration window,
    /// pin the roster message and start the registration deadline.
    async fn start_game(&mut self, admin_id: i64) {
        if self.instance.stage() != GameStage::WaitInit {
            self.broadcast(render::ALREADY_RUNNING.to_string(), None)
                .await;
            return;
        }

        info!(
            conversation_id = self.instance.conversation_id,
            game_id = %self.instance.id,
            admin_id,
            "opening registration"
        );

        self.instance.admin_id = Some(admin_id);
        if let Err(err) = self.store.set_admin(self.instance.id, admin_id).await {
            warn!(game_id = %self.instance.id, error = %err, "failed to persist game admin");
        }

        self.broadcast(
            render::registration_announcement(&self.instance.profile),
            preset(render::registration_keyboard()),
        )
        .await;

        if let Some(message_id) = self.broadcast(render::roster(&self.instance), None).await {
            self.instance.pinned_message_id = Some(message_id);
            if let Err(err) = self
                .store
                .set_pinned_message(self.instance.id, Some(message_id))
                .await
            {
                warn!(game_id = %self.instance.id, error = %err, "failed to persist pinned message id");
            }
            // Pin failure must not block registration.
            if let Err(err) = self
                .messenger
                .pin(self.instance.conversation_id, message_id)
                .await
            {
                warn!(
                    conversation_id = self.instance.conversation_id,
                    error = %err,
                    "failed to pin roster message"
                );
            }
        }

        self.move_to(GameStage::RegistrationGamers).await;
        self.timers.arm(
            TimerKind::Registration,
            self.instance.profile.registration_timeout(),
        );
    }

    /// Put `user_id` on the roster, closing registration early once the
    /// roster is full.
    async fn register_player(&mut self, event_id: &str, user_id: i64) {
        if self.instance.stage() != GameStage::RegistrationGamers {
            self.acknowledge(event_id, user_id, render::REGISTRATION_CLOSED)
                .await;
            return;
        }
        if self.instance.is_registered(user_id) {
            self.acknowledge(event_id, user_id, render::ALREADY_REGISTERED)
                .await;
            return;
        }

        let player = Player {
            user_id,
            name: self.resolve_name(user_id).await,
        };
        self.instance.register(player.clone());

        match self.store.add_player(self.instance.id, player).await {
            Ok(AddPlayerOutcome::Added) => {}
            Ok(AddPlayerOutcome::AlreadyRegistered) => {
                debug!(game_id = %self.instance.id, user_id, "player row already present");
            }
            Err(StorageError::Conflict(message)) => {
                debug!(
                    game_id = %self.instance.id,
                    user_id,
                    %message,
                    "registration write conflict, keeping the in-memory roster"
                );
            }
            Err(err) => {
                warn!(game_id = %self.instance.id, user_id, error = %err, "failed to persist registration");
            }
        }

        if self.instance.player_count() >= self.instance.profile.max_players as usize {
            self.timers.cancel(TimerKind::Registration);
            self.move_to(GameStage::WaitingReadyToAnswer).await;
            self.broadcast(render::quorum_reached(self.instance.player_count()), None)
                .await;
            self.broadcast_board().await;
        }

        self.acknowledge(event_id, user_id, render::REGISTRATION_CONFIRMED)
            .await;
        self.refresh_roster().await;
    }

    /// Take `user_id` off the roster while registration is still open.
    async fn unregister_player(&mut self, event_id: &str, user_id: i64) {
        if self.instance.stage() != GameStage::RegistrationGamers {
            self.acknowledge(event_id, user_id, render::REGISTRATION_CLOSED)
                .await;
            return;
        }
        if self.instance.unregister(user_id).is_none() {
            self.acknowledge(event_id, user_id, render::NOT_REGISTERED)
                .await;
            return;
        }
        if let Err(err) = self.store.remove_player(self.instance.id, user_id).await {
            warn!(game_id = %self.instance.id, user_id, error = %err, "failed to persist deregistration");
        }
        self.acknowledge(event_id, user_id, render::REGISTRATION_REMOVED)
            .await;
        self.refresh_roster().await;
    }

    /// Close the registration window: start play with a quorum, cancel the
    /// game without one.
    async fn registration_timeout(&mut self, epoch: u64) {
        if self.instance.stage() != GameStage::RegistrationGamers
            || !self.timers.is_current(TimerKind::Registration, epoch)
        {
            debug!(game_id = %self.instance.id, "dropping stale registration timeout");
            return;
        }

        let count = self.instance.player_count();
        let min = self.instance.profile.min_players;
        if count >= min as usize {
            self.move_to(GameStage::WaitingReadyToAnswer).await;
            self.broadcast(render::registration_timeout_notice(count), None)
                .await;
            self.broadcast_board().await;
        } else {
            info!(
                game_id = %self.instance.id,
                count, min,
                "registration closed without a quorum"
            );
            self.broadcast(render::registration_failed(count, min), None)
                .await;
            self.cancel_internal().await;
        }
    }

    /// Grant the answer turn to the first registered claimant.
    async fn claim_answer_turn(&mut self, event_id: &str, user_id: i64) {
        match self.instance.stage() {
            GameStage::WaitingReadyToAnswer if self.instance.is_registered(user_id) => {
                self.move_to(GameStage::WaitingAnswer).await;
                self.instance.responding_player = Some(user_id);
                if let Err(err) = self
                    .store
                    .set_responding_player(self.instance.id, Some(user_id))
                    .await
                {
                    warn!(game_id = %self.instance.id, error = %err, "failed to persist respondent");
                }

                self.acknowledge(event_id, user_id, render::YOUR_TURN).await;
                self.broadcast(
                    render::responder_announcement(&self.roster_name(user_id)),
                    Some(Keyboard::empty()),
                )
                .await;
                self.timers
                    .arm(TimerKind::Answer, self.instance.profile.answer_timeout());
            }
            GameStage::WaitingAnswer => {
                self.acknowledge(event_id, user_id, render::TOO_LATE).await;
            }
            _ => {
                self.acknowledge(event_id, user_id, render::STALE_BUTTON)
                    .await;
            }
        }
    }

    /// Take the turn back from a respondent who ran out of time.
    async fn answer_timeout(&mut self, epoch: u64) {
        if self.instance.stage() != GameStage::WaitingAnswer
            || !self.timers.is_current(TimerKind::Answer, epoch)
        {
            debug!(game_id = %self.instance.id, "dropping stale answer timeout");
            return;
        }

        self.clear_respondent().await;
        self.move_to(GameStage::WaitingReadyToAnswer).await;
        self.broadcast(render::ANSWER_TIME_UP.to_string(), None).await;
        self.broadcast_board().await;
    }

    /// Arbitrate the respondent's text against the open answers.
    ///
    /// Text from anyone else, in any stage, is ordinary conversation and is
    /// left alone. A miss costs the turn but never any points.
    async fn submit_answer(&mut self, user_id: i64, text: &str) {
        if self.instance.stage() != GameStage::WaitingAnswer
            || self.instance.responding_player != Some(user_id)
        {
            return;
        }

        self.timers.cancel(TimerKind::Answer);
        self.clear_respondent().await;

        match self.instance.take_answer(text) {
            Some(answer) => {
                info!(
                    game_id = %self.instance.id,
                    user_id,
                    answer_id = answer.id,
                    score = answer.score,
                    "answer opened"
                );
                if let Err(err) = self
                    .store
                    .record_answer(self.instance.id, user_id, answer.id)
                    .await
                {
                    warn!(game_id = %self.instance.id, error = %err, "failed to record opened answer");
                }
                self.broadcast(
                    render::correct_answer(&self.roster_name(user_id), &answer.title, answer.score),
                    None,
                )
                .await;

                if self.instance.answers_exhausted() {
                    self.finish_internal().await;
                } else {
                    self.move_to(GameStage::WaitingReadyToAnswer).await;
                    self.broadcast_board().await;
                }
            }
            None => {
                self.move_to(GameStage::WaitingReadyToAnswer).await;
                self.broadcast_board().await;
            }
        }
    }

    /// Close the game on behalf of `actor_id` and publish the score.
    ///
    /// Allowed for any registered player and for the admin. Reports whether
    /// the game actually finished.
    async fn finish_game(&mut self, actor_id: i64) -> bool {
        if self.instance.stage().is_terminal() {
            return false;
        }
        if !self.instance.is_registered(actor_id) && self.instance.admin_id != Some(actor_id) {
            debug!(
                game_id = %self.instance.id,
                actor_id,
                "finish rejected, caller is neither a player nor the admin"
            );
            return false;
        }
        self.finish_internal().await;
        true
    }

    /// Cancel the game on behalf of `actor_id`. Admin only.
    async fn cancel_game(&mut self, actor_id: i64) -> bool {
        if self.instance.stage().is_terminal() {
            return false;
        }
        if self.instance.admin_id != Some(actor_id) {
            debug!(
                game_id = %self.instance.id,
                actor_id,
                "cancel rejected, caller is not the admin"
            );
            return false;
        }
        self.cancel_internal().await;
        true
    }

    async fn finish_internal(&mut self) {
        info!(
            conversation_id = self.instance.conversation_id,
            game_id = %self.instance.id,
            "finishing game"
        );
        self.timers.cancel(TimerKind::Registration);
        self.timers.cancel(TimerKind::Answer);
        self.move_to(GameStage::Finished).await;
        self.broadcast(render::GAME_OVER.to_string(), Some(Keyboard::empty()))
            .await;

        match self.store.scoreboard(self.instance.id).await {
            Ok(rows) => {
                self.broadcast(render::leaderboard(&rows), Some(Keyboard::empty()))
                    .await;
            }
            Err(err) => {
                warn!(game_id = %self.instance.id, error = %err, "failed to load the scoreboard");
                self.broadcast(
                    render::SCORE_UNAVAILABLE.to_string(),
                    Some(Keyboard::empty()),
                )
                .await;
            }
        }

        self.unpin_roster().await;
    }

    async fn cancel_internal(&mut self) {
        info!(
            conversation_id = self.instance.conversation_id,
            game_id = %self.instance.id,
            "canceling game"
        );
        self.timers.cancel(TimerKind::Registration);
        self.timers.cancel(TimerKind::Answer);
        self.move_to(GameStage::Canceled).await;
        self.broadcast(render::GAME_CANCELED.to_string(), Some(Keyboard::empty()))
            .await;
        self.unpin_roster().await;
    }

    /// Record the stage in memory and best effort in the store.
    async fn move_to(&mut self, stage: GameStage) {
        self.instance.set_stage(stage);
        if let Err(err) = self.store.update_stage(self.instance.id, stage).await {
            warn!(game_id = %self.instance.id, %stage, error = %err, "failed to persist stage change");
        }
    }

    async fn clear_respondent(&mut self) {
        self.instance.responding_player = None;
        if let Err(err) = self
            .store
            .set_responding_player(self.instance.id, None)
            .await
        {
            warn!(game_id = %self.instance.id, error = %err, "failed to clear respondent");
        }
    }

    /// Send a broadcast; delivery failure never gates a transition.
    async fn broadcast(&self, text: String, keyboard: Option<Keyboard>) -> Option<i64> {
        match self
            .messenger
            .broadcast(self.instance.conversation_id, text, keyboard)
            .await
        {
            Ok(message_id) => Some(message_id),
            Err(err) => {
                warn!(
                    conversation_id = self.instance.conversation_id,
                    error = %err,
                    "broadcast failed"
                );
                None
            }
        }
    }

    async fn acknowledge(&self, event_id: &str, user_id: i64, text: &str) {
        if let Err(err) = self
            .messenger
            .acknowledge(
                event_id.to_string(),
                user_id,
                self.instance.conversation_id,
                text.to_string(),
            )
            .await
        {
            warn!(
                conversation_id = self.instance.conversation_id,
                user_id,
                error = %err,
                "event acknowledgment failed"
            );
        }
    }

    /// Re-broadcast the question board with the claim button.
    async fn broadcast_board(&self) {
        self.broadcast(
            render::answer_board(&self.instance),
            preset(render::claim_keyboard()),
        )
        .await;
    }

    /// Refresh the pinned roster message, when there is one to edit.
    async fn refresh_roster(&self) {
        let Some(message_id) = self.instance.pinned_message_id else {
            return;
        };
        if let Err(err) = self
            .messenger
            .edit(
                self.instance.conversation_id,
                message_id,
                render::roster(&self.instance),
            )
            .await
        {
            warn!(
                conversation_id = self.instance.conversation_id,
                error = %err,
                "failed to refresh roster message"
            );
        }
    }

    async fn unpin_roster(&self) {
        if self.instance.pinned_message_id.is_none() {
            return;
        }
        if let Err(err) = self.messenger.unpin(self.instance.conversation_id).await {
            warn!(
                conversation_id = self.instance.conversation_id,
                error = %err,
                "failed to unpin roster message"
            );
        }
    }

    /// Resolve a display name through the directory, with a generic
    /// fallback when it cannot help.
    async fn resolve_name(&self, user_id: i64) -> String {
        match self.directory.lookup(user_id).await {
            Ok(Some(profile)) => profile.display_name,
            Ok(None) => {
                debug!(user_id, "user unknown to the directory, using a fallback name");
                format!("Player {user_id}")
            }
            Err(err) => {
                warn!(user_id, error = %err, "directory lookup failed, using a fallback name");
                format!("Player {user_id}")
            }
        }
    }

    /// Display name from the roster; registration resolved it already.
    fn roster_name(&self, user_id: i64) -> String {
        self.instance
            .players()
            .get(&user_id)
            .map(|player| player.name.clone())
            .unwrap_or_else(|| format!("Player {user_id}"))
    }
}

fn preset(keyboard: Result<Keyboard, KeyboardError>) -> Option<Keyboard> {
    match keyboard {
        Ok(keyboard) => Some(keyboard),
        Err(err) => {
            warn!(error = %err, "keyboard preset exceeded platform limits");
            None
        }
    }
}
