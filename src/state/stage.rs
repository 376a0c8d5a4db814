use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a single game instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStage {
    /// Instance exists but the opening command has not been processed yet.
    WaitInit,
    /// Registration window is open; players may join and leave.
    RegistrationGamers,
    /// Question is on the table; the first claimant takes the turn.
    WaitingReadyToAnswer,
    /// One player holds the turn and must produce an answer.
    WaitingAnswer,
    /// Every answer was opened or a participant closed the game.
    Finished,
    /// The game was called off before completion.
    Canceled,
}

impl GameStage {
    /// Whether the stage ends the instance lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStage::Finished | GameStage::Canceled)
    }
}

impl fmt::Display for GameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameStage::WaitInit => "WAIT_INIT",
            GameStage::RegistrationGamers => "REGISTRATION_GAMERS",
            GameStage::WaitingReadyToAnswer => "WAITING_READY_TO_ANSWER",
            GameStage::WaitingAnswer => "WAITING_ANSWER",
            GameStage::Finished => "FINISHED",
            GameStage::Canceled => "CANCELED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_finished_and_canceled_are_terminal() {
        assert!(GameStage::Finished.is_terminal());
        assert!(GameStage::Canceled.is_terminal());
        assert!(!GameStage::WaitInit.is_terminal());
        assert!(!GameStage::RegistrationGamers.is_terminal());
        assert!(!GameStage::WaitingReadyToAnswer.is_terminal());
        assert!(!GameStage::WaitingAnswer.is_terminal());
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&GameStage::WaitingReadyToAnswer).unwrap();
        assert_eq!(json, "\"WAITING_READY_TO_ANSWER\"");
        let stage: GameStage = serde_json::from_str("\"REGISTRATION_GAMERS\"").unwrap();
        assert_eq!(stage, GameStage::RegistrationGamers);
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(GameStage::WaitInit.to_string(), "WAIT_INIT");
        assert_eq!(GameStage::Canceled.to_string(), "CANCELED");
    }
}
