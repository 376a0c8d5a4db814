use serde::Deserialize;

/// Inbound chat message normalized by the transport layer.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MessageUpdate {
    /// Conversation the message was posted in.
    pub conversation_id: i64,
    /// Author of the message.
    pub user_id: i64,
    /// Platform id of the message itself.
    pub message_id: i64,
    /// Raw message text.
    pub text: String,
}

/// Inbound button press normalized by the transport layer.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CallbackUpdate {
    /// Conversation the button lives in.
    pub conversation_id: i64,
    /// User who pressed the button.
    pub user_id: i64,
    /// Platform event id used to acknowledge the press.
    pub event_id: String,
    /// Token the pressed button carried.
    pub payload: String,
}

/// Free-text command recognized in chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start`: open a game in this conversation.
    Start,
    /// `/stop`: cancel the running game.
    Stop,
    /// `/finish`: close the game and show the score.
    Finish,
}

impl Command {
    /// Parse the leading token of a chat message.
    pub fn parse(text: &str) -> Option<Self> {
        match text.split_whitespace().next()? {
            "/start" => Some(Command::Start),
            "/stop" => Some(Command::Stop),
            "/finish" => Some(Command::Finish),
            _ => None,
        }
    }
}

/// Action encoded in a button callback payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Join the registration roster.
    RegisterOn,
    /// Leave the registration roster.
    RegisterOff,
    /// Claim the turn to answer.
    GiveAnswer,
}

impl CallbackAction {
    /// Wire token carried in the button payload.
    pub fn token(self) -> &'static str {
        match self {
            CallbackAction::RegisterOn => "/reg_on",
            CallbackAction::RegisterOff => "/reg_off",
            CallbackAction::GiveAnswer => "/give_answer",
        }
    }

    /// Parse a callback payload token.
    pub fn parse(payload: &str) -> Option<Self> {
        match payload.trim() {
            "/reg_on" => Some(CallbackAction::RegisterOn),
            "/reg_off" => Some(CallbackAction::RegisterOff),
            "/give_answer" => Some(CallbackAction::GiveAnswer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_leading_token() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /stop now"), Some(Command::Stop));
        assert_eq!(Command::parse("/finish please"), Some(Command::Finish));
    }

    #[test]
    fn unrelated_text_is_not_a_command() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("hello /start"), None);
        assert_eq!(Command::parse("/START"), None);
        assert_eq!(Command::parse("/started"), None);
    }

    #[test]
    fn callback_tokens_round_trip() {
        for action in [
            CallbackAction::RegisterOn,
            CallbackAction::RegisterOff,
            CallbackAction::GiveAnswer,
        ] {
            assert_eq!(CallbackAction::parse(action.token()), Some(action));
        }
        assert_eq!(CallbackAction::parse("/unknown"), None);
    }
}
