//! Outbound message texts and keyboard presets.

use crate::config::GameProfile;
use crate::dao::models::ScoreRow;
use crate::dto::keyboard::{ButtonColor, Keyboard, KeyboardError};
use crate::dto::update::CallbackAction;
use crate::state::game::GameInstance;

/// Broadcast when `/start` arrives for a game already under way.
pub const ALREADY_RUNNING: &str = "The game is already running!";
/// Broadcast when no question content is available.
pub const NO_QUESTIONS: &str = "No questions are available right now, try again later.";
/// Ack for a duplicate registration attempt.
pub const ALREADY_REGISTERED: &str = "You are already registered!";
/// Ack for a successful registration.
pub const REGISTRATION_CONFIRMED: &str = "You are in the game!";
/// Ack for leaving the roster.
pub const REGISTRATION_REMOVED: &str = "You left the game.";
/// Ack for trying to leave without having joined.
pub const NOT_REGISTERED: &str = "You were not registered.";
/// Ack for roster actions outside the registration window.
pub const REGISTRATION_CLOSED: &str = "Registration is closed.";
/// Ack for a claim that lost the race for the turn.
pub const TOO_LATE: &str = "Too late, the turn is already taken!";
/// Ack for a button press that no longer applies.
pub const STALE_BUTTON: &str = "This button is no longer active.";
/// Ack for the player who won the claim race.
pub const YOUR_TURN: &str = "You answer first! Send your answer as a chat message.";
/// Broadcast when the answer window closes without an answer.
pub const ANSWER_TIME_UP: &str = "Time is up, no answer arrived. Who wants to try?";
/// Broadcast when a game is called off.
pub const GAME_CANCELED: &str = "The game is canceled!";
/// Broadcast right before the final score.
pub const GAME_OVER: &str = "The game is over! Counting the points...";
/// Broadcast when the final score cannot be loaded.
pub const SCORE_UNAVAILABLE: &str = "The final score is unavailable right now.";

/// Opening broadcast of the registration window.
pub fn registration_announcement(profile: &GameProfile) -> String {
    format!(
        "Starting a game of 100 to 1!\n{profile}\nUse the buttons below to join or leave the game."
    )
}

/// Roster message kept pinned during registration.
pub fn roster(instance: &GameInstance) -> String {
    let mut lines = vec![format!(
        "Players ({}/{}):",
        instance.player_count(),
        instance.profile.max_players
    )];
    for player in instance.players().values() {
        lines.push(format!("-- {}", player.name));
    }
    lines.join("\n")
}

/// Broadcast when the roster filled up before the deadline.
pub fn quorum_reached(count: usize) -> String {
    format!("All seats are taken, {count} players are in. Let's begin!")
}

/// Broadcast when the registration deadline passed with enough players.
pub fn registration_timeout_notice(count: usize) -> String {
    format!("Registration is over, {count} players joined. Let's begin!")
}

/// Broadcast when the registration deadline passed without a quorum.
pub fn registration_failed(count: usize, min: u32) -> String {
    format!("Only {count} players joined, at least {min} needed. The game is called off.")
}

/// Broadcast naming the player who claimed the turn.
pub fn responder_announcement(name: &str) -> String {
    format!("{name} answers first!")
}

/// Broadcast for an opened answer.
pub fn correct_answer(name: &str, title: &str, score: u32) -> String {
    format!("Correct, \"{title}\"! {name} gets {score} points.")
}

/// The question with its board: opened answers in full, the rest masked.
///
/// A masked line keeps the answer's length visible (one `X` per character)
/// without leaking its content.
pub fn answer_board(instance: &GameInstance) -> String {
    let mut lines = vec![instance.question.title.clone(), String::new()];
    for (answer, opened) in instance.board() {
        if opened {
            lines.push(format!("{} = {}", answer.title, answer.score));
        } else {
            let count = answer.title.chars().count();
            lines.push(format!(
                "{} ({}) = {}",
                "X".repeat(count),
                count,
                answer.score
            ));
        }
    }
    lines.join("\n")
}

/// Final score table, highest total first.
pub fn leaderboard(rows: &[ScoreRow]) -> String {
    let mut lines = vec!["🏆 Final score:".to_string()];
    if rows.is_empty() {
        lines.push("Nobody opened a single answer.".to_string());
    }
    for row in rows {
        lines.push(format!("{:<15} :{:<5} points", row.name, row.total));
    }
    lines.push("Thanks for playing!".to_string());
    lines.join("\n")
}

/// Join/leave buttons shown during registration.
pub fn registration_keyboard() -> Result<Keyboard, KeyboardError> {
    let mut keyboard = Keyboard::new(false);
    keyboard.add_callback_button(
        "Join",
        CallbackAction::RegisterOn.token(),
        ButtonColor::Primary,
    )?;
    keyboard.add_callback_button(
        "Leave",
        CallbackAction::RegisterOff.token(),
        ButtonColor::Secondary,
    )?;
    Ok(keyboard)
}

/// Single claim button shown with the question board.
pub fn claim_keyboard() -> Result<Keyboard, KeyboardError> {
    let mut keyboard = Keyboard::new(false);
    keyboard.add_callback_button(
        "I know the answer!",
        CallbackAction::GiveAnswer.token(),
        ButtonColor::Primary,
    )?;
    Ok(keyboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::state::game::{Answer, Player, Question};

    fn instance() -> GameInstance {
        let question = Question {
            id: Uuid::new_v4(),
            title: "Name something found in a kitchen".into(),
            answers: vec![
                Answer {
                    id: 1,
                    title: "холодильник".into(),
                    score: 60,
                },
                Answer {
                    id: 2,
                    title: "sink".into(),
                    score: 40,
                },
            ],
        };
        GameInstance::new(10, GameProfile::default(), question)
    }

    #[test]
    fn mask_counts_characters_not_bytes() {
        let board = answer_board(&instance());
        assert!(board.contains("XXXXXXXXXXX (11) = 60"));
        assert!(board.contains("XXXX (4) = 40"));
        assert!(!board.contains("холодильник"));
    }

    #[test]
    fn opened_answer_shows_literal_text() {
        let mut instance = instance();
        instance.take_answer("ХОЛОДИЛЬНИК");
        let board = answer_board(&instance);
        assert!(board.contains("холодильник = 60"));
        assert!(board.contains("XXXX (4) = 40"));
    }

    #[test]
    fn roster_lists_players_in_join_order() {
        let mut instance = instance();
        assert_eq!(roster(&instance), "Players (0/6):");

        instance.register(Player {
            user_id: 42,
            name: "Ann".into(),
        });
        instance.register(Player {
            user_id: 43,
            name: "Bob".into(),
        });
        assert_eq!(roster(&instance), "Players (2/6):\n-- Ann\n-- Bob");
    }

    #[test]
    fn leaderboard_keeps_given_order_and_aligns_columns() {
        let rows = vec![
            ScoreRow {
                player_id: 1,
                name: "Ann".into(),
                total: 58,
            },
            ScoreRow {
                player_id: 2,
                name: "Bob".into(),
                total: 27,
            },
        ];
        let text = leaderboard(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "🏆 Final score:");
        assert_eq!(lines[1], format!("{:<15} :{:<5} points", "Ann", 58));
        assert_eq!(lines[2], format!("{:<15} :{:<5} points", "Bob", 27));
        assert_eq!(lines[3], "Thanks for playing!");
    }

    #[test]
    fn keyboard_presets_stay_within_limits() {
        assert_eq!(registration_keyboard().unwrap().button_count(), 2);
        assert_eq!(claim_keyboard().unwrap().button_count(), 1);
    }
}
