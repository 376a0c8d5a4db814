use serde::Serialize;
use thiserror::Error;

/// Maximum buttons allowed in a single row.
const MAX_ROW_BUTTONS: usize = 5;
/// Maximum rows allowed on one keyboard.
const MAX_ROWS: usize = 10;
/// Maximum buttons allowed on one keyboard overall.
const MAX_BUTTONS: usize = 40;

/// Error raised when a keyboard would exceed the platform limits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyboardError {
    /// The current row already holds [`MAX_ROW_BUTTONS`] buttons.
    #[error("keyboard row cannot hold more than {MAX_ROW_BUTTONS} buttons")]
    RowFull,
    /// The keyboard already holds [`MAX_ROWS`] rows.
    #[error("keyboard cannot hold more than {MAX_ROWS} rows")]
    TooManyRows,
    /// The keyboard already holds [`MAX_BUTTONS`] buttons.
    #[error("keyboard cannot hold more than {MAX_BUTTONS} buttons")]
    TooManyButtons,
}

/// Accent color of a keyboard button.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ButtonColor {
    /// Highlighted action.
    Primary,
    /// Neutral action.
    Secondary,
    /// Destructive action.
    Negative,
    /// Confirming action.
    Positive,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ButtonAction {
    Callback { label: String, payload: String },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct Button {
    action: ButtonAction,
    color: ButtonColor,
}

/// Outbound keyboard in the platform wire shape.
///
/// Construction is checked against the platform limits so an oversized
/// keyboard is rejected here instead of by the remote API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Keyboard {
    one_time: bool,
    inline: bool,
    buttons: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Start a keyboard with one open row.
    pub fn new(one_time: bool) -> Self {
        Self {
            one_time,
            inline: false,
            buttons: vec![Vec::new()],
        }
    }

    /// Keyboard with no buttons; sending it removes the previous one for clients.
    pub fn empty() -> Self {
        Self {
            one_time: true,
            inline: false,
            buttons: Vec::new(),
        }
    }

    /// Open a new row for subsequent buttons.
    pub fn add_row(&mut self) -> Result<(), KeyboardError> {
        if self.buttons.len() >= MAX_ROWS {
            return Err(KeyboardError::TooManyRows);
        }
        self.buttons.push(Vec::new());
        Ok(())
    }

    /// Append a callback button to the current row.
    pub fn add_callback_button(
        &mut self,
        label: impl Into<String>,
        payload: impl Into<String>,
        color: ButtonColor,
    ) -> Result<(), KeyboardError> {
        if self.button_count() >= MAX_BUTTONS {
            return Err(KeyboardError::TooManyButtons);
        }
        if self.buttons.is_empty() {
            self.add_row()?;
        }
        if let Some(row) = self.buttons.last_mut() {
            if row.len() >= MAX_ROW_BUTTONS {
                return Err(KeyboardError::RowFull);
            }
            row.push(Button {
                action: ButtonAction::Callback {
                    label: label.into(),
                    payload: payload.into(),
                },
                color,
            });
        }
        Ok(())
    }

    /// Total number of buttons across all rows.
    pub fn button_count(&self) -> usize {
        self.buttons.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sixth_button_in_a_row_is_rejected() {
        let mut keyboard = Keyboard::new(false);
        for i in 0..5 {
            keyboard
                .add_callback_button(format!("b{i}"), "/p", ButtonColor::Primary)
                .unwrap();
        }
        assert_eq!(
            keyboard.add_callback_button("b5", "/p", ButtonColor::Primary),
            Err(KeyboardError::RowFull)
        );
        assert_eq!(keyboard.button_count(), 5);
    }

    #[test]
    fn eleventh_row_is_rejected() {
        let mut keyboard = Keyboard::new(false);
        for _ in 0..9 {
            keyboard.add_row().unwrap();
        }
        assert_eq!(keyboard.add_row(), Err(KeyboardError::TooManyRows));
    }

    #[test]
    fn forty_first_button_is_rejected() {
        let mut keyboard = Keyboard::new(false);
        for row in 0..8 {
            if row > 0 {
                keyboard.add_row().unwrap();
            }
            for i in 0..5 {
                keyboard
                    .add_callback_button(format!("b{row}{i}"), "/p", ButtonColor::Primary)
                    .unwrap();
            }
        }
        assert_eq!(keyboard.button_count(), 40);
        keyboard.add_row().unwrap();
        assert_eq!(
            keyboard.add_callback_button("extra", "/p", ButtonColor::Primary),
            Err(KeyboardError::TooManyButtons)
        );
    }

    #[test]
    fn empty_keyboard_serializes_without_rows() {
        let value = serde_json::to_value(Keyboard::empty()).unwrap();
        assert_eq!(
            value,
            json!({"one_time": true, "inline": false, "buttons": []})
        );
    }

    #[test]
    fn callback_button_wire_shape() {
        let mut keyboard = Keyboard::new(false);
        keyboard
            .add_callback_button("Join", "/reg_on", ButtonColor::Primary)
            .unwrap();
        let value = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(
            value,
            json!({
                "one_time": false,
                "inline": false,
                "buttons": [[{
                    "action": {"type": "callback", "label": "Join", "payload": "/reg_on"},
                    "color": "primary"
                }]]
            })
        );
    }
}
