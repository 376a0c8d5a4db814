//! Application-level configuration loading, including the default game profile.

use std::{env, fmt, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

/// Default location on disk where the bot looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "HUNDRED_BOT_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    profile: GameProfile,
    reaction_words: Vec<String>,
}

impl AppConfig {
    /// Build a configuration from parts, validating the profile.
    pub fn new(profile: GameProfile, reaction_words: Vec<String>) -> Result<Self, ProfileError> {
        Ok(Self {
            profile: profile.validated()?,
            reaction_words,
        })
    }

    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => match AppConfig::try_from(raw) {
                    Ok(app_config) => {
                        info!(
                            path = %path.display(),
                            profile = %app_config.profile,
                            "loaded configuration from file"
                        );
                        app_config
                    }
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "configured game profile is invalid; falling back to defaults"
                        );
                        Self::default()
                    }
                },
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Rules applied to every new game.
    pub fn profile(&self) -> &GameProfile {
        &self.profile
    }

    /// Words that trigger a reaction on the offending chat message.
    pub fn reaction_words(&self) -> &[String] {
        &self.reaction_words
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: GameProfile::default(),
            reaction_words: Vec::new(),
        }
    }
}

/// Rules one game instance runs under. Immutable once the game has started;
/// persisted with the game so a restart replays the same rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GameProfile {
    /// Seconds the registration window stays open.
    #[serde(default = "default_registration_timeout")]
    #[validate(range(min = 1))]
    pub registration_timeout_secs: u64,
    /// Seconds a respondent has to send an answer.
    #[serde(default = "default_answer_timeout")]
    #[validate(range(min = 1))]
    pub answer_timeout_secs: u64,
    /// Smallest roster the game starts with.
    #[serde(default = "default_min_players")]
    #[validate(range(min = 1))]
    pub min_players: u32,
    /// Roster size that closes registration early.
    #[serde(default = "default_max_players")]
    #[validate(range(min = 1))]
    pub max_players: u32,
}

impl GameProfile {
    /// Check every profile invariant, consuming and returning the profile on success.
    pub fn validated(self) -> Result<Self, ProfileError> {
        self.validate()?;
        if self.min_players > self.max_players {
            return Err(ProfileError::PlayerBounds {
                min: self.min_players,
                max: self.max_players,
            });
        }
        Ok(self)
    }

    /// Registration window as a [`Duration`].
    pub fn registration_timeout(&self) -> Duration {
        Duration::from_secs(self.registration_timeout_secs)
    }

    /// Answer window as a [`Duration`].
    pub fn answer_timeout(&self) -> Duration {
        Duration::from_secs(self.answer_timeout_secs)
    }
}

impl Default for GameProfile {
    fn default() -> Self {
        Self {
            registration_timeout_secs: default_registration_timeout(),
            answer_timeout_secs: default_answer_timeout(),
            min_players: default_min_players(),
            max_players: default_max_players(),
        }
    }
}

impl fmt::Display for GameProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Registration window: {}s. Answer window: {}s. Players: {}-{}.",
            self.registration_timeout_secs,
            self.answer_timeout_secs,
            self.min_players,
            self.max_players
        )
    }
}

/// Error raised when a game profile violates its invariants.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// One or more fields failed range validation.
    #[error("game profile failed validation: {0}")]
    Invalid(#[from] ValidationErrors),
    /// The minimum roster size exceeds the maximum.
    #[error("min players ({min}) exceeds max players ({max})")]
    PlayerBounds {
        /// Configured minimum roster size.
        min: u32,
        /// Configured maximum roster size.
        max: u32,
    },
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    profile: Option<GameProfile>,
    #[serde(default)]
    reaction_words: Vec<String>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ProfileError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        let profile = value.profile.unwrap_or_default().validated()?;
        Ok(Self {
            profile,
            reaction_words: value.reaction_words,
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn default_registration_timeout() -> u64 {
    15
}

fn default_answer_timeout() -> u64 {
    15
}

fn default_min_players() -> u32 {
    1
}

fn default_max_players() -> u32 {
    6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_passes_validation() {
        assert!(GameProfile::default().validated().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let profile = GameProfile {
            registration_timeout_secs: 0,
            ..GameProfile::default()
        };
        assert!(matches!(
            profile.validated(),
            Err(ProfileError::Invalid(_))
        ));
    }

    #[test]
    fn inverted_player_bounds_are_rejected() {
        let profile = GameProfile {
            min_players: 5,
            max_players: 2,
            ..GameProfile::default()
        };
        match profile.validated() {
            Err(ProfileError::PlayerBounds { min, max }) => {
                assert_eq!(min, 5);
                assert_eq!(max, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn partial_config_file_fills_missing_fields() {
        let raw: RawConfig = serde_json::from_str(r#"{"profile": {"max_players": 9}}"#).unwrap();
        let config = AppConfig::try_from(raw).unwrap();
        assert_eq!(config.profile().max_players, 9);
        assert_eq!(config.profile().min_players, 1);
        assert_eq!(config.profile().registration_timeout_secs, 15);
        assert!(config.reaction_words().is_empty());
    }

    #[test]
    fn programmatic_config_rejects_an_invalid_profile() {
        let profile = GameProfile {
            min_players: 3,
            max_players: 1,
            ..GameProfile::default()
        };
        assert!(AppConfig::new(profile, Vec::new()).is_err());
        assert!(AppConfig::new(GameProfile::default(), vec!["hi".into()]).is_ok());
    }

    #[test]
    fn profile_display_is_human_readable() {
        let text = GameProfile::default().to_string();
        assert_eq!(
            text,
            "Registration window: 15s. Answer window: 15s. Players: 1-6."
        );
    }
}
