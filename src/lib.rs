//! Library crate for hundred-bot, exposing the game engine for bot binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod platform;
pub mod services;
pub mod state;
