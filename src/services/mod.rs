/// Per-conversation game engine and event handling.
pub mod game_logic;
/// Message texts and keyboard presets for the conversation surface.
pub mod render;
/// Conversation registry, worker lifecycle and event routing.
pub mod supervisor;
/// Cancellable deadline timers for game stages.
pub mod timer;
/// Reaction-word scanning of inbound chat text.
pub mod word_filter;
