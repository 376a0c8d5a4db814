/// Game state storage and retrieval operations.
pub mod game_store;
/// Database model definitions.
pub mod models;
/// Question content source and validation rules.
pub mod questions;
/// Storage abstraction layer for database operations.
pub mod storage;
