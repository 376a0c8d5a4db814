pub mod keyboard;
pub mod update;
