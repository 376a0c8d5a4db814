pub mod game;
pub mod stage;

pub use self::game::{Answer, GameInstance, Player, Question};
pub use self::stage::GameStage;
