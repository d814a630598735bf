//! Mr. White: one shared device, one secret word, one player who does not know it.
pub mod command;
pub mod game;
pub mod generator;
pub mod renderer;
pub mod scores;
pub mod session;
pub mod words;

pub use command::Command;
pub use game::{MrWhiteEvent, MrWhiteGame, TableView};
pub use generator::{CommandGenerator, Disabled, GenerateError, WordGenerator};
pub use scores::Scoreboard;
pub use session::{Card, Elimination, GameError, GameSession, GameSummary, Outcome, Phase};
pub use words::{SuppliedWord, WordOrigin, WordSource, WordSupplier};
