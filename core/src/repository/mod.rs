pub mod file;
pub mod mapper;
pub mod record;
pub mod traits;

// Re-export
pub use file::{FileMatchRepository, FilePlayerRepository};
pub use record::{MatchRecord, PlayerRecord};
pub use traits::{MatchRepository, PlayerRepository};
