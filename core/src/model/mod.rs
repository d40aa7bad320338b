pub mod matches;
pub mod player;
pub mod stats;

pub use matches::{Match, MatchStatus};
pub use player::{Player, Position, UniformSize};
pub use stats::{Dashboard, MonthlyFinances, PositionCount, StatTotals, TeamStats};
