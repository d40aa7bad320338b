pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod repository;
pub mod service;
pub mod time;

pub use config::{resolve_data_dir, ClubConfig};
pub use error::ClubError;
pub use input::{expand_key, match_form_from_input, parse_args, player_form_from_input, resolve_player, ParsedInput};
pub use model::{Dashboard, Match, MatchStatus, MonthlyFinances, Player, Position, TeamStats, UniformSize};
pub use repository::{FileMatchRepository, FilePlayerRepository, MatchRepository, PlayerRepository};
pub use service::club_service::ClubService;
pub use service::dto::{ClubSnapshot, MatchForm, PlayerForm};
pub use service::match_sync::{MatchStatsSync, SyncReport};
pub use time::{parse_match_date, MonthKey};
