use serde::{Deserialize, Serialize};

use crate::model::matches::Match;
use crate::model::player::{Player, Position};
use crate::time::MonthKey;

/// Lifetime totals of one player, as recomputed from concluded matches.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatTotals {
    pub goals: u32,
    pub games: u32,
}

impl StatTotals {
    pub fn add_goals(&mut self, goals: u32) {
        self.goals += goals;
    }

    pub fn add_game(&mut self) {
        self.games += 1;
    }
}

/// Team-wide aggregates shown on the dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TeamStats {
    pub total_goals: u32,
    pub total_games: u32,
    pub active_players: u32,
    pub guest_count: u32,
    pub paid_count: u32,
    /// Percentage in [0, 100].
    pub payment_rate: f64,
    pub total_revenue: f64,
    pub expected_revenue: f64,
}

/// Dues collection for one month over the non-guest roster.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthlyFinances {
    pub month: MonthKey,
    pub active_players: u32,
    pub paid_count: u32,
    pub unpaid_count: u32,
    pub collected: f64,
    pub expected: f64,
    pub progress: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionCount {
    pub position: Position,
    pub count: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub stats: TeamStats,
    pub next_match: Option<Match>,
    pub last_match: Option<Match>,
    pub top_scorers: Vec<Player>,
    pub month: MonthKey,
}
