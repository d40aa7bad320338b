use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::MonthKey;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    #[serde(alias = "Goleiro")]
    Goalkeeper,
    #[serde(alias = "Zagueiro")]
    Defender,
    #[serde(alias = "Meio-Campo")]
    Midfielder,
    #[serde(alias = "Atacante")]
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn short(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniformSize {
    #[serde(alias = "PP")]
    XS,
    #[serde(alias = "P")]
    S,
    #[default]
    M,
    #[serde(alias = "G")]
    L,
    #[serde(alias = "GG")]
    XL,
}

impl fmt::Display for UniformSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A roster member as the rest of the core sees it, after mapping.
///
/// `goals` and `games` are owned by the stats sync. `monthly_fee_paid` is a
/// projection of `payment_history` for the current month and is only ever
/// written by [`crate::service::ledger::refresh_fee_status`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub position: Position,
    /// 0 for guests.
    pub shirt_number: u32,
    pub uniform_size: UniformSize,
    pub is_guest: bool,
    pub goals: u32,
    pub games: u32,
    pub payment_history: BTreeSet<MonthKey>,
    pub monthly_fee_paid: bool,
    pub added_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl Player {
    pub fn new(name: String, position: Position, shirt_number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            position,
            shirt_number,
            uniform_size: UniformSize::default(),
            is_guest: false,
            goals: 0,
            games: 0,
            payment_history: BTreeSet::new(),
            monthly_fee_paid: false,
            added_at: Utc::now(),
            updated_by: None,
        }
    }

    pub fn guest(name: String, position: Position) -> Self {
        let mut player = Self::new(name, position, 0);
        player.is_guest = true;
        player
    }

    /// Clears the fields guests do not carry.
    pub fn enforce_guest_invariant(&mut self) {
        if self.is_guest {
            self.shirt_number = 0;
            self.uniform_size = UniformSize::default();
            self.monthly_fee_paid = false;
        }
    }

    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}
