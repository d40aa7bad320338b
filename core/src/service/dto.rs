use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClubError;
use crate::model::matches::{Match, MatchStatus};
use crate::model::player::{Player, Position, UniformSize};

pub const MAX_SHIRT_NUMBER: u32 = 99;

/// Player form as submitted by the collaborator. Only presence of required
/// fields is guaranteed; ranges are checked by [`PlayerForm::validate`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlayerForm {
    pub name: String,
    pub position: Position,
    pub shirt_number: u32,
    pub uniform_size: UniformSize,
    pub is_guest: bool,
    /// Hand-entered totals. Ignored once any match has been concluded.
    pub goals: Option<u32>,
    pub games: Option<u32>,
}

impl PlayerForm {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            shirt_number: 1,
            uniform_size: UniformSize::default(),
            is_guest: false,
            goals: None,
            games: None,
        }
    }

    pub fn validate(&self) -> Result<(), ClubError> {
        if self.name.trim().is_empty() {
            return Err(ClubError::validation("player name is required"));
        }
        if !self.is_guest && !(1..=MAX_SHIRT_NUMBER).contains(&self.shirt_number) {
            return Err(ClubError::validation(format!(
                "shirt number must be between 1 and {}, got {}",
                MAX_SHIRT_NUMBER, self.shirt_number
            )));
        }
        Ok(())
    }

    /// Writes the form onto `player`, leaving ledger and identity untouched.
    pub fn apply_to(&self, player: &mut Player) {
        player.name = self.name.trim().to_string();
        player.position = self.position;
        player.is_guest = self.is_guest;
        player.shirt_number = self.shirt_number;
        player.uniform_size = self.uniform_size;
        player.enforce_guest_invariant();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchForm {
    pub opponent: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub status: MatchStatus,
    pub our_score: u32,
    pub opponent_score: u32,
    pub scorers: BTreeMap<Uuid, u32>,
    pub attendance: BTreeSet<Uuid>,
}

impl MatchForm {
    pub fn new(opponent: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            opponent: opponent.into(),
            date,
            location: String::new(),
            status: MatchStatus::default(),
            our_score: 0,
            opponent_score: 0,
            scorers: BTreeMap::new(),
            attendance: BTreeSet::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ClubError> {
        if self.opponent.trim().is_empty() {
            return Err(ClubError::validation("opponent is required"));
        }
        if let Some((absent, _)) = self
            .scorers
            .iter()
            .find(|(id, goals)| **goals > 0 && !self.attendance.contains(*id))
        {
            return Err(ClubError::validation(format!(
                "scorer {} is not in the attendance list",
                absent
            )));
        }
        Ok(())
    }

    /// The normalized match this form describes, under `id`.
    pub fn into_match(self, id: Uuid) -> Match {
        let mut m = Match {
            id,
            opponent: self.opponent.trim().to_string(),
            date: self.date,
            location: self.location.trim().to_string(),
            status: self.status,
            our_score: self.our_score,
            opponent_score: self.opponent_score,
            scorers: self.scorers,
            attendance: self.attendance,
            updated_by: None,
        };
        m.normalize();
        m
    }
}

impl From<&Match> for MatchForm {
    fn from(m: &Match) -> Self {
        Self {
            opponent: m.opponent.clone(),
            date: m.date,
            location: m.location.clone(),
            status: m.status,
            our_score: m.our_score,
            opponent_score: m.opponent_score,
            scorers: m.scorers.clone(),
            attendance: m.attendance.clone(),
        }
    }
}

impl From<&Player> for PlayerForm {
    fn from(p: &Player) -> Self {
        Self {
            name: p.name.clone(),
            position: p.position,
            shirt_number: p.shirt_number,
            uniform_size: p.uniform_size,
            is_guest: p.is_guest,
            goals: None,
            games: None,
        }
    }
}

/// Both collections as fetched and mapped in one pass.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ClubSnapshot {
    /// Sorted by name.
    pub players: Vec<Player>,
    /// Newest first.
    pub matches: Vec<Match>,
}

impl ClubSnapshot {
    pub fn player(&self, id: &Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn player_name(&self, id: &Uuid) -> String {
        self.player(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string()[..8].to_string())
    }

    pub fn has_concluded_matches(&self) -> bool {
        self.matches.iter().any(|m| m.is_concluded())
    }
}
