use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStatus {
    #[default]
    #[serde(alias = "agendado", alias = "scheduled")]
    Scheduled,
    #[serde(alias = "concluido", alias = "concluded")]
    Concluded,
    #[serde(alias = "cancelado", alias = "cancelled")]
    Cancelled,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Match {
    pub id: Uuid,
    pub opponent: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub status: MatchStatus,
    pub our_score: u32,
    pub opponent_score: u32,
    /// Goals per player. Only attending players, never a zero count.
    pub scorers: BTreeMap<Uuid, u32>,
    pub attendance: BTreeSet<Uuid>,
    pub updated_by: Option<String>,
}

impl Match {
    pub fn new(opponent: String, date: DateTime<Utc>, location: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            opponent,
            date,
            location,
            status: MatchStatus::default(),
            our_score: 0,
            opponent_score: 0,
            scorers: BTreeMap::new(),
            attendance: BTreeSet::new(),
            updated_by: None,
        }
    }

    pub fn is_concluded(&self) -> bool {
        self.status == MatchStatus::Concluded
    }

    pub fn scored_goals(&self) -> u32 {
        self.scorers.values().sum()
    }

    /// Brings the scout in line with attendance and status.
    ///
    /// Zero counts and absent scorers are dropped. A match that is not
    /// concluded carries no scout; a concluded one takes its score from it.
    pub fn normalize(&mut self) {
        let attendance = &self.attendance;
        self.scorers
            .retain(|id, goals| *goals > 0 && attendance.contains(id));

        if self.is_concluded() {
            self.our_score = self.scored_goals();
        } else {
            self.scorers.clear();
        }
    }

    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}
