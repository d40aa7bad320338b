//! Wire-shaped rows as the backing store keeps them.
//!
//! Everything except the id is optional and loosely typed here; the mapper is
//! the only place that turns these into [`crate::model`] types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PlayerRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub position: Option<String>,
    pub shirt_number: Option<i64>,
    pub uniform_size: Option<String>,
    pub is_guest: Option<bool>,
    pub goals: Option<i64>,
    pub games: Option<i64>,
    pub payment_history: Option<Vec<String>>,
    pub added_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MatchRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub opponent: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub our_score: Option<i64>,
    pub opponent_score: Option<i64>,
    pub scorers: Option<BTreeMap<String, i64>>,
    pub attendance: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Rows the file store can key by id.
pub trait Keyed {
    fn key(&self) -> Option<Uuid>;
    fn set_key(&mut self, id: Uuid);
}

impl Keyed for PlayerRecord {
    fn key(&self) -> Option<Uuid> {
        self.id
    }

    fn set_key(&mut self, id: Uuid) {
        self.id = Some(id);
    }
}

impl Keyed for MatchRecord {
    fn key(&self) -> Option<Uuid> {
        self.id
    }

    fn set_key(&mut self, id: Uuid) {
        self.id = Some(id);
    }
}
