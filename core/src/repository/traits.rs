use anyhow::Result;
use uuid::Uuid;

use crate::repository::record::{MatchRecord, PlayerRecord};

/// Backing store for the roster. Writes always carry the full row.
pub trait PlayerRepository {
    fn list(&self) -> Result<Vec<PlayerRecord>>;
    fn get(&self, id: &Uuid) -> Result<PlayerRecord>;
    /// Inserts or replaces by id. Rows without an id get a fresh one.
    fn upsert(&self, record: PlayerRecord) -> Result<PlayerRecord>;
    fn delete(&self, id: &Uuid) -> Result<()>;
}

pub trait MatchRepository {
    fn list(&self) -> Result<Vec<MatchRecord>>;
    fn get(&self, id: &Uuid) -> Result<MatchRecord>;
    fn upsert(&self, record: MatchRecord) -> Result<MatchRecord>;
    fn delete(&self, id: &Uuid) -> Result<()>;
}
