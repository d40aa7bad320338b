use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::config::resolve_data_dir;
use crate::error::ClubError;
use crate::repository::record::{Keyed, MatchRecord, PlayerRecord};
use crate::repository::traits::{MatchRepository, PlayerRepository};

const PLAYERS_FILE_NAME: &str = "players.json";
const MATCHES_FILE_NAME: &str = "matches.json";

/// A JSON array of rows in one file, rewritten whole on every change.
#[derive(Clone)]
struct JsonTable<T> {
    file_path: PathBuf,
    _row: PhantomData<T>,
}

impl<T> JsonTable<T>
where
    T: Serialize + DeserializeOwned + Keyed + Clone,
{
    fn open(dir: &Path, file_name: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let file_path = dir.join(file_name);

        // Start with an empty array
        if !file_path.exists() {
            let mut writer = BufWriter::new(File::create(&file_path)?);
            serde_json::to_writer_pretty(&mut writer, &Vec::<T>::new())?;
            writer.flush()?;
        }

        Ok(Self {
            file_path,
            _row: PhantomData,
        })
    }

    fn read_rows(&self) -> Result<Vec<T>> {
        let file = File::open(&self.file_path)?;
        let reader = BufReader::new(file);
        let rows = serde_json::from_reader(reader)?;
        Ok(rows)
    }

    fn write_rows(&self, rows: &[T]) -> Result<()> {
        let file = File::create(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, rows)?;
        writer.flush()?;
        Ok(())
    }

    fn find(&self, id: &Uuid) -> Result<Option<T>> {
        Ok(self.read_rows()?.into_iter().find(|r| r.key() == Some(*id)))
    }

    fn upsert(&self, mut row: T) -> Result<T> {
        let mut rows = self.read_rows()?;
        let id = match row.key() {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                row.set_key(id);
                id
            }
        };

        // Replace in place, else append
        if let Some(pos) = rows.iter().position(|r| r.key() == Some(id)) {
            rows[pos] = row.clone();
        } else {
            rows.push(row.clone());
        }
        self.write_rows(&rows)?;
        debug!("Wrote row {} to {}", id, self.file_path.display());
        Ok(row)
    }

    /// Returns false when no row had this id.
    fn delete(&self, id: &Uuid) -> Result<bool> {
        let mut rows = self.read_rows()?;
        let initial_len = rows.len();
        rows.retain(|r| r.key() != Some(*id));

        if rows.len() == initial_len {
            return Ok(false);
        }

        self.write_rows(&rows)?;
        Ok(true)
    }
}

#[derive(Clone)]
pub struct FilePlayerRepository {
    table: JsonTable<PlayerRecord>,
}

impl FilePlayerRepository {
    /// Opens `players.json` under `base_dir`, or under the default data
    /// directory when none is given.
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let dir = resolve_data_dir(base_dir)?;
        Ok(Self {
            table: JsonTable::open(&dir, PLAYERS_FILE_NAME)?,
        })
    }
}

impl PlayerRepository for FilePlayerRepository {
    fn list(&self) -> Result<Vec<PlayerRecord>> {
        self.table.read_rows()
    }

    fn get(&self, id: &Uuid) -> Result<PlayerRecord> {
        self.table
            .find(id)?
            .ok_or_else(|| ClubError::player_not_found(*id).into())
    }

    fn upsert(&self, record: PlayerRecord) -> Result<PlayerRecord> {
        self.table.upsert(record)
    }

    fn delete(&self, id: &Uuid) -> Result<()> {
        if !self.table.delete(id)? {
            return Err(ClubError::player_not_found(*id).into());
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct FileMatchRepository {
    table: JsonTable<MatchRecord>,
}

impl FileMatchRepository {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let dir = resolve_data_dir(base_dir)?;
        Ok(Self {
            table: JsonTable::open(&dir, MATCHES_FILE_NAME)?,
        })
    }
}

impl MatchRepository for FileMatchRepository {
    fn list(&self) -> Result<Vec<MatchRecord>> {
        self.table.read_rows()
    }

    fn get(&self, id: &Uuid) -> Result<MatchRecord> {
        self.table
            .find(id)?
            .ok_or_else(|| ClubError::match_not_found(*id).into())
    }

    fn upsert(&self, record: MatchRecord) -> Result<MatchRecord> {
        self.table.upsert(record)
    }

    fn delete(&self, id: &Uuid) -> Result<()> {
        if !self.table.delete(id)? {
            return Err(ClubError::match_not_found(*id).into());
        }
        Ok(())
    }
}
