use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ClubError;
use crate::model::matches::{Match, MatchStatus};
use crate::model::player::{Player, Position, UniformSize};
use crate::repository::record::{MatchRecord, PlayerRecord};
use crate::service::ledger;
use crate::time::{parse_timestamp, MonthKey};

/// Turns a stored player row into a [`Player`].
///
/// Missing optional fields fall back to zero / `M` / not a guest / no
/// payments. `monthly_fee_paid` is projected from the history for the month
/// of `now`.
pub fn map_player(record: PlayerRecord, now: DateTime<Utc>) -> Result<Player> {
    let id = record
        .id
        .ok_or_else(|| ClubError::InvalidRecord("player row without id".into()))?;
    let name = record
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ClubError::InvalidRecord(format!("player {} has no name", id)))?;
    let position: Position = match record.position.as_deref() {
        Some(raw) => parse_label(raw, "position", id)?,
        None => {
            return Err(ClubError::InvalidRecord(format!("player {} has no position", id)).into())
        }
    };
    let uniform_size: UniformSize = match record.uniform_size.as_deref() {
        Some(raw) => parse_label(raw, "uniform_size", id)?,
        None => UniformSize::default(),
    };

    let mut payment_history = BTreeSet::new();
    for raw in record.payment_history.unwrap_or_default() {
        match raw.parse::<MonthKey>() {
            Ok(key) => {
                payment_history.insert(key);
            }
            Err(e) => warn!("Skipping payment entry '{}' of player {}: {}", raw, id, e),
        }
    }

    let mut player = Player {
        id,
        name,
        position,
        shirt_number: count(record.shirt_number, "shirt_number", id)?,
        uniform_size,
        is_guest: record.is_guest.unwrap_or(false),
        goals: count(record.goals, "goals", id)?,
        games: count(record.games, "games", id)?,
        payment_history,
        monthly_fee_paid: false,
        added_at: record.added_at.unwrap_or(now),
        updated_by: record.updated_by,
    };
    player.enforce_guest_invariant();
    ledger::refresh_fee_status(&mut player, now);
    Ok(player)
}

/// Turns a stored match row into a [`Match`]. Scores default to 0, scout and
/// attendance to empty.
pub fn map_match(record: MatchRecord) -> Result<Match> {
    let id = record
        .id
        .ok_or_else(|| ClubError::InvalidRecord("match row without id".into()))?;
    let opponent = record
        .opponent
        .filter(|o| !o.trim().is_empty())
        .ok_or_else(|| ClubError::InvalidRecord(format!("match {} has no opponent", id)))?;
    let date = record
        .date
        .as_deref()
        .ok_or_else(|| ClubError::InvalidRecord(format!("match {} has no date", id)))
        .and_then(|raw| {
            parse_timestamp(raw).map_err(|e| {
                ClubError::InvalidRecord(format!("match {} has a bad date: {}", id, e))
            })
        })?;
    let status: MatchStatus = match record.status.as_deref() {
        Some(raw) => parse_label(raw, "status", id)?,
        None => MatchStatus::default(),
    };

    let mut scorers = BTreeMap::new();
    for (raw_id, goals) in record.scorers.unwrap_or_default() {
        let Some(player_id) = parse_ref(&raw_id, id) else {
            continue;
        };
        let goals = count(Some(goals), "scorers", id)?;
        if goals > 0 {
            scorers.insert(player_id, goals);
        }
    }
    let attendance: BTreeSet<Uuid> = record
        .attendance
        .unwrap_or_default()
        .iter()
        .filter_map(|raw| parse_ref(raw, id))
        .collect();

    Ok(Match {
        id,
        opponent,
        date,
        location: record.location.unwrap_or_default(),
        status,
        our_score: count(record.our_score, "our_score", id)?,
        opponent_score: count(record.opponent_score, "opponent_score", id)?,
        scorers,
        attendance,
        updated_by: record.updated_by,
    })
}

/// Maps every row that passes validation; broken rows are logged and left out.
pub fn map_players(records: Vec<PlayerRecord>, now: DateTime<Utc>) -> Vec<Player> {
    let total = records.len();
    let players: Vec<Player> = records
        .into_iter()
        .filter_map(|r| match map_player(r, now) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Skipping player row: {}", e);
                None
            }
        })
        .collect();
    debug!("Mapped {}/{} player rows", players.len(), total);
    players
}

pub fn map_matches(records: Vec<MatchRecord>) -> Vec<Match> {
    let total = records.len();
    let matches: Vec<Match> = records
        .into_iter()
        .filter_map(|r| match map_match(r) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("Skipping match row: {}", e);
                None
            }
        })
        .collect();
    debug!("Mapped {}/{} match rows", matches.len(), total);
    matches
}

/// Full row for an upsert. `monthly_fee_paid` is derived and never stored.
pub fn player_to_record(player: &Player) -> PlayerRecord {
    PlayerRecord {
        id: Some(player.id),
        name: Some(player.name.clone()),
        position: Some(player.position.to_string()),
        shirt_number: (!player.is_guest).then_some(player.shirt_number as i64),
        uniform_size: (!player.is_guest).then(|| player.uniform_size.to_string()),
        is_guest: Some(player.is_guest),
        goals: Some(player.goals as i64),
        games: Some(player.games as i64),
        payment_history: Some(player.payment_history.iter().map(|m| m.to_string()).collect()),
        added_at: Some(player.added_at),
        updated_by: player.updated_by.clone(),
    }
}

/// Copies history entries of `stored` that are not valid month keys onto
/// `record`, so a rewrite of the row never loses them.
pub fn carry_unparsed_history(stored: &PlayerRecord, record: &mut PlayerRecord) {
    let unparsed = stored
        .payment_history
        .iter()
        .flatten()
        .filter(|raw| raw.parse::<MonthKey>().is_err())
        .cloned();
    record.payment_history.get_or_insert_with(Vec::new).extend(unparsed);
}

pub fn match_to_record(m: &Match) -> MatchRecord {
    MatchRecord {
        id: Some(m.id),
        opponent: Some(m.opponent.clone()),
        date: Some(m.date.to_rfc3339()),
        location: Some(m.location.clone()),
        status: Some(m.status.to_string()),
        our_score: Some(m.our_score as i64),
        opponent_score: Some(m.opponent_score as i64),
        scorers: Some(
            m.scorers
                .iter()
                .map(|(id, goals)| (id.to_string(), *goals as i64))
                .collect(),
        ),
        attendance: Some(m.attendance.iter().map(|id| id.to_string()).collect()),
        updated_by: m.updated_by.clone(),
    }
}

fn parse_label<T: DeserializeOwned>(raw: &str, field: &str, id: Uuid) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|_| {
        ClubError::InvalidRecord(format!("{} '{}' of row {} is not recognised", field, raw, id))
            .into()
    })
}

fn count(value: Option<i64>, field: &str, id: Uuid) -> Result<u32> {
    let value = value.unwrap_or(0);
    u32::try_from(value).map_err(|_| {
        ClubError::InvalidRecord(format!("{} of row {} is out of range: {}", field, id, value))
            .into()
    })
}

fn parse_ref(raw: &str, match_id: Uuid) -> Option<Uuid> {
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("Ignoring bad player reference '{}' in match {}", raw, match_id);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn bare_player(id: Uuid) -> PlayerRecord {
        PlayerRecord {
            id: Some(id),
            name: Some("Rafa".into()),
            position: Some("Atacante".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_map_player_defaults() {
        let id = Uuid::new_v4();
        let p = map_player(bare_player(id), now()).unwrap();
        assert_eq!(p.id, id);
        assert_eq!(p.position, Position::Forward);
        assert_eq!(p.goals, 0);
        assert_eq!(p.games, 0);
        assert_eq!(p.shirt_number, 0);
        assert_eq!(p.uniform_size, UniformSize::M);
        assert!(!p.is_guest);
        assert!(p.payment_history.is_empty());
        assert!(!p.monthly_fee_paid);
        assert_eq!(p.added_at, now());
    }

    #[test]
    fn test_map_player_projects_current_month() {
        let mut rec = bare_player(Uuid::new_v4());
        rec.payment_history = Some(vec!["2025-01".into(), "2025-03".into(), "2025-03".into()]);
        let p = map_player(rec, now()).unwrap();
        assert!(p.monthly_fee_paid);
        assert_eq!(p.payment_history.len(), 2);
        assert_eq!(
            p.monthly_fee_paid,
            ledger::is_paid(&p, &ledger::current_month_key(now()))
        );
    }

    #[test]
    fn test_map_player_skips_malformed_months() {
        let mut rec = bare_player(Uuid::new_v4());
        rec.payment_history = Some(vec!["March".into(), "2025-02".into()]);
        let p = map_player(rec, now()).unwrap();
        let months: Vec<String> = p.payment_history.iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2025-02"]);
    }

    #[test]
    fn test_map_guest_is_inert() {
        let mut rec = bare_player(Uuid::new_v4());
        rec.is_guest = Some(true);
        rec.shirt_number = Some(10);
        rec.uniform_size = Some("GG".into());
        rec.payment_history = Some(vec!["2025-03".into()]);
        let p = map_player(rec, now()).unwrap();
        assert!(p.is_guest);
        assert_eq!(p.shirt_number, 0);
        assert_eq!(p.uniform_size, UniformSize::M);
        assert!(!p.monthly_fee_paid);
    }

    #[test]
    fn test_map_player_rejects_bad_rows() {
        let mut no_id = bare_player(Uuid::new_v4());
        no_id.id = None;
        assert!(map_player(no_id, now()).is_err());

        let mut bad_pos = bare_player(Uuid::new_v4());
        bad_pos.position = Some("Sweeper".into());
        let err = map_player(bad_pos, now()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClubError>(),
            Some(ClubError::InvalidRecord(_))
        ));

        let mut negative = bare_player(Uuid::new_v4());
        negative.goals = Some(-1);
        assert!(map_player(negative, now()).is_err());
    }

    #[test]
    fn test_map_players_keeps_valid_rows() {
        let mut broken = bare_player(Uuid::new_v4());
        broken.name = None;
        let players = map_players(vec![bare_player(Uuid::new_v4()), broken], now());
        assert_eq!(players.len(), 1);
    }

    #[test]
    fn test_map_match_defaults_and_refs() {
        let id = Uuid::new_v4();
        let scorer = Uuid::new_v4();
        let rec = MatchRecord {
            id: Some(id),
            opponent: Some("Rivals".into()),
            date: Some("2025-03-01T20:00".into()),
            status: Some("concluido".into()),
            scorers: Some(
                [(scorer.to_string(), 2), ("not-an-id".to_string(), 1)]
                    .into_iter()
                    .collect(),
            ),
            attendance: Some(vec![scorer.to_string(), "junk".into()]),
            ..Default::default()
        };
        let m = map_match(rec).unwrap();
        assert_eq!(m.status, MatchStatus::Concluded);
        assert_eq!(m.date, Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap());
        assert_eq!(m.our_score, 0);
        assert_eq!(m.opponent_score, 0);
        assert_eq!(m.location, "");
        assert_eq!(m.scorers.get(&scorer), Some(&2));
        assert_eq!(m.scorers.len(), 1);
        assert_eq!(m.attendance.len(), 1);
    }

    #[test]
    fn test_map_match_empty_collections() {
        let rec = MatchRecord {
            id: Some(Uuid::new_v4()),
            opponent: Some("Rivals".into()),
            date: Some("2025-03-01".into()),
            ..Default::default()
        };
        let m = map_match(rec).unwrap();
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert!(m.scorers.is_empty());
        assert!(m.attendance.is_empty());
    }

    #[test]
    fn test_records_map_back() {
        let mut p = Player::new("Rafa".into(), Position::Midfielder, 8);
        p.payment_history.insert("2025-03".parse().unwrap());
        p.goals = 4;
        let back = map_player(player_to_record(&p), now()).unwrap();
        assert_eq!(back.goals, 4);
        assert_eq!(back.shirt_number, 8);
        assert!(back.monthly_fee_paid);

        let mut m = Match::new("Rivals".into(), now(), "Away".into());
        m.status = MatchStatus::Concluded;
        m.attendance.insert(p.id);
        m.scorers.insert(p.id, 1);
        let back = map_match(match_to_record(&m)).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_guest_record_has_no_shirt() {
        let g = Player::guest("Visitor".into(), Position::Defender);
        let rec = player_to_record(&g);
        assert_eq!(rec.shirt_number, None);
        assert_eq!(rec.uniform_size, None);
    }

    #[test]
    fn test_carry_unparsed_history() {
        let id = Uuid::new_v4();
        let mut stored = bare_player(id);
        stored.payment_history = Some(vec!["2025-01".into(), "2025-3".into(), "junk".into()]);

        let player = map_player(stored.clone(), now()).unwrap();
        let mut record = player_to_record(&player);
        carry_unparsed_history(&stored, &mut record);

        assert_eq!(
            record.payment_history,
            Some(vec!["2025-01".to_string(), "2025-3".to_string(), "junk".to_string()])
        );
    }
}
