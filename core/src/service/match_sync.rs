//! Lifetime goals and games, rebuilt from concluded matches.
//!
//! Always a full recompute: matches can be edited or deleted after the fact,
//! so totals are never adjusted by deltas. A player who appears in no
//! concluded match ends at zero.

use std::collections::HashMap;

use anyhow::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::matches::Match;
use crate::model::player::Player;
use crate::model::stats::StatTotals;
use crate::repository::mapper::map_matches;
use crate::repository::{MatchRepository, PlayerRecord, PlayerRepository};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatUpdate {
    pub player_id: Uuid,
    pub goals: u32,
    pub games: u32,
}

/// Outcome of a write-back batch. Failed writes are not rolled back; the next
/// successful sync repairs them.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub updated: usize,
    pub failed: Vec<(Uuid, String)>,
    /// Stored rows without an id, which cannot be written back.
    #[serde(default)]
    pub skipped: usize,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }
}

/// Totals per player id over concluded matches only.
pub fn accumulate(matches: &[Match]) -> HashMap<Uuid, StatTotals> {
    let mut totals: HashMap<Uuid, StatTotals> = HashMap::new();

    for m in matches.iter().filter(|m| m.is_concluded()) {
        for (player_id, goals) in &m.scorers {
            totals.entry(*player_id).or_default().add_goals(*goals);
        }
        for player_id in &m.attendance {
            totals.entry(*player_id).or_default().add_game();
        }
    }
    totals
}

/// One update per known player, in roster order. Ids in matches that belong
/// to no known player are dropped.
pub fn recompute(players: &[Player], matches: &[Match]) -> Vec<StatUpdate> {
    recompute_for(players.iter().map(|p| p.id), matches)
}

/// Same as [`recompute`], keyed by bare player ids.
pub fn recompute_for(
    player_ids: impl IntoIterator<Item = Uuid>,
    matches: &[Match],
) -> Vec<StatUpdate> {
    let totals = accumulate(matches);
    debug!(
        "Recomputed totals for {} ids over {} matches",
        totals.len(),
        matches.len()
    );

    player_ids
        .into_iter()
        .map(|player_id| {
            let t = totals.get(&player_id).copied().unwrap_or_default();
            StatUpdate {
                player_id,
                goals: t.goals,
                games: t.games,
            }
        })
        .collect()
}

pub struct MatchStatsSync<'a, P: PlayerRepository, M: MatchRepository> {
    player_repo: &'a P,
    match_repo: &'a M,
    editor: &'a str,
}

impl<'a, P: PlayerRepository, M: MatchRepository> MatchStatsSync<'a, P, M> {
    pub fn new(player_repo: &'a P, match_repo: &'a M, editor: &'a str) -> Self {
        Self {
            player_repo,
            match_repo,
            editor,
        }
    }

    /// Fetches both collections, recomputes and writes every player back.
    ///
    /// Only `goals`, `games` and `updated_by` are touched; every other field
    /// of the stored row is written back as it was read, including rows the
    /// mapper would reject. Only the fetch can fail the call. Individual
    /// write failures are collected in the report and the batch carries on.
    pub fn run(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        // 1. Rows as stored
        let mut records: Vec<PlayerRecord> = Vec::new();
        for record in self.player_repo.list()? {
            if record.id.is_some() {
                records.push(record);
            } else {
                warn!("Player row without id left out of the stats sync");
                report.skipped += 1;
            }
        }

        // 2. Totals from concluded matches
        let matches = map_matches(self.match_repo.list()?);
        let updates = recompute_for(records.iter().filter_map(|r| r.id), &matches);

        // 3. Write back
        for (mut record, update) in records.into_iter().zip(updates) {
            record.goals = Some(update.goals as i64);
            record.games = Some(update.games as i64);
            record.updated_by = Some(self.editor.to_string());

            match self.player_repo.upsert(record) {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    warn!("Could not write stats for player {}: {}", update.player_id, e);
                    report.failed.push((update.player_id, e.to_string()));
                }
            }
        }

        info!(
            "Stats sync wrote {} players, {} failed, {} skipped",
            report.updated,
            report.failed.len(),
            report.skipped
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::matches::MatchStatus;
    use crate::model::player::Position;
    use crate::repository::mapper::{match_to_record, player_to_record};
    use crate::repository::MatchRecord;
    use anyhow::anyhow;
    use chrono::Utc;
    use std::cell::RefCell;

    fn player(name: &str) -> Player {
        Player::new(name.into(), Position::Forward, 1)
    }

    fn concluded(scorers: &[(&Player, u32)], attendance: &[&Player]) -> Match {
        let mut m = Match::new("Rivals".into(), Utc::now(), "Home".into());
        m.status = MatchStatus::Concluded;
        m.attendance = attendance.iter().map(|p| p.id).collect();
        m.scorers = scorers.iter().map(|(p, g)| (p.id, *g)).collect();
        m.normalize();
        m
    }

    fn totals_of(updates: &[StatUpdate], p: &Player) -> (u32, u32) {
        let u = updates.iter().find(|u| u.player_id == p.id).unwrap();
        (u.goals, u.games)
    }

    #[test]
    fn test_single_match_scenario() {
        let (a, b, c, d) = (player("A"), player("B"), player("C"), player("D"));
        let m = concluded(&[(&a, 2), (&b, 1)], &[&a, &b, &c]);
        let updates = recompute(&[a.clone(), b.clone(), c.clone(), d.clone()], &[m]);

        assert_eq!(updates.len(), 4);
        assert_eq!(totals_of(&updates, &a), (2, 1));
        assert_eq!(totals_of(&updates, &b), (1, 1));
        assert_eq!(totals_of(&updates, &c), (0, 1));
        assert_eq!(totals_of(&updates, &d), (0, 0));
    }

    #[test]
    fn test_only_concluded_matches_count() {
        let a = player("A");
        let mut scheduled = concluded(&[(&a, 3)], &[&a]);
        scheduled.status = MatchStatus::Scheduled;
        let mut cancelled = concluded(&[(&a, 3)], &[&a]);
        cancelled.status = MatchStatus::Cancelled;
        let played = concluded(&[(&a, 1)], &[&a]);

        let updates = recompute(&[a.clone()], &[scheduled, cancelled, played]);
        assert_eq!(totals_of(&updates, &a), (1, 1));
    }

    #[test]
    fn test_full_recompute_zeroes_stale_stats() {
        let mut a = player("A");
        a.goals = 40;
        a.games = 12;
        let updates = recompute(&[a.clone()], &[]);
        assert_eq!(totals_of(&updates, &a), (0, 0));
    }

    #[test]
    fn test_totals_match_definition() {
        let (a, b) = (player("A"), player("B"));
        let matches = vec![
            concluded(&[(&a, 2)], &[&a, &b]),
            concluded(&[(&a, 1), (&b, 4)], &[&a, &b]),
            concluded(&[], &[&b]),
        ];
        let updates = recompute(&[a.clone(), b.clone()], &matches);
        for p in [&a, &b] {
            let goals: u32 = matches
                .iter()
                .filter(|m| m.is_concluded())
                .filter_map(|m| m.scorers.get(&p.id))
                .sum();
            let games = matches
                .iter()
                .filter(|m| m.is_concluded() && m.attendance.contains(&p.id))
                .count() as u32;
            assert_eq!(totals_of(&updates, p), (goals, games));
        }
    }

    #[test]
    fn test_unknown_ids_are_dropped() {
        let a = player("A");
        let ghost = player("Ghost");
        let m = concluded(&[(&ghost, 2)], &[&ghost, &a]);
        let updates = recompute(&[a.clone()], &[m]);
        assert_eq!(updates.len(), 1);
        assert_eq!(totals_of(&updates, &a), (0, 1));
    }

    struct FlakyPlayerRepo {
        rows: RefCell<Vec<PlayerRecord>>,
        reject: Option<Uuid>,
    }

    impl PlayerRepository for FlakyPlayerRepo {
        fn list(&self) -> Result<Vec<PlayerRecord>> { Ok(self.rows.borrow().clone()) }
        fn get(&self, _id: &Uuid) -> Result<PlayerRecord> { unimplemented!() }
        fn upsert(&self, record: PlayerRecord) -> Result<PlayerRecord> {
            if record.id == self.reject {
                return Err(anyhow!("store unavailable"));
            }
            let mut rows = self.rows.borrow_mut();
            if let Some(pos) = rows.iter().position(|r| r.id == record.id) {
                rows[pos] = record.clone();
            }
            Ok(record)
        }
        fn delete(&self, _id: &Uuid) -> Result<()> { unimplemented!() }
    }

    struct FixedMatchRepo(Vec<MatchRecord>);

    impl MatchRepository for FixedMatchRepo {
        fn list(&self) -> Result<Vec<MatchRecord>> { Ok(self.0.clone()) }
        fn get(&self, _id: &Uuid) -> Result<MatchRecord> { unimplemented!() }
        fn upsert(&self, _record: MatchRecord) -> Result<MatchRecord> { unimplemented!() }
        fn delete(&self, _id: &Uuid) -> Result<()> { unimplemented!() }
    }

    #[test]
    fn test_run_continues_past_failed_writes() {
        let (a, b) = (player("A"), player("B"));
        let m = concluded(&[(&a, 2), (&b, 1)], &[&a, &b]);
        let players = FlakyPlayerRepo {
            rows: RefCell::new(vec![player_to_record(&a), player_to_record(&b)]),
            reject: Some(a.id),
        };
        let matches = FixedMatchRepo(vec![match_to_record(&m)]);

        let report = MatchStatsSync::new(&players, &matches, "Treasurer").run().unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, a.id);
        assert!(!report.is_complete());

        let rows = players.rows.borrow();
        let stored_b = rows.iter().find(|r| r.id == Some(b.id)).unwrap();
        assert_eq!(stored_b.goals, Some(1));
        assert_eq!(stored_b.games, Some(1));
        assert_eq!(stored_b.updated_by.as_deref(), Some("Treasurer"));
        let stored_a = rows.iter().find(|r| r.id == Some(a.id)).unwrap();
        assert_eq!(stored_a.goals, Some(0));
    }

    fn flaky(rows: Vec<PlayerRecord>) -> FlakyPlayerRepo {
        FlakyPlayerRepo {
            rows: RefCell::new(rows),
            reject: None,
        }
    }

    #[test]
    fn test_run_leaves_payment_history_untouched() {
        let a = player("A");
        let mut stored = player_to_record(&a);
        stored.payment_history = Some(vec!["2025-03".into(), "2025-3".into()]);
        let players = flaky(vec![stored]);
        let matches = FixedMatchRepo(vec![match_to_record(&concluded(&[(&a, 1)], &[&a]))]);

        let report = MatchStatsSync::new(&players, &matches, "Treasurer").run().unwrap();

        assert!(report.is_complete());
        let rows = players.rows.borrow();
        assert_eq!(
            rows[0].payment_history,
            Some(vec!["2025-03".to_string(), "2025-3".to_string()])
        );
        assert_eq!((rows[0].goals, rows[0].games), (Some(1), Some(1)));
    }

    #[test]
    fn test_run_repairs_rows_the_mapper_rejects() {
        let (a, b) = (player("A"), player("B"));
        let mut broken = player_to_record(&b);
        broken.goals = Some(-1);
        broken.games = Some(7);
        let players = flaky(vec![player_to_record(&a), broken]);
        let matches = FixedMatchRepo(vec![match_to_record(&concluded(&[(&b, 2)], &[&a, &b]))]);

        let report = MatchStatsSync::new(&players, &matches, "Treasurer").run().unwrap();

        assert_eq!(report.updated, 2);
        assert!(report.is_complete());
        let rows = players.rows.borrow();
        let stored_b = rows.iter().find(|r| r.id == Some(b.id)).unwrap();
        assert_eq!((stored_b.goals, stored_b.games), (Some(2), Some(1)));
    }

    #[test]
    fn test_run_reports_rows_without_id() {
        let a = player("A");
        let anonymous = PlayerRecord {
            name: Some("Nobody".into()),
            goals: Some(3),
            ..Default::default()
        };
        let players = flaky(vec![player_to_record(&a), anonymous]);
        let matches = FixedMatchRepo(vec![]);

        let report = MatchStatsSync::new(&players, &matches, "Treasurer").run().unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert!(!report.is_complete());
    }
}
