use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info};
use uuid::Uuid;

use crate::config::ClubConfig;
use crate::error::ClubError;
use crate::model::matches::Match;
use crate::model::player::Player;
use crate::model::stats::{Dashboard, MonthlyFinances};
use crate::repository::mapper::{
    carry_unparsed_history, map_match, map_matches, map_player, map_players, match_to_record,
    player_to_record,
};
use crate::repository::{MatchRepository, PlayerRepository};
use crate::service::dto::{ClubSnapshot, MatchForm, PlayerForm};
use crate::service::ledger;
use crate::service::match_sync::{MatchStatsSync, SyncReport};
use crate::service::stats_service;
use crate::time::MonthKey;

/// Entry point for the collaborator: every mutation goes through here so the
/// derived fields are recomputed in the right order.
pub struct ClubService<P: PlayerRepository, M: MatchRepository> {
    players: P,
    matches: M,
    config: ClubConfig,
}

impl<P: PlayerRepository, M: MatchRepository> ClubService<P, M> {
    pub fn new(players: P, matches: M, config: ClubConfig) -> Self {
        Self {
            players,
            matches,
            config,
        }
    }

    pub fn config(&self) -> &ClubConfig {
        &self.config
    }

    /// Both collections, mapped. Players by name, matches newest first.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Result<ClubSnapshot> {
        let mut players = map_players(self.players.list()?, now);
        let mut matches = map_matches(self.matches.list()?);

        players.sort_by_cached_key(|p| p.name.to_lowercase());
        matches.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(ClubSnapshot { players, matches })
    }

    pub fn get_player(&self, id: &Uuid, now: DateTime<Utc>) -> Result<Player> {
        map_player(self.players.get(id)?, now)
    }

    pub fn get_match(&self, id: &Uuid) -> Result<Match> {
        map_match(self.matches.get(id)?)
    }

    /// Creates (`id = None`) or edits a player.
    ///
    /// Editing keeps the payment history and `added_at`. Goals and games from
    /// the form only stick while no match has been concluded; after that the
    /// stats sync owns them.
    pub fn save_player(
        &self,
        id: Option<Uuid>,
        form: &PlayerForm,
        now: DateTime<Utc>,
    ) -> Result<Player> {
        form.validate()?;
        let snapshot = self.snapshot(now)?;

        if !form.is_guest {
            let taken = snapshot.players.iter().find(|p| {
                !p.is_guest && p.shirt_number == form.shirt_number && Some(p.id) != id
            });
            if let Some(holder) = taken {
                return Err(ClubError::validation(format!(
                    "shirt number {} is already worn by {}",
                    form.shirt_number, holder.name
                ))
                .into());
            }
        }

        let mut player = match id {
            Some(id) => snapshot
                .player(&id)
                .cloned()
                .ok_or(ClubError::player_not_found(id))?,
            None => {
                let mut p = Player::new(form.name.clone(), form.position, form.shirt_number);
                p.added_at = now;
                p
            }
        };
        form.apply_to(&mut player);

        if snapshot.has_concluded_matches() {
            if form.goals.is_some() || form.games.is_some() {
                debug!("Ignoring hand-entered totals for {}: matches own them", player.name);
            }
        } else {
            if let Some(goals) = form.goals {
                player.goals = goals;
            }
            if let Some(games) = form.games {
                player.games = games;
            }
        }

        player.updated_by = Some(self.config.editor.clone());
        ledger::refresh_fee_status(&mut player, now);

        let mut record = player_to_record(&player);
        if let Some(id) = id {
            carry_unparsed_history(&self.players.get(&id)?, &mut record);
        }
        let saved = self.players.upsert(record)?;
        info!("Saved player {} ({})", player.name, player.short_id());
        map_player(saved, now)
    }

    pub fn delete_player(&self, id: &Uuid) -> Result<()> {
        self.players.delete(id)?;
        info!("Deleted player {}", id);
        Ok(())
    }

    /// Flips one month of dues (the current one by default). Guests come back
    /// unchanged and nothing is written.
    pub fn toggle_payment(
        &self,
        id: &Uuid,
        month: Option<MonthKey>,
        now: DateTime<Utc>,
    ) -> Result<Player> {
        let stored = self.players.get(id)?;
        let mut player = map_player(stored.clone(), now)?;
        let month = month.unwrap_or_else(|| ledger::current_month_key(now));

        if !ledger::apply_toggle(&mut player, month, now) {
            debug!("Player {} is a guest, payment toggle skipped", player.name);
            return Ok(player);
        }

        player.updated_by = Some(self.config.editor.clone());
        let mut record = player_to_record(&player);
        carry_unparsed_history(&stored, &mut record);
        self.players.upsert(record)?;
        info!(
            "Payment {} for {} is now {}",
            month,
            player.name,
            if ledger::is_paid(&player, &month) { "paid" } else { "open" }
        );
        Ok(player)
    }

    /// Creates or edits a match, then resyncs every player's totals.
    pub fn save_match(&self, id: Option<Uuid>, form: MatchForm) -> Result<(Match, SyncReport)> {
        form.validate()?;
        let id = match id {
            Some(id) => {
                self.matches.get(&id)?;
                id
            }
            None => Uuid::new_v4(),
        };

        let mut m = form.into_match(id);
        m.updated_by = Some(self.config.editor.clone());
        self.matches.upsert(match_to_record(&m))?;
        info!("Saved match vs {} ({})", m.opponent, m.short_id());

        let report = self.sync_stats()?;
        Ok((m, report))
    }

    /// Deletes a match, then resyncs. Goals it contributed disappear with it.
    pub fn delete_match(&self, id: &Uuid) -> Result<SyncReport> {
        self.matches.delete(id)?;
        info!("Deleted match {}", id);
        self.sync_stats()
    }

    pub fn sync_stats(&self) -> Result<SyncReport> {
        MatchStatsSync::new(&self.players, &self.matches, &self.config.editor).run()
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> Result<Dashboard> {
        let snapshot = self.snapshot(now)?;
        Ok(stats_service::dashboard(
            &snapshot.players,
            &snapshot.matches,
            now,
            &self.config,
        ))
    }

    pub fn finances(&self, month: Option<MonthKey>, now: DateTime<Utc>) -> Result<MonthlyFinances> {
        let snapshot = self.snapshot(now)?;
        let month = month.unwrap_or_else(|| ledger::current_month_key(now));
        Ok(stats_service::monthly_finances(
            &snapshot.players,
            month,
            self.config.monthly_fee,
        ))
    }
}
