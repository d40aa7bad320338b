use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use crate::config::ClubConfig;
use crate::model::matches::{Match, MatchStatus};
use crate::model::player::{Player, Position};
use crate::model::stats::{Dashboard, MonthlyFinances, PositionCount, TeamStats};
use crate::service::ledger;
use crate::time::MonthKey;

// Standalone functions for pure logic. None of them touch the store.

pub fn team_stats(players: &[Player], matches: &[Match], monthly_fee: f64) -> TeamStats {
    let total_goals = players.iter().map(|p| p.goals).sum();
    let total_games = matches.iter().filter(|m| m.is_concluded()).count() as u32;

    let active_players = players.iter().filter(|p| !p.is_guest).count() as u32;
    let guest_count = players.len() as u32 - active_players;
    let paid_count = players
        .iter()
        .filter(|p| !p.is_guest && p.monthly_fee_paid)
        .count() as u32;

    TeamStats {
        total_goals,
        total_games,
        active_players,
        guest_count,
        paid_count,
        payment_rate: percentage(paid_count, active_players),
        total_revenue: paid_count as f64 * monthly_fee,
        expected_revenue: active_players as f64 * monthly_fee,
    }
}

/// Earliest scheduled match at or after `now`. Ties keep input order.
pub fn next_match<'a>(matches: &'a [Match], now: DateTime<Utc>) -> Option<&'a Match> {
    matches
        .iter()
        .filter(|m| m.status == MatchStatus::Scheduled && m.date >= now)
        .fold(None, |best: Option<&Match>, m| match best {
            Some(b) if b.date <= m.date => Some(b),
            _ => Some(m),
        })
}

/// Latest concluded match. Ties go to the greatest id.
pub fn last_match(matches: &[Match]) -> Option<&Match> {
    matches
        .iter()
        .filter(|m| m.is_concluded())
        .max_by_key(|m| (m.date, m.id))
}

/// First `n` players by goals, ties in input order.
pub fn top_scorers(players: &[Player], n: usize) -> Vec<Player> {
    ranked_by(players, n, |p| p.goals)
}

/// First `n` players by games played, ties in input order.
pub fn most_games(players: &[Player], n: usize) -> Vec<Player> {
    ranked_by(players, n, |p| p.games)
}

fn ranked_by(players: &[Player], n: usize, key: impl Fn(&Player) -> u32) -> Vec<Player> {
    let mut ranked = players.to_vec();
    // sort_by_key is stable
    ranked.sort_by_key(|p| Reverse(key(p)));
    ranked.truncate(n);
    ranked
}

/// Players per position, in position order. Empty positions are left out.
pub fn position_breakdown(players: &[Player]) -> Vec<PositionCount> {
    Position::ALL
        .iter()
        .map(|pos| PositionCount {
            position: *pos,
            count: players.iter().filter(|p| p.position == *pos).count() as u32,
        })
        .filter(|c| c.count > 0)
        .collect()
}

/// Team goals per game played. With no games the divisor is 1.
pub fn goals_per_game(players: &[Player]) -> f64 {
    let goals: u32 = players.iter().map(|p| p.goals).sum();
    let games: u32 = players.iter().map(|p| p.games).sum();
    goals as f64 / games.max(1) as f64
}

/// Dues collected for any month, over non-guests.
pub fn monthly_finances(players: &[Player], month: MonthKey, monthly_fee: f64) -> MonthlyFinances {
    let members: Vec<&Player> = players.iter().filter(|p| !p.is_guest).collect();
    let active_players = members.len() as u32;
    let paid_count = members
        .iter()
        .filter(|p| ledger::is_paid(p, &month))
        .count() as u32;

    MonthlyFinances {
        month,
        active_players,
        paid_count,
        unpaid_count: active_players - paid_count,
        collected: paid_count as f64 * monthly_fee,
        expected: active_players as f64 * monthly_fee,
        progress: percentage(paid_count, active_players),
    }
}

pub fn dashboard(
    players: &[Player],
    matches: &[Match],
    now: DateTime<Utc>,
    config: &ClubConfig,
) -> Dashboard {
    Dashboard {
        stats: team_stats(players, matches, config.monthly_fee),
        next_match: next_match(matches, now).cloned(),
        last_match: last_match(matches).cloned(),
        top_scorers: top_scorers(players, config.top_n),
        month: ledger::current_month_key(now),
    }
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 100.0 / whole as f64).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn member(name: &str, goals: u32, paid: bool) -> Player {
        let mut p = Player::new(name.into(), Position::Midfielder, 1);
        p.goals = goals;
        if paid {
            p.payment_history.insert(ledger::current_month_key(now()));
        }
        ledger::refresh_fee_status(&mut p, now());
        p
    }

    fn fixture(status: MatchStatus, date: DateTime<Utc>) -> Match {
        let mut m = Match::new("Rivals".into(), date, "Home".into());
        m.status = status;
        m
    }

    #[test]
    fn test_ten_players_six_paid() {
        let players: Vec<Player> = (0..10)
            .map(|i| member(&format!("P{}", i), 0, i < 6))
            .collect();
        let stats = team_stats(&players, &[], 28.0);
        assert_eq!(stats.active_players, 10);
        assert_eq!(stats.paid_count, 6);
        assert_eq!(stats.payment_rate, 60.0);
        assert_eq!(stats.total_revenue, 168.0);
        assert_eq!(stats.expected_revenue, 280.0);
    }

    #[test]
    fn test_empty_roster_has_zero_rate() {
        let stats = team_stats(&[], &[], 28.0);
        assert_eq!(stats.payment_rate, 0.0);
        assert_eq!(stats.total_goals, 0);
        assert_eq!(stats.expected_revenue, 0.0);

        let guests = vec![Player::guest("G".into(), Position::Forward)];
        let stats = team_stats(&guests, &[], 28.0);
        assert_eq!(stats.active_players, 0);
        assert_eq!(stats.guest_count, 1);
        assert_eq!(stats.payment_rate, 0.0);
    }

    #[test]
    fn test_payment_rate_bounded() {
        for paid in 0..=4 {
            let players: Vec<Player> = (0..4)
                .map(|i| member(&format!("P{}", i), 0, i < paid))
                .collect();
            let rate = team_stats(&players, &[], 28.0).payment_rate;
            assert!((0.0..=100.0).contains(&rate));
        }
    }

    #[test]
    fn test_guest_goals_count_but_not_payments() {
        let mut guest = Player::guest("G".into(), Position::Forward);
        guest.goals = 3;
        guest.monthly_fee_paid = true; // ignored
        let players = vec![member("A", 2, true), guest];
        let matches = vec![
            fixture(MatchStatus::Concluded, now()),
            fixture(MatchStatus::Scheduled, now()),
            fixture(MatchStatus::Cancelled, now()),
        ];
        let stats = team_stats(&players, &matches, 28.0);
        assert_eq!(stats.total_goals, 5);
        assert_eq!(stats.total_games, 1);
        assert_eq!(stats.paid_count, 1);
        assert_eq!(stats.guest_count, 1);
        assert_eq!(stats.payment_rate, 100.0);
    }

    #[test]
    fn test_next_match_earliest_future_scheduled() {
        let past = fixture(MatchStatus::Scheduled, now() - Duration::days(2));
        let soon = fixture(MatchStatus::Scheduled, now() + Duration::days(3));
        let tie = fixture(MatchStatus::Scheduled, now() + Duration::days(3));
        let later = fixture(MatchStatus::Scheduled, now() + Duration::days(10));
        let cancelled = fixture(MatchStatus::Cancelled, now() + Duration::days(1));
        let matches = vec![later, past, cancelled, soon.clone(), tie];

        assert_eq!(next_match(&matches, now()).map(|m| m.id), Some(soon.id));
        assert!(next_match(&[], now()).is_none());
    }

    #[test]
    fn test_last_match_latest_concluded() {
        let old = fixture(MatchStatus::Concluded, now() - Duration::days(20));
        let recent = fixture(MatchStatus::Concluded, now() - Duration::days(2));
        let scheduled = fixture(MatchStatus::Scheduled, now() + Duration::days(2));
        let matches = vec![old, recent.clone(), scheduled];
        assert_eq!(last_match(&matches).map(|m| m.id), Some(recent.id));

        let a = fixture(MatchStatus::Concluded, now());
        let b = fixture(MatchStatus::Concluded, now());
        let winner = a.id.max(b.id);
        assert_eq!(last_match(&[a.clone(), b.clone()]).map(|m| m.id), Some(winner));
        assert_eq!(last_match(&[b, a]).map(|m| m.id), Some(winner));
    }

    #[test]
    fn test_top_scorers_stable() {
        let players = vec![
            member("Ana", 2, false),
            member("Bia", 5, false),
            member("Caio", 2, false),
            member("Duda", 0, false),
        ];
        let names: Vec<String> = top_scorers(&players, 3).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Bia", "Ana", "Caio"]);
        assert_eq!(top_scorers(&players, 10).len(), 4);
    }

    #[test]
    fn test_most_games_and_ratio() {
        let mut a = member("Ana", 4, false);
        a.games = 2;
        let mut b = member("Bia", 2, false);
        b.games = 6;
        let players = vec![a, b];
        assert_eq!(most_games(&players, 1)[0].name, "Bia");
        assert_eq!(goals_per_game(&players), 0.75);
        assert_eq!(goals_per_game(&[member("C", 3, false)]), 3.0);
    }

    #[test]
    fn test_position_breakdown() {
        let mut gk = member("Gus", 0, false);
        gk.position = Position::Goalkeeper;
        let players = vec![member("A", 0, false), gk, member("B", 0, false)];
        let breakdown = position_breakdown(&players);
        assert_eq!(
            breakdown,
            vec![
                PositionCount { position: Position::Goalkeeper, count: 1 },
                PositionCount { position: Position::Midfielder, count: 2 },
            ]
        );
    }

    #[test]
    fn test_monthly_finances_any_month() {
        let feb: MonthKey = "2025-02".parse().unwrap();
        let mut a = member("A", 0, true);
        a.payment_history.insert(feb);
        let b = member("B", 0, true);
        let mut guest = Player::guest("G".into(), Position::Forward);
        guest.payment_history.insert(feb);
        let players = vec![a, b, guest];

        let fin = monthly_finances(&players, feb, 28.0);
        assert_eq!(fin.active_players, 2);
        assert_eq!(fin.paid_count, 1);
        assert_eq!(fin.unpaid_count, 1);
        assert_eq!(fin.collected, 28.0);
        assert_eq!(fin.expected, 56.0);
        assert_eq!(fin.progress, 50.0);

        let empty = monthly_finances(&[], feb, 28.0);
        assert_eq!(empty.progress, 0.0);
    }

    #[test]
    fn test_dashboard_bundle() {
        let config = ClubConfig { top_n: 1, ..Default::default() };
        let players = vec![member("A", 1, true), member("B", 3, false)];
        let upcoming = fixture(MatchStatus::Scheduled, now() + Duration::days(1));
        let d = dashboard(&players, &[upcoming.clone()], now(), &config);
        assert_eq!(d.top_scorers.len(), 1);
        assert_eq!(d.top_scorers[0].name, "B");
        assert_eq!(d.next_match.map(|m| m.id), Some(upcoming.id));
        assert!(d.last_match.is_none());
        assert_eq!(d.month.to_string(), "2025-03");
        assert_eq!(d.stats.paid_count, 1);
    }
}
