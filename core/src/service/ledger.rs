//! Monthly dues per player.
//!
//! `payment_history` is the only stored truth; `monthly_fee_paid` is always
//! recomputed from it through [`refresh_fee_status`]. Guests are outside the
//! ledger: never paid, never toggled.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::model::player::Player;
use crate::time::{months_of_year, MonthKey};

/// Canonical key of "this month's dues".
pub fn current_month_key(now: DateTime<Utc>) -> MonthKey {
    MonthKey::from_datetime(now)
}

pub fn is_paid(player: &Player, month: &MonthKey) -> bool {
    !player.is_guest && player.payment_history.contains(month)
}

/// History with `month` flipped. Guests get their history back unchanged.
pub fn toggle(player: &Player, month: MonthKey) -> BTreeSet<MonthKey> {
    let mut history = player.payment_history.clone();
    if player.is_guest {
        return history;
    }
    if !history.remove(&month) {
        history.insert(month);
    }
    history
}

/// Toggles `month` on the player and refreshes the projection for `now`.
/// Returns whether anything changed.
pub fn apply_toggle(player: &mut Player, month: MonthKey, now: DateTime<Utc>) -> bool {
    if player.is_guest {
        return false;
    }
    player.payment_history = toggle(player, month);
    refresh_fee_status(player, now);
    true
}

pub fn refresh_fee_status(player: &mut Player, now: DateTime<Utc>) {
    player.monthly_fee_paid = is_paid(player, &current_month_key(now));
}

pub fn paid_months_in_year(player: &Player, year: i32) -> usize {
    year_overview(player, year).iter().filter(|paid| **paid).count()
}

/// Paid flag for January through December of `year`.
pub fn year_overview(player: &Player, year: i32) -> [bool; 12] {
    let mut overview = [false; 12];
    for (slot, month) in overview.iter_mut().zip(months_of_year(year)) {
        *slot = is_paid(player, &month);
    }
    overview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::Position;
    use chrono::TimeZone;

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn march() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 9, 0, 0).unwrap()
    }

    fn member(history: &[&str]) -> Player {
        let mut p = Player::new("Rafa".into(), Position::Forward, 9);
        p.payment_history = history.iter().map(|m| key(m)).collect();
        p
    }

    #[test]
    fn test_current_month_key_is_zero_padded() {
        assert_eq!(current_month_key(march()).to_string(), "2025-03");
    }

    #[test]
    fn test_toggle_current_month_off() {
        let mut p = member(&["2025-01", "2025-03"]);
        refresh_fee_status(&mut p, march());
        assert!(p.monthly_fee_paid);

        assert!(apply_toggle(&mut p, key("2025-03"), march()));
        let months: Vec<String> = p.payment_history.iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2025-01"]);
        assert!(!p.monthly_fee_paid);
    }

    #[test]
    fn test_double_toggle_is_identity() {
        let p = member(&["2025-01"]);
        for m in ["2025-01", "2025-02", "2024-12"] {
            let mut once = p.clone();
            once.payment_history = toggle(&p, key(m));
            assert_eq!(toggle(&once, key(m)), p.payment_history);
        }
    }

    #[test]
    fn test_toggle_past_month_keeps_flag() {
        let mut p = member(&["2025-03"]);
        refresh_fee_status(&mut p, march());
        apply_toggle(&mut p, key("2025-02"), march());
        assert!(p.monthly_fee_paid);
        assert_eq!(p.payment_history.len(), 2);
    }

    #[test]
    fn test_guest_is_outside_the_ledger() {
        let mut g = Player::guest("Visitor".into(), Position::Defender);
        g.payment_history.insert(key("2025-03"));
        let before = g.payment_history.clone();

        assert!(!is_paid(&g, &key("2025-03")));
        assert_eq!(toggle(&g, key("2025-04")), before);
        assert!(!apply_toggle(&mut g, key("2025-03"), march()));
        assert_eq!(g.payment_history, before);
        refresh_fee_status(&mut g, march());
        assert!(!g.monthly_fee_paid);
        assert_eq!(paid_months_in_year(&g, 2025), 0);
    }

    #[test]
    fn test_year_overview() {
        let p = member(&["2024-12", "2025-01", "2025-03", "2026-01"]);
        let overview = year_overview(&p, 2025);
        assert!(overview[0]);
        assert!(!overview[1]);
        assert!(overview[2]);
        assert_eq!(paid_months_in_year(&p, 2025), 2);
    }
}
