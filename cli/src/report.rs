use clubhouse_core::model::{MonthlyFinances, Player, TeamStats};
use clubhouse_core::service::{ledger, stats_service};
use clubhouse_core::{ClubSnapshot, MonthKey};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct RosterRow {
    #[tabled(rename = "#")]
    number: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Pos")]
    position: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Goals")]
    goals: u32,
    #[tabled(rename = "Games")]
    games: u32,
    #[tabled(rename = "Dues")]
    dues: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Opponent")]
    opponent: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Scorers")]
    scorers: String,
}

#[derive(Tabled)]
struct DuesRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Paid")]
    paid: String,
}

#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Goals")]
    goals: u32,
    #[tabled(rename = "Games")]
    games: u32,
}

fn styled<T: Tabled>(rows: Vec<T>) -> Table {
    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    table
}

fn header(title: &str) {
    println!("\n\x1b[1;36m{}\x1b[0m", title);
}

pub fn show_roster(players: &[Player], month: MonthKey) {
    if players.is_empty() {
        println!("No players yet. Add one with `clubhouse player add`.");
        return;
    }

    let rows: Vec<RosterRow> = players
        .iter()
        .map(|p| RosterRow {
            number: if p.is_guest { "guest".into() } else { p.shirt_number.to_string() },
            name: p.name.clone(),
            position: p.position.short().to_string(),
            size: if p.is_guest { "-".into() } else { p.uniform_size.to_string() },
            goals: p.goals,
            games: p.games,
            dues: match (p.is_guest, ledger::is_paid(p, &month)) {
                (true, _) => "-".into(),
                (false, true) => "paid".into(),
                (false, false) => "open".into(),
            },
            id: p.short_id(),
        })
        .collect();

    header(&format!("Roster ({} players, dues for {})", players.len(), month));
    println!("{}", styled(rows));
}

pub fn show_matches(snapshot: &ClubSnapshot) {
    if snapshot.matches.is_empty() {
        println!("No matches yet. Add one with `clubhouse match add`.");
        return;
    }

    let rows: Vec<MatchRow> = snapshot
        .matches
        .iter()
        .map(|m| {
            let scorers: Vec<String> = m
                .scorers
                .iter()
                .map(|(id, goals)| {
                    let name = snapshot.player_name(id);
                    if *goals > 1 { format!("{} x{}", name, goals) } else { name }
                })
                .collect();
            MatchRow {
                date: m.date.format("%Y-%m-%d %H:%M").to_string(),
                id: m.short_id(),
                opponent: m.opponent.clone(),
                score: if m.is_concluded() {
                    format!("{} - {}", m.our_score, m.opponent_score)
                } else {
                    "-".into()
                },
                status: m.status.to_string(),
                location: if m.location.is_empty() { "-".into() } else { m.location.clone() },
                scorers: scorers.join(", "),
            }
        })
        .collect();

    header(&format!("Matches ({})", snapshot.matches.len()));
    println!("{}", styled(rows));
}

pub fn show_finances(finances: &MonthlyFinances, players: &[Player]) {
    header(&format!("Dues for {}", finances.month));
    println!(
        "Collected {:.2} of {:.2} ({:.0}%), {} paid, {} open",
        finances.collected,
        finances.expected,
        finances.progress,
        finances.paid_count,
        finances.unpaid_count
    );

    let year = finances.month.year();
    let rows: Vec<DuesRow> = players
        .iter()
        .filter(|p| !p.is_guest)
        .map(|p| DuesRow {
            name: p.name.clone(),
            month: if ledger::is_paid(p, &finances.month) { "paid".into() } else { "open".into() },
            year: ledger::year_overview(p, year)
                .iter()
                .map(|paid| if *paid { '■' } else { '·' })
                .collect(),
            paid: format!("{}/12", ledger::paid_months_in_year(p, year)),
        })
        .collect();

    if rows.is_empty() {
        println!("No members on the roster.");
        return;
    }
    println!("{}", styled(rows));
}

fn ranking(players: Vec<Player>) -> Vec<RankRow> {
    players
        .into_iter()
        .enumerate()
        .map(|(i, p)| RankRow {
            rank: i + 1,
            name: p.name,
            goals: p.goals,
            games: p.games,
        })
        .collect()
}

pub fn show_stats(stats: &TeamStats, snapshot: &ClubSnapshot, top: usize) {
    header("Team");
    println!("Goals:          {}", stats.total_goals);
    println!("Games played:   {}", stats.total_games);
    println!("Goals per game: {:.2}", stats_service::goals_per_game(&snapshot.players));
    println!("Members:        {} (+{} guests)", stats.active_players, stats.guest_count);
    println!(
        "Dues this month: {} paid ({:.0}%), {:.2} of {:.2}",
        stats.paid_count, stats.payment_rate, stats.total_revenue, stats.expected_revenue
    );

    let breakdown: Vec<String> = stats_service::position_breakdown(&snapshot.players)
        .iter()
        .map(|c| format!("{} {}", c.position.short(), c.count))
        .collect();
    if !breakdown.is_empty() {
        println!("Positions:      {}", breakdown.join("  "));
    }

    if snapshot.players.is_empty() || top == 0 {
        return;
    }

    header("Top scorers");
    println!("{}", styled(ranking(stats_service::top_scorers(&snapshot.players, top))));

    header("Most games");
    println!("{}", styled(ranking(stats_service::most_games(&snapshot.players, top))));
}
