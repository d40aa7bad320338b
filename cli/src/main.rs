mod dashboard;
mod report;

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use clubhouse_core::service::stats_service;
use clubhouse_core::{
    match_form_from_input, parse_args, player_form_from_input, resolve_data_dir, resolve_player,
    ClubConfig, ClubError, ClubService, FileMatchRepository, FilePlayerRepository, Match,
    MatchForm, MonthKey, PlayerForm, SyncReport,
};
use log::debug;

#[derive(Parser)]
#[command(name = "clubhouse")]
#[command(about = "Roster, dues and match stats for an amateur football club", long_about = None)]
struct Cli {
    /// Data directory (defaults to $CLUBHOUSE_DIR, then ~/.clubhouse)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the roster
    Player {
        #[command(subcommand)]
        action: PlayerAction,
    },
    /// Manage fixtures and results
    Match {
        #[command(subcommand)]
        action: MatchAction,
    },
    /// Toggle a month of dues for a player (usage: pay Rafa 2025-03)
    Pay {
        /// Shirt number, name or id prefix
        player: String,
        /// YYYY-MM, defaults to the current month
        month: Option<String>,
    },
    /// Dues collected for a month, with each player's year at a glance
    Finances {
        /// YYYY-MM, defaults to the current month
        month: Option<String>,
    },
    /// Team totals and rankings
    Stats {
        /// Length of the rankings
        #[arg(long)]
        top: Option<usize>,
    },
    /// Rebuild every player's goals and games from concluded matches
    Sync,
    /// Open the terminal dashboard
    Dashboard,
    /// Show or change settings
    Config {
        #[arg(long)]
        fee: Option<f64>,
        #[arg(long)]
        editor: Option<String>,
        #[arg(long)]
        top: Option<usize>,
    },
}

#[derive(Subcommand)]
enum PlayerAction {
    /// Add a player (usage: player add "Rafa Souza" pos:FWD number:9 size:L guest:no)
    Add {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Edit a player (usage: player edit 9 size:XL)
    Edit {
        player: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Remove a player
    Rm { player: String },
    /// List the roster
    List,
}

#[derive(Subcommand)]
enum MatchAction {
    /// Add a match (usage: match add "Rivals FC" date:sat loc:Home)
    Add {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Edit a match (usage: match edit 3f2a status:concluded att:9,10,Rafa scorers:9=2 theirs:1)
    Edit {
        /// Id prefix
        id: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Remove a match and resync stats
    Rm { id: String },
    /// List matches, newest first
    List,
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        if let Some(club) = e.downcast_ref::<ClubError>() {
            if club.is_user_error() {
                eprintln!("Error: {}", club);
                std::process::exit(2);
            }
        }
        return Err(e);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir)?;
    debug!("Using data directory {}", data_dir.display());
    let config = ClubConfig::load_or_default(&data_dir)?;

    let service = ClubService::new(
        FilePlayerRepository::new(Some(data_dir.clone()))?,
        FileMatchRepository::new(Some(data_dir.clone()))?,
        config.clone(),
    );
    let now = Utc::now();

    match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Player { action } => match action {
            PlayerAction::Add { args } => {
                let form = player_form_from_input(&parse_args(&args), None)?;
                let player = service.save_player(None, &form, now)?;
                println!("Player added: {} (ID: {})", player.name, player.short_id());
                if player.is_guest {
                    println!("  Guest");
                } else {
                    println!("  #{} {} size {}", player.shirt_number, player.position, player.uniform_size);
                }
            }
            PlayerAction::Edit { player, args } => {
                let snapshot = service.snapshot(now)?;
                let target = resolve_player(&player, &snapshot.players)?;
                let form = player_form_from_input(&parse_args(&args), Some(PlayerForm::from(target)))?;
                let saved = service.save_player(Some(target.id), &form, now)?;
                println!("Player updated: {} (ID: {})", saved.name, saved.short_id());
            }
            PlayerAction::Rm { player } => {
                let snapshot = service.snapshot(now)?;
                let target = resolve_player(&player, &snapshot.players)?;
                service.delete_player(&target.id)?;
                println!("Player removed: {}", target.name);
            }
            PlayerAction::List => {
                let snapshot = service.snapshot(now)?;
                report::show_roster(&snapshot.players, MonthKey::from_datetime(now));
            }
        },
        Commands::Match { action } => match action {
            MatchAction::Add { args } => {
                let snapshot = service.snapshot(now)?;
                let form = match_form_from_input(&parse_args(&args), None, &snapshot.players, now)?;
                let (m, sync) = service.save_match(None, form)?;
                println!("Match added: vs {} on {} (ID: {})", m.opponent, m.date.format("%Y-%m-%d %H:%M"), m.short_id());
                print_sync(&sync);
            }
            MatchAction::Edit { id, args } => {
                let snapshot = service.snapshot(now)?;
                let target = find_match(&id, &snapshot.matches)?;
                let base = MatchForm::from(target);
                let form = match_form_from_input(&parse_args(&args), Some(base), &snapshot.players, now)?;
                let (m, sync) = service.save_match(Some(target.id), form)?;
                println!("Match updated: vs {} ({}) {}-{}", m.opponent, m.status, m.our_score, m.opponent_score);
                print_sync(&sync);
            }
            MatchAction::Rm { id } => {
                let snapshot = service.snapshot(now)?;
                let target = find_match(&id, &snapshot.matches)?;
                let sync = service.delete_match(&target.id)?;
                println!("Match removed: vs {}", target.opponent);
                print_sync(&sync);
            }
            MatchAction::List => {
                let snapshot = service.snapshot(now)?;
                report::show_matches(&snapshot);
            }
        },
        Commands::Pay { player, month } => {
            let month = parse_month(month)?;
            let snapshot = service.snapshot(now)?;
            let target = resolve_player(&player, &snapshot.players)?;
            if target.is_guest {
                println!("{} is a guest and pays no dues.", target.name);
                return Ok(());
            }
            let month = month.unwrap_or_else(|| MonthKey::from_datetime(now));
            let updated = service.toggle_payment(&target.id, Some(month), now)?;
            let state = if updated.payment_history.contains(&month) { "paid" } else { "unpaid" };
            println!("{}: {} marked {}", updated.name, month, state);
        }
        Commands::Finances { month } => {
            let month = parse_month(month)?;
            let finances = service.finances(month, now)?;
            let snapshot = service.snapshot(now)?;
            report::show_finances(&finances, &snapshot.players);
        }
        Commands::Stats { top } => {
            let snapshot = service.snapshot(now)?;
            let top = top.unwrap_or(service.config().top_n);
            let stats = stats_service::team_stats(&snapshot.players, &snapshot.matches, service.config().monthly_fee);
            report::show_stats(&stats, &snapshot, top);
        }
        Commands::Sync => {
            let sync = service.sync_stats()?;
            print_sync(&sync);
        }
        Commands::Dashboard => {
            let data = service.dashboard(now)?;
            let snapshot = service.snapshot(now)?;
            dashboard::run(data, stats_service::position_breakdown(&snapshot.players))?;
        }
        Commands::Config { fee, editor, top } => {
            configure(config, &data_dir, fee, editor, top)?;
        }
    }
    Ok(())
}

fn configure(
    mut config: ClubConfig,
    data_dir: &Path,
    fee: Option<f64>,
    editor: Option<String>,
    top: Option<usize>,
) -> Result<()> {
    let changed = fee.is_some() || editor.is_some() || top.is_some();
    if let Some(fee) = fee {
        config.monthly_fee = fee;
    }
    if let Some(editor) = editor {
        config.editor = editor;
    }
    if let Some(top) = top {
        config.top_n = top;
    }

    if changed {
        config.validate()?;
        config.save(data_dir)?;
        println!("Settings saved to {}", data_dir.display());
    }
    println!("Monthly fee: {:.2}", config.monthly_fee);
    println!("Editor:      {}", config.editor);
    println!("Rankings:    top {}", config.top_n);
    Ok(())
}

fn parse_month(raw: Option<String>) -> Result<Option<MonthKey>> {
    raw.map(|m| {
        m.parse::<MonthKey>()
            .map_err(|e| ClubError::validation(e.to_string()).into())
    })
    .transpose()
}

fn find_match<'a>(prefix: &str, matches: &'a [Match]) -> Result<&'a Match> {
    let prefix = prefix.trim().to_lowercase();
    let found: Vec<&Match> = matches
        .iter()
        .filter(|m| m.id.to_string().starts_with(&prefix))
        .collect();
    match found.len() {
        1 => Ok(found[0]),
        0 => Err(ClubError::validation(format!("No match with id starting '{}'", prefix)).into()),
        _ => Err(ClubError::validation(format!(
            "Id prefix '{}' matches {} matches, use more characters",
            prefix,
            found.len()
        ))
        .into()),
    }
}

fn print_sync(report: &SyncReport) {
    if report.is_complete() {
        println!("  Stats synced for {} players", report.updated);
    } else {
        println!(
            "  Stats synced for {} players, {} failed, {} rows without id (run `clubhouse sync` to retry)",
            report.updated,
            report.failed.len(),
            report.skipped
        );
        for (id, reason) in &report.failed {
            println!("    {}: {}", id, reason);
        }
    }
}
