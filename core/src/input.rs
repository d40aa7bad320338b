use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ClubError;
use crate::model::matches::MatchStatus;
use crate::model::player::{Player, Position, UniformSize};
use crate::service::dto::{MatchForm, PlayerForm};
use crate::time::parse_match_date;

pub const PLAYER_KEYS: [&str; 6] = ["position", "number", "size", "guest", "goals", "games"];
pub const MATCH_KEYS: [&str; 7] = [
    "date",
    "location",
    "status",
    "ours",
    "theirs",
    "attendance",
    "scorers",
];

/// Free words plus `key:value` pairs, as typed on the command line.
#[derive(Debug, PartialEq, Default)]
pub struct ParsedInput {
    pub name: String,
    pub fields: HashMap<String, String>,
}

pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut name_parts = Vec::new();
    let mut fields = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphabetic()) {
                fields.insert(key.to_lowercase(), value.to_string());
                continue;
            }
        }
        name_parts.push(arg.as_str());
    }

    ParsedInput {
        name: name_parts.join(" "),
        fields,
    }
}

/// Resolves `key` to the single candidate it equals or prefixes.
pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(invalid(format!("Unknown key: '{}'", key))),
        _ => Err(invalid(format!("Ambiguous key: '{}' matches {:?}", key, matches))),
    }
}

/// Fields of `input` with every key expanded against `candidates`.
fn expanded_fields(input: &ParsedInput, candidates: &[&str]) -> Result<HashMap<String, String>> {
    input
        .fields
        .iter()
        .map(|(k, v)| Ok((expand_key(k, candidates)?, v.clone())))
        .collect()
}

/// Builds a player form. `base` is the current form when editing; without it
/// a name and a position are required.
pub fn player_form_from_input(input: &ParsedInput, base: Option<PlayerForm>) -> Result<PlayerForm> {
    let fields = expanded_fields(input, &PLAYER_KEYS)?;

    let mut form = match base {
        Some(mut form) => {
            if !input.name.trim().is_empty() {
                form.name = input.name.trim().to_string();
            }
            form
        }
        None => {
            if input.name.trim().is_empty() {
                return Err(invalid("Player name is required"));
            }
            let raw = fields
                .get("position")
                .ok_or_else(|| invalid("position:<GK|DEF|MID|FWD> is required"))?;
            PlayerForm::new(input.name.trim(), parse_position(raw)?)
        }
    };

    for (key, value) in &fields {
        match key.as_str() {
            "position" => form.position = parse_position(value)?,
            "number" => form.shirt_number = parse_count(value, "number")?,
            "size" => form.uniform_size = parse_label::<UniformSize>(&value.to_uppercase(), "size")?,
            "guest" => form.is_guest = parse_bool(value)?,
            "goals" => form.goals = Some(parse_count(value, "goals")?),
            "games" => form.games = Some(parse_count(value, "games")?),
            _ => {}
        }
    }
    Ok(form)
}

/// Builds a match form. Player references in `attendance:` and `scorers:` are
/// resolved against `roster`; see [`resolve_player`].
///
/// Scorers are written `ref=goals` or just `ref` for one goal, comma
/// separated: `scorers:Rafa=2,10`.
pub fn match_form_from_input(
    input: &ParsedInput,
    base: Option<MatchForm>,
    roster: &[Player],
    now: DateTime<Utc>,
) -> Result<MatchForm> {
    let fields = expanded_fields(input, &MATCH_KEYS)?;

    let mut form = match base {
        Some(mut form) => {
            if !input.name.trim().is_empty() {
                form.opponent = input.name.trim().to_string();
            }
            form
        }
        None => {
            if input.name.trim().is_empty() {
                return Err(invalid("Opponent name is required"));
            }
            let raw = fields
                .get("date")
                .ok_or_else(|| invalid("date:<when> is required"))?;
            MatchForm::new(input.name.trim(), match_date(raw, now)?)
        }
    };

    for (key, value) in &fields {
        match key.as_str() {
            "date" => form.date = match_date(value, now)?,
            "location" => form.location = value.trim().to_string(),
            "status" => form.status = parse_status(value)?,
            "ours" => form.our_score = parse_count(value, "ours")?,
            "theirs" => form.opponent_score = parse_count(value, "theirs")?,
            "attendance" => form.attendance = parse_attendance(value, roster)?,
            "scorers" => form.scorers = parse_scorers(value, roster)?,
            _ => {}
        }
    }
    Ok(form)
}

/// Finds a roster player by shirt number, id prefix or name (exact, then
/// unique prefix), ignoring case.
pub fn resolve_player<'a>(reference: &str, roster: &'a [Player]) -> Result<&'a Player> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(invalid("Empty player reference"));
    }

    if let Ok(number) = reference.parse::<u32>() {
        if let Some(p) = roster.iter().find(|p| !p.is_guest && p.shirt_number == number) {
            return Ok(p);
        }
    }

    let lower = reference.to_lowercase();
    if let Some(p) = roster.iter().find(|p| p.name.to_lowercase() == lower) {
        return Ok(p);
    }

    let by_id: Vec<&Player> = roster
        .iter()
        .filter(|p| lower.len() >= 4 && p.id.to_string().starts_with(&lower))
        .collect();
    if by_id.len() == 1 {
        return Ok(by_id[0]);
    }

    let by_name: Vec<&Player> = roster
        .iter()
        .filter(|p| p.name.to_lowercase().starts_with(&lower))
        .collect();
    match by_name.len() {
        1 => Ok(by_name[0]),
        0 => Err(invalid(format!("No player matches '{}'", reference))),
        _ => Err(invalid(format!(
            "'{}' matches several players: {}",
            reference,
            by_name.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
        ))),
    }
}

fn parse_attendance(value: &str, roster: &[Player]) -> Result<BTreeSet<Uuid>> {
    split_list(value)
        .map(|r| resolve_player(r, roster).map(|p| p.id))
        .collect()
}

fn parse_scorers(value: &str, roster: &[Player]) -> Result<BTreeMap<Uuid, u32>> {
    let mut scorers = BTreeMap::new();
    for entry in split_list(value) {
        let (reference, goals) = match entry.split_once('=') {
            Some((r, g)) => (r, parse_count(g, "goals")?),
            None => (entry, 1),
        };
        let player = resolve_player(reference, roster)?;
        *scorers.entry(player.id).or_insert(0) += goals;
    }
    Ok(scorers)
}

/// Bad input surfaces as [`ClubError::Validation`].
fn invalid(msg: impl Into<String>) -> anyhow::Error {
    ClubError::validation(msg).into()
}

fn match_date(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    parse_match_date(raw, now).map_err(|e| invalid(e.to_string()))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_position(value: &str) -> Result<Position> {
    if let Some(p) = Position::ALL
        .iter()
        .find(|p| p.short().eq_ignore_ascii_case(value.trim()))
    {
        return Ok(*p);
    }
    if let Ok(p) = parse_label::<Position>(value, "position") {
        return Ok(p);
    }

    let names: Vec<String> = Position::ALL
        .iter()
        .map(|p| p.to_string().to_lowercase())
        .collect();
    let candidates: Vec<&str> = names.iter().map(String::as_str).collect();
    let name = expand_key(&value.trim().to_lowercase(), &candidates)
        .map_err(|_| invalid(format!("Invalid position '{}'", value)))?;
    Position::ALL
        .iter()
        .zip(&candidates)
        .find(|(_, n)| **n == name)
        .map(|(p, _)| *p)
        .ok_or_else(|| invalid(format!("Invalid position '{}'", value)))
}

fn parse_status(value: &str) -> Result<MatchStatus> {
    let lower = value.trim().to_lowercase();
    if let Ok(status) = parse_label::<MatchStatus>(&lower, "status") {
        return Ok(status);
    }
    let name = expand_key(&lower, &["scheduled", "concluded", "cancelled"])
        .map_err(|_| invalid(format!("Invalid status '{}'", value)))?;
    parse_label(&name, "status")
}

/// Reads a label through the serde names and aliases of `T`.
fn parse_label<T: DeserializeOwned>(value: &str, what: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_string()))
        .map_err(|_| invalid(format!("Invalid {} '{}'", what, value)))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" => Ok(false),
        other => Err(invalid(format!("Expected yes or no, got '{}'", other))),
    }
}

fn parse_count(value: &str, what: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(format!("{} must be a non-negative number, got '{}'", what, value)))
}
