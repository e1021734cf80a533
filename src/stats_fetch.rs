use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::http_client::http_client;
use crate::state::{ApiHealth, PlayerStat, StatsSnapshot, TeamStat};

pub fn stats_url(base_url: &str) -> String {
    join_url(base_url, "stats")
}

pub fn update_url(base_url: &str) -> String {
    join_url(base_url, "stats/update")
}

pub fn health_url(base_url: &str) -> String {
    join_url(base_url, "health")
}

pub fn fetch_stats(base_url: &str) -> Result<StatsSnapshot> {
    let client = http_client()?;
    let body = get_text(client, &stats_url(base_url))?;
    parse_stats_json(&body)
}

// The body is not inspected; callers re-fetch after the grace period.
pub fn trigger_recompute(base_url: &str) -> Result<()> {
    let client = http_client()?;
    get_text(client, &update_url(base_url))?;
    Ok(())
}

pub fn fetch_health(base_url: &str) -> Result<ApiHealth> {
    let client = http_client()?;
    let body = get_text(client, &health_url(base_url))?;
    parse_health_json(&body)
}

fn get_text(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request to {url} failed"))?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {}: {}", status, truncate(&body, 160)));
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    total_players: Value,
    #[serde(default)]
    total_teams: Value,
    #[serde(default)]
    top_scorers: Option<Vec<PlayerRow>>,
    #[serde(default)]
    top_assists: Option<Vec<PlayerRow>>,
    #[serde(default)]
    top_points: Option<Vec<PlayerRow>>,
    #[serde(default)]
    team_stats: Option<Vec<TeamRow>>,
    #[serde(default)]
    last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlayerRow {
    #[serde(rename = "Player", default)]
    player: Value,
    #[serde(rename = "Team", default)]
    team: Value,
    #[serde(rename = "Gls", default)]
    goals: Value,
    #[serde(rename = "Ast", default)]
    assists: Value,
    #[serde(default)]
    total_points: Value,
}

#[derive(Debug, Deserialize)]
struct TeamRow {
    #[serde(rename = "Team", default)]
    team: Value,
    #[serde(rename = "PlayerCount", default)]
    player_count: Value,
    #[serde(rename = "TotalGoals", default)]
    total_goals: Value,
    #[serde(rename = "TotalAssists", default)]
    total_assists: Value,
    #[serde(rename = "TotalPoints", default)]
    total_points: Value,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    data_loaded: bool,
    #[serde(default)]
    last_update: Option<String>,
}

pub fn parse_stats_json(raw: &str) -> Result<StatsSnapshot> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty stats body"));
    }
    let resp: StatsResponse = serde_json::from_str(trimmed).context("invalid stats json")?;

    // The server answers 200 with an error payload when its data file is missing.
    if resp
        .status
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("error"))
    {
        let reason = resp.error.unwrap_or_else(|| "unknown error".to_string());
        return Err(anyhow!("stats server error: {reason}"));
    }

    Ok(StatsSnapshot {
        total_players: value_to_u32(&resp.total_players),
        total_teams: value_to_u32(&resp.total_teams),
        top_scorers: build_players(resp.top_scorers),
        top_assists: build_players(resp.top_assists),
        top_points: build_players(resp.top_points),
        team_stats: resp
            .team_stats
            .unwrap_or_default()
            .into_iter()
            .map(|row| TeamStat {
                team: value_to_string(&row.team),
                player_count: value_to_u32(&row.player_count),
                total_goals: value_to_u32(&row.total_goals),
                total_assists: value_to_u32(&row.total_assists),
                total_points: value_to_i32(&row.total_points),
            })
            .collect(),
        last_updated: resp.last_updated.filter(|s| !s.trim().is_empty()),
    })
}

pub fn parse_health_json(raw: &str) -> Result<ApiHealth> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty health body"));
    }
    let resp: HealthResponse = serde_json::from_str(trimmed).context("invalid health json")?;
    Ok(ApiHealth {
        status: resp.status.unwrap_or_else(|| "unknown".to_string()),
        timestamp: resp.timestamp,
        data_loaded: resp.data_loaded,
        last_update: resp.last_update,
    })
}

fn build_players(rows: Option<Vec<PlayerRow>>) -> Vec<PlayerStat> {
    rows.unwrap_or_default()
        .into_iter()
        .map(|row| PlayerStat {
            player: value_to_string(&row.player),
            team: value_to_string(&row.team),
            goals: value_to_u32(&row.goals),
            assists: value_to_u32(&row.assists),
            total_points: value_to_i32(&row.total_points),
        })
        .collect()
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn value_to_u32(value: &Value) -> u32 {
    value_to_f64(value)
        .map(|v| v.trunc().clamp(0.0, u32::MAX as f64) as u32)
        .unwrap_or(0)
}

fn value_to_i32(value: &Value) -> i32 {
    value_to_f64(value)
        .map(|v| v.trunc().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
        .unwrap_or(0)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn truncate(raw: &str, max_chars: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out = trimmed.chars().take(max_chars).collect::<String>();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{join_url, truncate, value_to_i32, value_to_string, value_to_u32};

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(
            join_url("http://localhost:5000/api/", "stats"),
            "http://localhost:5000/api/stats"
        );
        assert_eq!(
            join_url("http://localhost:5000/api", "stats/update"),
            "http://localhost:5000/api/stats/update"
        );
    }

    #[test]
    fn lenient_numbers() {
        assert_eq!(value_to_u32(&json!(12)), 12);
        assert_eq!(value_to_u32(&json!(12.9)), 12);
        assert_eq!(value_to_u32(&json!("7")), 7);
        assert_eq!(value_to_u32(&json!(null)), 0);
        assert_eq!(value_to_u32(&json!(-3)), 0);
        assert_eq!(value_to_u32(&json!("NaN")), 0);
        assert_eq!(value_to_i32(&json!(-3)), -3);
        assert_eq!(value_to_i32(&json!(true)), 0);
    }

    #[test]
    fn strings_fall_back_to_empty() {
        assert_eq!(value_to_string(&json!(" Saka ")), "Saka");
        assert_eq!(value_to_string(&json!(null)), "");
    }

    #[test]
    fn truncate_marks_cut_bodies() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijk", 3), "abc…");
    }
}
