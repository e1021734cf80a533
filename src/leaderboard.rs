use std::time::Duration;

use chrono::{DateTime, Local};

use crate::state::{PlayerStat, StatsSnapshot, TeamStat};

pub const LEADERBOARD_LEN: usize = 10;
pub const MISSING_LABEL: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerBoard {
    Scorers,
    Assists,
    Points,
}

impl PlayerBoard {
    pub const ALL: [PlayerBoard; 3] = [
        PlayerBoard::Scorers,
        PlayerBoard::Assists,
        PlayerBoard::Points,
    ];

    pub fn title(self) -> &'static str {
        match self {
            PlayerBoard::Scorers => "Top Scorers",
            PlayerBoard::Assists => "Top Assist Providers",
            PlayerBoard::Points => "Fantasy Points Leaders",
        }
    }

    pub fn entries(self, snapshot: &StatsSnapshot) -> &[PlayerStat] {
        match self {
            PlayerBoard::Scorers => &snapshot.top_scorers,
            PlayerBoard::Assists => &snapshot.top_assists,
            PlayerBoard::Points => &snapshot.top_points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Goals,
    Assists,
    Points,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::Goals => "Gls",
            Metric::Assists => "Ast",
            Metric::Points => "Pts",
        }
    }

    pub fn value(self, player: &PlayerStat) -> i64 {
        match self {
            Metric::Goals => i64::from(player.goals),
            Metric::Assists => i64::from(player.assists),
            Metric::Points => i64::from(player.total_points),
        }
    }
}

pub fn board_metrics(board: PlayerBoard) -> [Metric; 3] {
    match board {
        PlayerBoard::Scorers => [Metric::Goals, Metric::Assists, Metric::Points],
        PlayerBoard::Assists => [Metric::Assists, Metric::Goals, Metric::Points],
        PlayerBoard::Points => [Metric::Points, Metric::Goals, Metric::Assists],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedPlayer<'a> {
    pub rank: usize,
    pub player: &'a PlayerStat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedTeam<'a> {
    pub rank: usize,
    pub team: &'a TeamStat,
}

pub fn top_entries(players: &[PlayerStat]) -> &[PlayerStat] {
    &players[..players.len().min(LEADERBOARD_LEN)]
}

pub fn player_leaderboard(snapshot: &StatsSnapshot, board: PlayerBoard) -> Vec<RankedPlayer<'_>> {
    top_entries(board.entries(snapshot))
        .iter()
        .enumerate()
        .map(|(idx, player)| RankedPlayer {
            rank: idx + 1,
            player,
        })
        .collect()
}

// Stable sort: tied teams keep server order.
pub fn team_leaderboard(snapshot: &StatsSnapshot) -> Vec<RankedTeam<'_>> {
    let mut teams: Vec<&TeamStat> = snapshot.team_stats.iter().collect();
    teams.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    teams
        .into_iter()
        .enumerate()
        .map(|(idx, team)| RankedTeam {
            rank: idx + 1,
            team,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickStats {
    pub total_players: u32,
    pub total_teams: u32,
    pub top_goals: u32,
    pub top_scorer: String,
    pub top_assists: u32,
    pub top_assister: String,
}

pub fn quick_stats(snapshot: &StatsSnapshot) -> QuickStats {
    let scorer = snapshot.top_scorers.first();
    let assister = snapshot.top_assists.first();
    QuickStats {
        total_players: snapshot.total_players,
        total_teams: snapshot.total_teams,
        top_goals: scorer.map(|p| p.goals).unwrap_or(0),
        top_scorer: scorer
            .map(|p| display_name(&p.player).to_string())
            .unwrap_or_else(|| MISSING_LABEL.to_string()),
        top_assists: assister.map(|p| p.assists).unwrap_or(0),
        top_assister: assister
            .map(|p| display_name(&p.player).to_string())
            .unwrap_or_else(|| MISSING_LABEL.to_string()),
    }
}

pub fn display_name(raw: &str) -> &str {
    if raw.trim().is_empty() {
        MISSING_LABEL
    } else {
        raw
    }
}

pub fn format_last_update(date: Option<DateTime<Local>>) -> String {
    match date {
        Some(date) => date.format("%b %-d, %I:%M %p").to_string(),
        None => "Never".to_string(),
    }
}

pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::{display_name, format_last_update};

    #[test]
    fn blank_names_render_as_missing() {
        assert_eq!(display_name(""), "N/A");
        assert_eq!(display_name("  "), "N/A");
        assert_eq!(display_name("Salah"), "Salah");
    }

    #[test]
    fn never_updated_label() {
        assert_eq!(format_last_update(None), "Never");
    }
}
