use std::thread;

use anyhow::{Context, Result};

use pl_stats_terminal::config::DashboardConfig;
use pl_stats_terminal::leaderboard::{self, PlayerBoard, board_metrics, display_name};
use pl_stats_terminal::stats_fetch;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = DashboardConfig::from_env();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let base_url = parse_base_url_arg(&args).unwrap_or(config.base_url);

    if args.iter().any(|a| a == "--update") {
        stats_fetch::trigger_recompute(&base_url).context("update trigger failed")?;
        println!(
            "Update triggered, waiting {}s",
            config.update_grace.as_secs()
        );
        thread::sleep(config.update_grace);
    }

    let snapshot = stats_fetch::fetch_stats(&base_url)
        .with_context(|| format!("failed to fetch stats from {base_url}"))?;

    println!("Stats from {base_url}");
    println!(
        "Players: {} | Teams: {}",
        snapshot.total_players, snapshot.total_teams
    );
    if let Some(updated) = snapshot.last_updated.as_deref() {
        println!("Server updated: {updated}");
    }

    for board in PlayerBoard::ALL {
        println!();
        println!("{}", board.title());
        let metrics = board_metrics(board);
        for entry in leaderboard::player_leaderboard(&snapshot, board) {
            let stats = metrics
                .iter()
                .map(|m| format!("{} {}", m.value(entry.player), m.label()))
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                " {:>2}. {} ({}) {stats}",
                entry.rank,
                display_name(&entry.player.player),
                display_name(&entry.player.team)
            );
        }
    }

    println!();
    println!("Teams");
    for entry in leaderboard::team_leaderboard(&snapshot) {
        println!(
            " {:>2}. {} {} pts ({} players, {} goals, {} assists)",
            entry.rank,
            display_name(&entry.team.team),
            entry.team.total_points,
            entry.team.player_count,
            entry.team.total_goals,
            entry.team.total_assists
        );
    }

    Ok(())
}

fn parse_base_url_arg(args: &[String]) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(url) = arg.strip_prefix("--base-url=") {
            let trimmed = url.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == "--base-url" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            let trimmed = next.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
