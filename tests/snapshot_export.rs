use std::fs;

use pl_stats_terminal::fake_feed::build_snapshot;
use pl_stats_terminal::snapshot_export::{Cell, build_sheets, export_snapshot};
use pl_stats_terminal::state::PlayerStat;

fn player(name: &str, team: &str, goals: u32, assists: u32, points: i32) -> PlayerStat {
    PlayerStat {
        player: name.to_string(),
        team: team.to_string(),
        goals,
        assists,
        total_points: points,
    }
}

fn season() -> Vec<PlayerStat> {
    vec![
        player("Saka", "Arsenal", 8, 9, 120),
        player("Salah", "Liverpool", 15, 8, 170),
        player("Havertz", "Arsenal", 9, 3, 110),
        player("Palmer", "Chelsea", 12, 6, 150),
        player("Diaz", "Liverpool", 9, 2, 100),
    ]
}

#[test]
fn aggregation_matches_server_shape() {
    let snapshot = build_snapshot(&season());
    assert_eq!(snapshot.total_players, 5);
    assert_eq!(snapshot.total_teams, 3);

    let scorers = snapshot
        .top_scorers
        .iter()
        .map(|p| p.player.as_str())
        .collect::<Vec<_>>();
    // Havertz and Diaz tie on 9; input order is kept.
    assert_eq!(scorers, ["Salah", "Palmer", "Havertz", "Diaz", "Saka"]);
    assert_eq!(snapshot.top_assists[0].player, "Saka");
    assert_eq!(snapshot.top_points[0].player, "Salah");

    let teams = snapshot
        .team_stats
        .iter()
        .map(|t| t.team.as_str())
        .collect::<Vec<_>>();
    assert_eq!(teams, ["Arsenal", "Chelsea", "Liverpool"]);

    let arsenal = &snapshot.team_stats[0];
    assert_eq!(arsenal.team, "Arsenal");
    assert_eq!(arsenal.player_count, 2);
    assert_eq!(arsenal.total_goals, 17);
    assert_eq!(arsenal.total_assists, 12);
    assert_eq!(arsenal.total_points, 230);
}

#[test]
fn team_sums_come_back_in_name_order() {
    let players = vec![
        player("Isak", "Newcastle", 10, 2, 120),
        player("Watkins", "Aston Villa", 9, 4, 120),
        player("Mbeumo", "Brentford", 8, 3, 120),
    ];
    let snapshot = build_snapshot(&players);
    let teams = snapshot
        .team_stats
        .iter()
        .map(|t| t.team.as_str())
        .collect::<Vec<_>>();
    assert_eq!(teams, ["Aston Villa", "Brentford", "Newcastle"]);
}

#[test]
fn aggregation_caps_leader_lists_at_ten() {
    let players = (0..25)
        .map(|i| player(&format!("P{i}"), "Test FC", i, i % 4, i as i32 * 3))
        .collect::<Vec<_>>();
    let snapshot = build_snapshot(&players);
    assert_eq!(snapshot.top_scorers.len(), 10);
    assert_eq!(snapshot.top_scorers[0].player, "P24");
    assert_eq!(snapshot.team_stats.len(), 1);
    assert_eq!(snapshot.team_stats[0].player_count, 25);
}

#[test]
fn sheets_follow_dashboard_order() {
    let snapshot = build_snapshot(&season());
    let sheets = build_sheets(&snapshot);
    let names = sheets.iter().map(|s| s.name).collect::<Vec<_>>();
    assert_eq!(names, ["Top Scorers", "Top Assists", "Fantasy Points", "Teams"]);

    let scorers = &sheets[0];
    assert_eq!(scorers.rows[0][3], Cell::Text("Gls".to_string()));
    assert_eq!(scorers.rows[1][1], Cell::Text("Salah".to_string()));
    assert_eq!(scorers.rows[1][3], Cell::Number(15.0));

    let teams = &sheets[3];
    assert_eq!(teams.rows.len(), 4);
    assert_eq!(teams.rows[1][1], Cell::Text("Liverpool".to_string()));
    assert_eq!(teams.rows[1][5], Cell::Number(270.0));
}

#[test]
fn export_writes_workbook() {
    let dir = std::env::temp_dir().join(format!("pl_stats_export_{}", std::process::id()));
    let path = dir.join("snapshot.xlsx");
    let snapshot = build_snapshot(&season());

    let report = export_snapshot(&path, &snapshot).expect("export should succeed");
    assert_eq!(report.sheets, 4);
    assert_eq!(report.rows, 5 + 5 + 5 + 3);
    let meta = fs::metadata(&path).expect("workbook should exist");
    assert!(meta.len() > 0);

    let _ = fs::remove_dir_all(&dir);
}
