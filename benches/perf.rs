use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use pl_stats_terminal::fake_feed::build_snapshot;
use pl_stats_terminal::leaderboard::{PlayerBoard, player_leaderboard, team_leaderboard};
use pl_stats_terminal::state::PlayerStat;
use pl_stats_terminal::stats_fetch::parse_stats_json;

const STATS_JSON: &str = include_str!("../tests/fixtures/stats.json");

fn season(players: usize, teams: usize) -> Vec<PlayerStat> {
    (0..players)
        .map(|i| PlayerStat {
            player: format!("Player {i}"),
            team: format!("Team {}", i % teams),
            goals: (i * 7 % 23) as u32,
            assists: (i * 5 % 17) as u32,
            total_points: (i * 13 % 211) as i32,
        })
        .collect()
}

fn bench_stats_parse(c: &mut Criterion) {
    c.bench_function("stats_parse", |b| {
        b.iter(|| {
            let snapshot = parse_stats_json(black_box(STATS_JSON)).unwrap();
            black_box(snapshot.total_players);
        })
    });
}

fn bench_leaderboards(c: &mut Criterion) {
    let snapshot = build_snapshot(&season(600, 20));
    c.bench_function("leaderboards_render", |b| {
        b.iter(|| {
            for board in PlayerBoard::ALL {
                black_box(player_leaderboard(black_box(&snapshot), board).len());
            }
            black_box(team_leaderboard(black_box(&snapshot)).len());
        })
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let players = season(600, 20);
    c.bench_function("snapshot_aggregate", |b| {
        b.iter(|| {
            let snapshot = build_snapshot(black_box(&players));
            black_box(snapshot.team_stats.len());
        })
    });
}

criterion_group!(benches, bench_stats_parse, bench_leaderboards, bench_aggregate);
criterion_main!(benches);
