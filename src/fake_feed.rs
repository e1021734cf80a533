use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use chrono::Local;
use rand::Rng;

use crate::snapshot_export;
use crate::state::{ApiHealth, Delta, PlayerStat, ProviderCommand, StatsSnapshot, TeamStat};

const SERVER_TOP_N: usize = 10;

const TEAMS: &[(&str, &[&str])] = &[
    ("Arsenal", &["Saka", "Odegaard", "Havertz", "Martinelli", "Rice"]),
    ("Aston Villa", &["Watkins", "Rogers", "McGinn", "Tielemans"]),
    ("Bournemouth", &["Semenyo", "Kluivert", "Evanilson"]),
    ("Brentford", &["Mbeumo", "Wissa", "Schade", "Damsgaard"]),
    ("Brighton", &["Welbeck", "Mitoma", "Joao Pedro", "Minteh"]),
    ("Chelsea", &["Palmer", "Jackson", "Madueke", "Neto", "Enzo"]),
    ("Crystal Palace", &["Mateta", "Eze", "Sarr"]),
    ("Everton", &["Calvert-Lewin", "Ndiaye", "McNeil"]),
    ("Fulham", &["Jimenez", "Iwobi", "Smith Rowe", "Muniz"]),
    ("Liverpool", &["Salah", "Diaz", "Gakpo", "Szoboszlai", "Mac Allister"]),
    ("Manchester City", &["Haaland", "Foden", "De Bruyne", "Marmoush", "Bernardo"]),
    ("Manchester Utd", &["Fernandes", "Hojlund", "Amad", "Garnacho"]),
    ("Newcastle Utd", &["Isak", "Gordon", "Barnes", "Murphy"]),
    ("Nott'ham Forest", &["Wood", "Hudson-Odoi", "Elanga", "Gibbs-White"]),
    ("Tottenham", &["Son", "Solanke", "Johnson", "Maddison", "Kulusevski"]),
    ("West Ham", &["Bowen", "Kudus", "Paqueta"]),
    ("Wolves", &["Cunha", "Strand Larsen", "Bellegarde"]),
];

#[derive(Debug, Clone)]
struct FakePlayer {
    name: String,
    team: String,
    goals: u32,
    assists: u32,
    appearances: u32,
}

pub fn spawn_fake_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let mut players = seed_players(&mut rng);
        let mut updated_at = Local::now();
        let _ = tx.send(Delta::Log("[INFO] Using offline demo stats".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            thread::sleep(Duration::from_millis(rng.gen_range(150..600)));
            match cmd {
                ProviderCommand::FetchStats { generation } => {
                    let mut snapshot = build_snapshot(&to_stats(&players));
                    snapshot.last_updated = Some(updated_at.to_rfc3339());
                    let _ = tx.send(Delta::StatsLoaded {
                        generation,
                        snapshot,
                    });
                }
                ProviderCommand::TriggerRecompute { generation } => {
                    play_gameweek(&mut players, &mut rng);
                    updated_at = Local::now();
                    let _ = tx.send(Delta::RecomputeAccepted { generation });
                }
                ProviderCommand::FetchHealth => {
                    let _ = tx.send(Delta::SetHealth(ApiHealth {
                        status: "healthy".to_string(),
                        timestamp: Some(Local::now().to_rfc3339()),
                        data_loaded: true,
                        last_update: Some(updated_at.to_rfc3339()),
                    }));
                }
                ProviderCommand::ExportSnapshot { path, snapshot } => {
                    let _ = tx.send(snapshot_export::run_export(&path, &snapshot));
                }
            }
        }
    });
}

/// Aggregates a full player table like the stats server: top 10 per stat (stable on
/// ties) and per-team sums ordered by team name.
pub fn build_snapshot(players: &[PlayerStat]) -> StatsSnapshot {
    let top_by = |key: fn(&PlayerStat) -> i64| {
        let mut ranked: Vec<&PlayerStat> = players.iter().collect();
        ranked.sort_by(|a, b| key(b).cmp(&key(a)));
        ranked
            .into_iter()
            .take(SERVER_TOP_N)
            .cloned()
            .collect::<Vec<_>>()
    };

    let mut teams: BTreeMap<&str, TeamStat> = BTreeMap::new();
    for player in players {
        let team = teams
            .entry(player.team.as_str())
            .or_insert_with(|| TeamStat {
                team: player.team.clone(),
                ..TeamStat::default()
            });
        team.player_count += 1;
        team.total_goals += player.goals;
        team.total_assists += player.assists;
        team.total_points += player.total_points;
    }
    let team_stats: Vec<TeamStat> = teams.into_values().collect();

    StatsSnapshot {
        total_players: players.len() as u32,
        total_teams: team_stats.len() as u32,
        top_scorers: top_by(|p| i64::from(p.goals)),
        top_assists: top_by(|p| i64::from(p.assists)),
        top_points: top_by(|p| i64::from(p.total_points)),
        team_stats,
        last_updated: None,
    }
}

fn seed_players(rng: &mut impl Rng) -> Vec<FakePlayer> {
    let mut players = Vec::new();
    for (team, names) in TEAMS {
        for name in names.iter() {
            players.push(FakePlayer {
                name: name.to_string(),
                team: team.to_string(),
                goals: 0,
                assists: 0,
                appearances: 0,
            });
        }
    }
    for _ in 0..rng.gen_range(6..10) {
        play_gameweek(&mut players, rng);
    }
    players
}

fn play_gameweek(players: &mut [FakePlayer], rng: &mut impl Rng) {
    for player in players.iter_mut() {
        if !rng.gen_bool(0.85) {
            continue;
        }
        player.appearances += 1;
        if rng.gen_bool(0.22) {
            player.goals += rng.gen_range(1..=2);
        }
        if rng.gen_bool(0.18) {
            player.assists += 1;
        }
    }
}

fn to_stats(players: &[FakePlayer]) -> Vec<PlayerStat> {
    players
        .iter()
        .map(|p| PlayerStat {
            player: p.name.clone(),
            team: p.team.clone(),
            goals: p.goals,
            assists: p.assists,
            total_points: fantasy_points(p),
        })
        .collect()
}

fn fantasy_points(player: &FakePlayer) -> i32 {
    (player.appearances * 2 + player.goals * 5 + player.assists * 3) as i32
}
