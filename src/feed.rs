use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::snapshot_export;
use crate::state::{Delta, ProviderCommand};
use crate::stats_fetch;

// One thread per request; ordering is settled by generation on apply.
pub fn spawn_provider(base_url: String, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let _ = tx.send(Delta::Log(format!("[INFO] Stats API: {base_url}")));

        while let Ok(cmd) = cmd_rx.recv() {
            let tx = tx.clone();
            let base_url = base_url.clone();
            let job = move || match cmd {
                ProviderCommand::FetchStats { generation } => {
                    let delta = match stats_fetch::fetch_stats(&base_url) {
                        Ok(snapshot) => Delta::StatsLoaded {
                            generation,
                            snapshot,
                        },
                        Err(err) => Delta::StatsFailed {
                            generation,
                            error: format!("{err:#}"),
                        },
                    };
                    let _ = tx.send(delta);
                }
                ProviderCommand::TriggerRecompute { generation } => {
                    let delta = match stats_fetch::trigger_recompute(&base_url) {
                        Ok(()) => Delta::RecomputeAccepted { generation },
                        Err(err) => Delta::RecomputeFailed {
                            generation,
                            error: format!("{err:#}"),
                        },
                    };
                    let _ = tx.send(delta);
                }
                ProviderCommand::FetchHealth => {
                    let delta = match stats_fetch::fetch_health(&base_url) {
                        Ok(health) => Delta::SetHealth(health),
                        Err(err) => Delta::HealthFailed(format!("{err:#}")),
                    };
                    let _ = tx.send(delta);
                }
                ProviderCommand::ExportSnapshot { path, snapshot } => {
                    let _ = tx.send(snapshot_export::run_export(&path, &snapshot));
                }
            };
            thread::spawn(job);
        }
    });
}
