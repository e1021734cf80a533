pub mod config;
pub mod fake_feed;
pub mod feed;
pub mod http_client;
pub mod leaderboard;
pub mod scheduler;
pub mod snapshot_export;
pub mod state;
pub mod stats_fetch;
