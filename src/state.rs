use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::config::DashboardConfig;
use crate::scheduler::{RefreshReason, RefreshScheduler};

pub const FETCH_ERROR_MESSAGE: &str =
    "Failed to fetch stats. Make sure the API server is running.";
pub const UPDATE_ERROR_MESSAGE: &str = "Failed to trigger stats update";
pub const REFRESH_WARNING: &str = "Refresh failed, showing last loaded stats";
pub const UPDATE_WARNING: &str = "Update request failed, showing last loaded stats";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Stats,
    Teams,
}

impl Screen {
    pub fn needs_dashboard(self) -> bool {
        matches!(self, Screen::Stats | Screen::Teams)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStat {
    pub player: String,
    pub team: String,
    pub goals: u32,
    pub assists: u32,
    pub total_points: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamStat {
    pub team: String,
    pub player_count: u32,
    pub total_goals: u32,
    pub total_assists: u32,
    pub total_points: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_players: u32,
    pub total_teams: u32,
    pub top_scorers: Vec<PlayerStat>,
    pub top_assists: Vec<PlayerStat>,
    pub top_points: Vec<PlayerStat>,
    pub team_stats: Vec<TeamStat>,
    // Server-side aggregation time, as sent.
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiHealth {
    pub status: String,
    pub timestamp: Option<String>,
    pub data_loaded: bool,
    pub last_update: Option<String>,
}

impl ApiHealth {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView<'a> {
    Loading,
    Error(&'a str),
    Ready {
        snapshot: &'a StatsSnapshot,
        refreshing: bool,
        warning: Option<&'a str>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    Applied,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecomputePhase {
    Idle,
    Requested { generation: u64 },
    Grace,
}

/// View state of one mounted stats dashboard.
///
/// Responses are matched by generation: only generations issued by this mount and newer
/// than the last settled response are applied.
#[derive(Debug, Clone)]
pub struct Dashboard {
    snapshot: Option<StatsSnapshot>,
    error: Option<String>,
    warning: Option<String>,
    last_update: Option<DateTime<Local>>,
    first_generation: u64,
    latest_issued: u64,
    latest_settled: u64,
    recompute: RecomputePhase,
    scheduler: RefreshScheduler,
}

impl Dashboard {
    pub fn mount(
        generation: u64,
        interval: Duration,
        grace: Duration,
        auto_refresh: bool,
        now: Instant,
    ) -> Self {
        Self {
            snapshot: None,
            error: None,
            warning: None,
            last_update: None,
            first_generation: generation,
            latest_issued: generation,
            latest_settled: generation.saturating_sub(1),
            recompute: RecomputePhase::Idle,
            scheduler: RefreshScheduler::new(interval, grace, auto_refresh, now),
        }
    }

    pub fn snapshot(&self) -> Option<&StatsSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn auto_refresh(&self) -> bool {
        self.scheduler.auto_refresh()
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn loading(&self) -> bool {
        self.latest_issued > self.latest_settled || self.recompute != RecomputePhase::Idle
    }

    pub fn recompute_pending(&self) -> bool {
        self.recompute != RecomputePhase::Idle
    }

    pub fn view(&self) -> DashboardView<'_> {
        if let Some(snapshot) = self.snapshot.as_ref() {
            return DashboardView::Ready {
                snapshot,
                refreshing: self.loading(),
                warning: self.warning.as_deref(),
            };
        }
        match self.error.as_deref() {
            Some(message) => DashboardView::Error(message),
            None => DashboardView::Loading,
        }
    }

    pub fn begin_fetch(&mut self, generation: u64) {
        self.latest_issued = self.latest_issued.max(generation);
        if self.snapshot.is_none() {
            self.error = None;
        }
    }

    pub fn apply_stats(
        &mut self,
        generation: u64,
        snapshot: StatsSnapshot,
        now: DateTime<Local>,
    ) -> Settle {
        if !self.accepts(generation) {
            return Settle::Stale;
        }
        self.latest_settled = generation;
        self.snapshot = Some(snapshot);
        self.last_update = Some(now);
        self.error = None;
        self.warning = None;
        Settle::Applied
    }

    pub fn apply_failure(&mut self, generation: u64) -> Settle {
        if !self.accepts(generation) {
            return Settle::Stale;
        }
        self.latest_settled = generation;
        if self.snapshot.is_some() {
            self.warning = Some(REFRESH_WARNING.to_string());
        } else {
            self.error = Some(FETCH_ERROR_MESSAGE.to_string());
        }
        Settle::Applied
    }

    pub fn begin_recompute(&mut self, generation: u64) -> bool {
        if self.recompute != RecomputePhase::Idle {
            return false;
        }
        self.recompute = RecomputePhase::Requested { generation };
        if self.snapshot.is_none() {
            self.error = None;
        }
        true
    }

    pub fn recompute_accepted(&mut self, generation: u64, now: Instant) -> Settle {
        if self.recompute != (RecomputePhase::Requested { generation }) {
            return Settle::Stale;
        }
        self.recompute = RecomputePhase::Grace;
        self.scheduler.arm_follow_up(now);
        Settle::Applied
    }

    pub fn recompute_failed(&mut self, generation: u64) -> Settle {
        if self.recompute != (RecomputePhase::Requested { generation }) {
            return Settle::Stale;
        }
        self.recompute = RecomputePhase::Idle;
        if self.snapshot.is_some() {
            self.warning = Some(UPDATE_WARNING.to_string());
        } else {
            self.error = Some(UPDATE_ERROR_MESSAGE.to_string());
        }
        Settle::Applied
    }

    pub fn toggle_auto_refresh(&mut self, now: Instant) -> bool {
        let enabled = !self.scheduler.auto_refresh();
        self.scheduler.set_auto_refresh(enabled, now);
        enabled
    }

    pub fn poll_schedule(&mut self, now: Instant) -> Option<RefreshReason> {
        let reason = self.scheduler.poll(now)?;
        if reason == RefreshReason::FollowUp && self.recompute == RecomputePhase::Grace {
            self.recompute = RecomputePhase::Idle;
        }
        Some(reason)
    }

    fn accepts(&self, generation: u64) -> bool {
        generation >= self.first_generation
            && generation <= self.latest_issued
            && generation > self.latest_settled
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub dashboard: Option<Dashboard>,
    pub health: Option<ApiHealth>,
    pub health_error: Option<String>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub team_scroll: usize,
    pub team_rows: usize,
    pub base_url: String,
    pub auto_refresh: bool,
    pub export_dir: Option<PathBuf>,
    refresh_interval: Duration,
    update_grace: Duration,
    next_generation: u64,
}

impl AppState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            screen: Screen::Home,
            dashboard: None,
            health: None,
            health_error: None,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
            team_scroll: 0,
            team_rows: 10,
            base_url: config.base_url.clone(),
            auto_refresh: config.auto_refresh,
            export_dir: config.export_dir.clone(),
            refresh_interval: config.refresh_interval,
            update_grace: config.update_grace,
            next_generation: 1,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn issue_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    pub fn navigate(&mut self, screen: Screen, now: Instant) -> Option<ProviderCommand> {
        self.screen = screen;
        if !screen.needs_dashboard() {
            self.unmount_dashboard();
            return None;
        }
        if self.dashboard.is_some() {
            return None;
        }
        Some(self.mount_dashboard(now))
    }

    pub fn mount_dashboard(&mut self, now: Instant) -> ProviderCommand {
        let generation = self.issue_generation();
        self.dashboard = Some(Dashboard::mount(
            generation,
            self.refresh_interval,
            self.update_grace,
            self.auto_refresh,
            now,
        ));
        self.team_scroll = 0;
        ProviderCommand::FetchStats { generation }
    }

    pub fn unmount_dashboard(&mut self) {
        if self.dashboard.take().is_some() {
            self.push_log("[INFO] Dashboard closed, refresh timer stopped");
        }
    }

    pub fn request_refresh(&mut self) -> Option<ProviderCommand> {
        self.dashboard.as_ref()?;
        let generation = self.issue_generation();
        let dashboard = self.dashboard.as_mut()?;
        dashboard.begin_fetch(generation);
        Some(ProviderCommand::FetchStats { generation })
    }

    pub fn request_recompute(&mut self) -> Option<ProviderCommand> {
        self.dashboard.as_ref()?;
        let generation = self.issue_generation();
        let dashboard = self.dashboard.as_mut()?;
        if !dashboard.begin_recompute(generation) {
            self.push_log("[INFO] Data update already in progress");
            return None;
        }
        Some(ProviderCommand::TriggerRecompute { generation })
    }

    pub fn toggle_auto_refresh(&mut self, now: Instant) -> Option<bool> {
        let enabled = self.dashboard.as_mut()?.toggle_auto_refresh(now);
        self.auto_refresh = enabled;
        Some(enabled)
    }

    pub fn tick(&mut self, now: Instant) -> Vec<ProviderCommand> {
        let mut commands = Vec::new();
        loop {
            let Some(reason) = self.dashboard.as_mut().and_then(|d| d.poll_schedule(now)) else {
                break;
            };
            if reason == RefreshReason::FollowUp {
                self.push_log("[INFO] Fetching stats after data update");
            }
            if let Some(cmd) = self.request_refresh() {
                commands.push(cmd);
            }
        }
        commands
    }

    pub fn export_command(&mut self, now: DateTime<Local>) -> Option<ProviderCommand> {
        let Some(snapshot) = self.dashboard.as_ref().and_then(|d| d.snapshot()) else {
            self.push_log("[INFO] Nothing to export yet");
            return None;
        };
        let file_name = format!("pl_stats_{}.xlsx", now.format("%Y%m%d_%H%M%S"));
        let path = match self.export_dir.as_ref() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        };
        Some(ProviderCommand::ExportSnapshot {
            path,
            snapshot: Box::new(snapshot.clone()),
        })
    }

    // Last offset that still fills the visible rows.
    pub fn max_team_scroll(&self) -> usize {
        let total = self
            .dashboard
            .as_ref()
            .and_then(|d| d.snapshot())
            .map(|s| s.team_stats.len())
            .unwrap_or(0);
        total.saturating_sub(self.team_rows.max(1))
    }

    pub fn scroll_teams(&mut self, down: bool) {
        if down {
            self.team_scroll = (self.team_scroll + 1).min(self.max_team_scroll());
        } else {
            self.team_scroll = self.team_scroll.saturating_sub(1);
        }
    }

    pub fn set_team_rows(&mut self, rows: usize) {
        self.team_rows = rows;
        self.team_scroll = self.team_scroll.min(self.max_team_scroll());
    }
}

#[derive(Debug)]
pub enum Delta {
    StatsLoaded {
        generation: u64,
        snapshot: StatsSnapshot,
    },
    StatsFailed {
        generation: u64,
        error: String,
    },
    RecomputeAccepted {
        generation: u64,
    },
    RecomputeFailed {
        generation: u64,
        error: String,
    },
    SetHealth(ApiHealth),
    HealthFailed(String),
    ExportFinished {
        path: PathBuf,
        rows: usize,
    },
    ExportFailed(String),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchStats {
        generation: u64,
    },
    TriggerRecompute {
        generation: u64,
    },
    FetchHealth,
    ExportSnapshot {
        path: PathBuf,
        snapshot: Box<StatsSnapshot>,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::StatsLoaded {
            generation,
            snapshot,
        } => {
            let players = snapshot.total_players;
            let teams = snapshot.total_teams;
            let Some(dashboard) = state.dashboard.as_mut() else {
                state.push_log(format!("[INFO] Ignored stats #{generation} after close"));
                return;
            };
            match dashboard.apply_stats(generation, snapshot, Local::now()) {
                Settle::Applied => {
                    state.team_scroll = state.team_scroll.min(state.max_team_scroll());
                    state.push_log(format!(
                        "[INFO] Stats loaded: {players} players, {teams} teams"
                    ));
                }
                Settle::Stale => {
                    state.push_log(format!("[INFO] Dropped stale stats #{generation}"));
                }
            }
        }
        Delta::StatsFailed { generation, error } => {
            let Some(dashboard) = state.dashboard.as_mut() else {
                return;
            };
            let had_data = dashboard.snapshot().is_some();
            match dashboard.apply_failure(generation) {
                Settle::Applied if had_data => {
                    state.push_log(format!("[WARN] Background refresh failed: {error}"));
                }
                Settle::Applied => {
                    state.push_log(format!("[WARN] Stats fetch error: {error}"));
                }
                Settle::Stale => {
                    state.push_log(format!("[INFO] Dropped stale failure #{generation}"));
                }
            }
        }
        Delta::RecomputeAccepted { generation } => {
            let Some(dashboard) = state.dashboard.as_mut() else {
                return;
            };
            let grace = dashboard.scheduler().grace();
            if dashboard.recompute_accepted(generation, Instant::now()) == Settle::Applied {
                state.push_log(format!(
                    "[INFO] Data update triggered, refetching in {}s",
                    grace.as_secs()
                ));
            }
        }
        Delta::RecomputeFailed { generation, error } => {
            let Some(dashboard) = state.dashboard.as_mut() else {
                return;
            };
            if dashboard.recompute_failed(generation) == Settle::Applied {
                state.push_log(format!("[WARN] Update trigger error: {error}"));
            }
        }
        Delta::SetHealth(health) => {
            state.push_log(format!("[INFO] API status: {}", health.status));
            state.health = Some(health);
            state.health_error = None;
        }
        Delta::HealthFailed(error) => {
            state.push_log(format!("[WARN] Health check error: {error}"));
            state.health = None;
            state.health_error = Some(error);
        }
        Delta::ExportFinished { path, rows } => {
            state.push_log(format!("[INFO] Exported {rows} rows to {}", path.display()));
        }
        Delta::ExportFailed(error) => {
            state.push_log(format!("[WARN] Export error: {error}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
