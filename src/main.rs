use std::io;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use pl_stats_terminal::config::{DashboardConfig, DataSource};
use pl_stats_terminal::leaderboard::{
    self, PlayerBoard, board_metrics, display_name, format_interval, format_last_update,
    quick_stats,
};
use pl_stats_terminal::state::{
    AppState, Dashboard, DashboardView, Delta, ProviderCommand, Screen, StatsSnapshot,
    apply_delta,
};
use pl_stats_terminal::{fake_feed, feed};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    frame_count: usize,
}

impl App {
    fn new(config: &DashboardConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(config),
            should_quit: false,
            cmd_tx,
            frame_count: 0,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.navigate(Screen::Home, now),
            KeyCode::Char('2') => self.navigate(Screen::Stats, now),
            KeyCode::Char('3') => self.navigate(Screen::Teams, now),
            KeyCode::Char('a') | KeyCode::Char('A') => match self.state.toggle_auto_refresh(now) {
                Some(enabled) => self.state.push_log(format!(
                    "[INFO] Auto-refresh {}",
                    if enabled { "ON" } else { "OFF" }
                )),
                None => self.state.push_log("[INFO] Open the stats screen first"),
            },
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if let Some(cmd) = self.state.request_refresh() {
                    self.send(cmd);
                }
            }
            KeyCode::Char('u') | KeyCode::Char('U') => {
                if let Some(cmd) = self.state.request_recompute() {
                    self.state.push_log("[INFO] Data update requested");
                    self.send(cmd);
                }
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(cmd) = self.state.export_command(Local::now()) {
                    self.send(cmd);
                }
            }
            KeyCode::Char('h') | KeyCode::Char('H') => self.send(ProviderCommand::FetchHealth),
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_teams(true),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_teams(false),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn navigate(&mut self, screen: Screen, now: Instant) {
        if let Some(cmd) = self.state.navigate(screen, now) {
            self.send(cmd);
        }
    }

    // A dead channel settles the request as failed.
    fn send(&mut self, cmd: ProviderCommand) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[WARN] Stats provider unavailable");
            self.settle_unsent(cmd);
            return;
        };
        if let Err(mpsc::SendError(cmd)) = tx.send(cmd) {
            self.state.push_log("[WARN] Stats provider stopped");
            self.settle_unsent(cmd);
        }
    }

    fn settle_unsent(&mut self, cmd: ProviderCommand) {
        let delta = match cmd {
            ProviderCommand::FetchStats { generation } => Delta::StatsFailed {
                generation,
                error: "provider unavailable".to_string(),
            },
            ProviderCommand::TriggerRecompute { generation } => Delta::RecomputeFailed {
                generation,
                error: "provider unavailable".to_string(),
            },
            ProviderCommand::FetchHealth => Delta::HealthFailed("provider unavailable".to_string()),
            ProviderCommand::ExportSnapshot { .. } => {
                Delta::ExportFailed("provider unavailable".to_string())
            }
        };
        apply_delta(&mut self.state, delta);
    }

    fn run_schedule(&mut self) {
        for cmd in self.state.tick(Instant::now()) {
            self.send(cmd);
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = DashboardConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    match config.source {
        DataSource::Api => feed::spawn_provider(config.base_url.clone(), tx, cmd_rx),
        DataSource::Fake => fake_feed::spawn_fake_provider(tx, cmd_rx),
    }

    let mut app = App::new(&config, Some(cmd_tx));
    app.send(ProviderCommand::FetchHealth);
    app.navigate(Screen::Stats, Instant::now());
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.run_schedule();

        let size = terminal.size()?;
        app.state.set_team_rows(team_rows_for(screen_chunks(size)[1]));
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            app.frame_count = app.frame_count.wrapping_add(1);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn screen_chunks(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(2),
        ])
        .split(area)
}

// Bordered block plus the column header row.
fn team_rows_for(body: Rect) -> usize {
    body.height.saturating_sub(3) as usize
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = screen_chunks(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Home => render_home(frame, chunks[1], &app.state),
        Screen::Stats => render_stats(frame, chunks[1], &app.state),
        Screen::Teams => render_teams(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(app.state.screen))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let state = &app.state;
    let mut line1 = format!("  PL STATS | {}", screen_label(state.screen));
    if let Some(dashboard) = state.dashboard.as_ref() {
        line1.push_str(&format!(
            " | Updated: {} | Auto-refresh {}",
            format_last_update(dashboard.last_update()),
            if dashboard.auto_refresh() {
                format!("ON ({})", format_interval(dashboard.scheduler().interval()))
            } else {
                "OFF".to_string()
            }
        ));
        if dashboard.loading() {
            let spin = SPINNER[app.frame_count % SPINNER.len()];
            let what = if dashboard.recompute_pending() {
                "updating data"
            } else {
                "refreshing"
            };
            line1.push_str(&format!(" | {spin} {what}"));
        }
    }
    let line2 = format!("  {}", state.base_url);
    format!("{line1}\n{line2}")
}

fn footer_text(screen: Screen) -> String {
    let keys: &[&str] = match screen {
        Screen::Home => &["1 Home", "2 Stats", "3 Teams", "h Health"],
        Screen::Stats => &[
            "1 Home",
            "3 Teams",
            "r Refresh",
            "u Update data",
            "a Auto-refresh",
            "e Export",
        ],
        Screen::Teams => &[
            "1 Home",
            "2 Stats",
            "j/k/↑/↓ Scroll",
            "r Refresh",
            "a Auto-refresh",
            "e Export",
        ],
    };
    format!("{} | ? Help | q Quit", keys.join(" | "))
}

fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Home => "HOME",
        Screen::Stats => "LIVE STATS",
        Screen::Teams => "TEAMS",
    }
}

fn render_home(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = vec![
        "Premier League Fantasy Stats".to_string(),
        String::new(),
        "Top scorers, assist providers, fantasy points leaders and team totals,".to_string(),
        "refreshed from the stats API.".to_string(),
        String::new(),
        "  2  Stats dashboard".to_string(),
        "  3  Team leaderboard".to_string(),
        String::new(),
    ];
    lines.extend(health_lines(state));

    let home = Paragraph::new(lines.join("\n"))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Home").borders(Borders::ALL));
    frame.render_widget(home, area);
}

fn health_lines(state: &AppState) -> Vec<String> {
    if let Some(health) = state.health.as_ref() {
        let mut lines = vec![format!(
            "API: {} ({})",
            health.status,
            if health.data_loaded { "data loaded" } else { "no data" }
        )];
        if let Some(last) = health.last_update.as_deref() {
            lines.push(format!("Server data updated: {last}"));
        }
        return lines;
    }
    if let Some(err) = state.health_error.as_deref() {
        return vec![format!("API unreachable: {err}")];
    }
    vec!["API: checking...".to_string()]
}

fn render_stats(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(dashboard) = state.dashboard.as_ref() else {
        render_centered_text(frame, area, "Stats dashboard not mounted", Style::default());
        return;
    };
    match dashboard.view() {
        DashboardView::Loading => render_loading(frame, area),
        DashboardView::Error(message) => render_error(frame, area, message),
        DashboardView::Ready {
            snapshot, warning, ..
        } => render_dashboard(frame, area, snapshot, warning),
    }
}

fn render_loading(frame: &mut Frame, area: Rect) {
    render_centered_text(
        frame,
        area,
        "Loading Premier League stats...",
        Style::default().fg(Color::Cyan),
    );
}

fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    let popup = centered_rect(60, 40, area);
    let text = format!("{message}\n\nPress r to try again");
    let error = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Red))
        .block(
            Block::default()
                .title("Error Loading Stats")
                .borders(Borders::ALL),
        );
    frame.render_widget(error, popup);
}

fn render_dashboard(
    frame: &mut Frame,
    area: Rect,
    snapshot: &StatsSnapshot,
    warning: Option<&str>,
) {
    let warning_height = if warning.is_some() { 1 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(warning_height),
            Constraint::Length(5),
            Constraint::Length(13),
            Constraint::Min(3),
        ])
        .split(area);

    if let Some(warning) = warning {
        let banner = Paragraph::new(format!(" ! {warning}"))
            .style(Style::default().fg(Color::Black).bg(Color::Yellow));
        frame.render_widget(banner, rows[0]);
    }

    render_quick_stats(frame, rows[1], snapshot);

    let boards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[2]);
    for (idx, board) in PlayerBoard::ALL.into_iter().enumerate() {
        let text = player_board_text(snapshot, board);
        let widget = Paragraph::new(text)
            .block(Block::default().title(board.title()).borders(Borders::ALL));
        frame.render_widget(widget, boards[idx]);
    }

    let block = Block::default().title("Team Statistics").borders(Borders::ALL);
    let inner = block.inner(rows[3]);
    frame.render_widget(block, rows[3]);
    let teams = team_table_text(snapshot, 0, inner.height.saturating_sub(1) as usize);
    frame.render_widget(Paragraph::new(teams), inner);
}

fn render_quick_stats(frame: &mut Frame, area: Rect, snapshot: &StatsSnapshot) {
    let quick = quick_stats(snapshot);
    let cards = [
        ("Players", quick.total_players.to_string(), String::new()),
        ("Teams", quick.total_teams.to_string(), String::new()),
        ("Top Goals", quick.top_goals.to_string(), quick.top_scorer),
        ("Top Assists", quick.top_assists.to_string(), quick.top_assister),
    ];
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    for (idx, (label, value, sub)) in cards.into_iter().enumerate() {
        let highlight = idx >= 2;
        let value_style = if highlight {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let mut lines = vec![Line::styled(value, value_style)];
        if !sub.is_empty() {
            lines.push(Line::styled(sub, Style::default().fg(Color::DarkGray)));
        }
        let card = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().title(label).borders(Borders::ALL));
        frame.render_widget(card, cols[idx]);
    }
}

fn player_board_text(snapshot: &StatsSnapshot, board: PlayerBoard) -> String {
    let entries = leaderboard::player_leaderboard(snapshot, board);
    if entries.is_empty() {
        return "No data".to_string();
    }
    let metrics = board_metrics(board);
    entries
        .iter()
        .map(|entry| {
            let stats = metrics
                .iter()
                .map(|m| format!("{}{}", m.value(entry.player), short_unit(*m)))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "#{:<2} {:<16} {:<4} {}",
                entry.rank,
                clip(display_name(&entry.player.player), 16),
                team_code(&entry.player.team),
                stats
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn short_unit(metric: leaderboard::Metric) -> &'static str {
    match metric {
        leaderboard::Metric::Goals => "g",
        leaderboard::Metric::Assists => "a",
        leaderboard::Metric::Points => "pts",
    }
}

fn render_teams(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(dashboard) = state.dashboard.as_ref() else {
        render_centered_text(frame, area, "Team leaderboard not mounted", Style::default());
        return;
    };
    match dashboard.view() {
        DashboardView::Loading => render_loading(frame, area),
        DashboardView::Error(message) => render_error(frame, area, message),
        DashboardView::Ready { snapshot, .. } => {
            render_team_leaderboard(frame, area, snapshot, state.team_scroll, dashboard)
        }
    }
}

fn render_team_leaderboard(
    frame: &mut Frame,
    area: Rect,
    snapshot: &StatsSnapshot,
    scroll: usize,
    dashboard: &Dashboard,
) {
    let title = match dashboard.warning() {
        Some(warning) => format!("Team Leaderboard ({warning})"),
        None => "Team Leaderboard".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let visible = team_rows_for(area);
    frame.render_widget(Paragraph::new(team_table_text(snapshot, scroll, visible)), inner);
}

fn team_table_text(snapshot: &StatsSnapshot, scroll: usize, visible: usize) -> String {
    let ranked = leaderboard::team_leaderboard(snapshot);
    let mut lines = vec![format!(
        "{:<4} {:<20} {:>7} {:>6} {:>7} {:>7}",
        "#", "Team", "Players", "Goals", "Assists", "Points"
    )];
    if ranked.is_empty() {
        lines.push("No team data".to_string());
        return lines.join("\n");
    }
    let start = scroll.min(ranked.len().saturating_sub(visible.max(1)));
    for entry in ranked.iter().skip(start).take(visible) {
        lines.push(format!(
            "#{:<3} {:<20} {:>7} {:>6} {:>7} {:>7}",
            entry.rank,
            clip(display_name(&entry.team.team), 20),
            entry.team.player_count,
            entry.team.total_goals,
            entry.team.total_assists,
            entry.team.total_points
        ));
    }
    lines.join("\n")
}

fn team_code(team: &str) -> String {
    let name = display_name(team);
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out = text.chars().take(max.saturating_sub(1)).collect::<String>();
    out.push('…');
    out
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_centered_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: area.height.min(1),
    };
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style);
    frame.render_widget(paragraph, text_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "PL Stats Terminal - Help",
        "",
        "Screens:",
        "  1            Home",
        "  2            Stats dashboard",
        "  3            Team leaderboard",
        "",
        "Data:",
        "  r            Refresh / try again",
        "  u            Update data on the server",
        "  a            Toggle auto-refresh",
        "  e            Export snapshot (.xlsx)",
        "  h            Check API health",
        "",
        "  j/k or ↑/↓   Scroll teams",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
