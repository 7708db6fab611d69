use std::io;
use std::time::{Duration, Instant};

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
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

use nba_props_terminal::board::{Board, MergedRow, format_minutes, output_columns};
use nba_props_terminal::config::Config;
use nba_props_terminal::export::{default_export_path, export_board_xlsx};
use nba_props_terminal::logging::init_file_logging;
use nba_props_terminal::pipeline::{LiveSource, run_cycle};
use nba_props_terminal::signal::Signal;
use nba_props_terminal::sources::StatCategory;
use nba_props_terminal::state::{AppState, BoardView};

struct App {
    state: AppState,
    config: Config,
    should_quit: bool,
    refresh_every: Duration,
    last_refresh: Instant,
}

impl App {
    fn new(config: Config) -> Self {
        let state = AppState::new(config.live_mode, config.game_id.clone());
        Self {
            state,
            refresh_every: Duration::from_secs(config.refresh_secs),
            config,
            should_quit: false,
            last_refresh: Instant::now(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char(' ') => self.state.toggle_selected_bet(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.state.clear_bets(),
            KeyCode::Char('v') | KeyCode::Char('V') => self.state.toggle_view(),
            KeyCode::Char('g') | KeyCode::Char('G') => {
                self.state.cycle_game();
                self.refresh();
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.state.cycle_live_mode();
                self.refresh();
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.state.show_keys = !self.state.show_keys
            }
            KeyCode::Char('e') | KeyCode::Char('E') => self.export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn refresh(&mut self) {
        let outcome = run_cycle(&self.config, &self.state.cycle_request());
        let ok = outcome.is_ok();
        self.state.apply_cycle(outcome);
        if ok {
            self.state.push_log("[INFO] Board refreshed");
        }
        self.last_refresh = Instant::now();
    }

    fn maybe_refresh(&mut self) {
        if self.last_refresh.elapsed() >= self.refresh_every {
            self.refresh();
        }
    }

    fn export(&mut self) {
        let Some(board) = &self.state.board else {
            self.state.push_log("[INFO] Nothing to export yet");
            return;
        };
        let path = default_export_path(&self.config.export_dir);
        match export_board_xlsx(&path, board, &self.state.bets) {
            Ok(report) => self.state.push_log(format!(
                "[INFO] Exported {} rows, {} bets to {}",
                report.rows,
                report.bets,
                report.path.display()
            )),
            Err(err) => self.state.push_log(format!("[WARN] Export failed: {err:#}")),
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = Config::from_env();
    let _log_guard = init_file_logging(config.log_dir.as_deref());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(config);
    app.refresh();
    let res = run_app(&mut terminal, &mut app);

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

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        app.maybe_refresh();

        terminal.draw(|f| ui(f, &app.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    if state.show_keys {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(44)])
            .split(chunks[1]);
        render_board(frame, cols[0], state);
        render_name_keys(frame, cols[1], state);
    } else {
        render_board(frame, chunks[1], state);
    }

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(44)])
        .split(chunks[2]);
    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, bottom[0]);
    let detail = Paragraph::new(detail_text(state))
        .block(Block::default().title("Player").borders(Borders::ALL));
    frame.render_widget(detail, bottom[1]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let source = match state.board_source {
        Some(LiveSource::Feed) => "live feed",
        Some(LiveSource::Simulated) => "simulated",
        None => "-",
    };
    let game = match (&state.game, state.board_source) {
        (Some(game), _) => game.label(),
        (None, Some(LiveSource::Simulated)) => "Simulated Game".to_string(),
        (None, _) => "-".to_string(),
    };
    let updated = state
        .board_updated_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let view = match state.view {
        BoardView::All => "ALL",
        BoardView::BetsOnly => "BETS",
    };
    let edges = match &state.board {
        Some(board) => {
            let counts = board.signal_counts();
            let count = |signal: Signal| counts.get(&signal).copied().unwrap_or(0);
            format!(
                "Over {} | Under {} | No Edge {}",
                count(Signal::Over),
                count(Signal::Under),
                count(Signal::NoEdge)
            )
        }
        None => "-".to_string(),
    };
    format!(
        "NBA PROPS | Mode: {} ({source}) | View: {view} | Bets: {}\nGame: {game}\nUpdated: {updated} | {edges}",
        state.live_mode.label(),
        state.bets.len()
    )
}

fn footer_text(state: &AppState) -> String {
    let mut text = "r Refresh | j/k/↑/↓ Move | Space Bet | v Bets view | c Clear | g Game | m Mode | n Keys | e Export | ? Help | q Quit".to_string();
    if state.notice.is_some() && state.board.is_some() {
        text.push_str(" | showing previous board");
    }
    text
}

fn render_board(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Board").borders(Borders::ALL);

    let Some(board) = &state.board else {
        let text = state
            .notice
            .clone()
            .unwrap_or_else(|| "Loading...".to_string());
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::Yellow))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let sections = if let Some(notice) = &state.notice {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);
        let line = Paragraph::new(notice.as_str()).style(Style::default().fg(Color::Yellow));
        frame.render_widget(line, parts[0]);
        parts[1]
    } else {
        inner
    };

    let rows = state.visible_rows();
    if rows.is_empty() {
        let msg = match state.view {
            BoardView::All => "No players on the board",
            BoardView::BetsOnly => "No bets selected (Space adds the highlighted player)",
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, sections);
        return;
    }

    let header_cells = output_columns(&board.line_categories)
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells);

    let visible = sections.height.saturating_sub(1) as usize;
    let (start, end) = visible_range(state.selected, rows.len(), visible);
    let body = (start..end).map(|idx| {
        let row = rows[idx];
        let style = if idx == state.selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        board_row(row, board, state.bets.contains(&row.name)).style(style)
    });

    let table = Table::new(body, column_widths(board)).header(header);
    frame.render_widget(table, sections);
}

fn board_row<'a>(row: &'a MergedRow, board: &Board, on_slip: bool) -> Row<'a> {
    let name = if on_slip {
        format!("* {}", row.name)
    } else {
        row.name.clone()
    };
    let mut cells = vec![
        Cell::from(name),
        Cell::from(row.team.as_str()),
        Cell::from(format_minutes(row.minutes)),
    ];
    for category in StatCategory::ALL {
        let stat = row.stat(category);
        cells.push(Cell::from(stat.actual.to_string()));
        cells.push(Cell::from(opt_text(stat.projected_rounded())));
        cells.push(Cell::from(stat.paced.to_string()));
        if board.has_lines(category) {
            cells.push(Cell::from(opt_text(stat.line)));
            cells.push(Cell::from(stat.signal.label()).style(signal_style(stat.signal)));
        }
    }
    Row::new(cells)
}

fn column_widths(board: &Board) -> Vec<Constraint> {
    let mut widths = vec![
        Constraint::Min(22),
        Constraint::Length(4),
        Constraint::Length(7),
    ];
    for category in StatCategory::ALL {
        widths.push(Constraint::Length(8));
        widths.push(Constraint::Length(12));
        widths.push(Constraint::Length(13));
        if board.has_lines(category) {
            widths.push(Constraint::Length(10));
            widths.push(Constraint::Length(14));
        }
    }
    widths
}

fn signal_style(signal: Signal) -> Style {
    match signal {
        Signal::Over => Style::default().fg(Color::Green),
        Signal::Under => Style::default().fg(Color::Red),
        Signal::NoEdge => Style::default().fg(Color::Gray),
        Signal::NoLine => Style::default().fg(Color::Yellow),
    }
}

fn render_name_keys(frame: &mut Frame, area: Rect, state: &AppState) {
    let text = match &state.board {
        Some(board) => name_keys_text(board),
        None => "No board yet".to_string(),
    };
    let panel = Paragraph::new(text)
        .block(Block::default().title("Name Keys").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn name_keys_text(board: &Board) -> String {
    let mut lines = vec![format!(
        "Live keys: {}  Sportsbook keys: {}",
        board.live_keys.len(),
        board.line_keys.len()
    )];
    if !board.key_rewrites.is_empty() {
        lines.push(String::new());
        lines.push("Fuzzy matched:".to_string());
        for rewrite in &board.key_rewrites {
            lines.push(format!(
                "  {} -> {} ({:.2})",
                rewrite.from, rewrite.to, rewrite.score
            ));
        }
    }
    lines.push(String::new());
    if board.unmatched_line_keys.is_empty() {
        lines.push("All sportsbook players matched".to_string());
    } else {
        lines.push("Not in live stats:".to_string());
        for key in &board.unmatched_line_keys {
            lines.push(format!("  {key}"));
        }
    }
    lines.join("\n")
}

fn detail_text(state: &AppState) -> String {
    let Some(row) = state.selected_row() else {
        return "No player selected".to_string();
    };
    let mut lines = vec![format!(
        "{} {} | {} min{}",
        row.name,
        row.team,
        format_minutes(row.minutes),
        if state.bets.contains(&row.name) {
            " | ON SLIP"
        } else {
            ""
        }
    )];
    for category in StatCategory::ALL {
        let stat = row.stat(category);
        lines.push(format!(
            "{:<8} {:>3} proj {:>4} pace {:>3} line {:>5} {}",
            category.label(),
            stat.actual,
            opt_text(stat.projected_rounded()),
            stat.paced,
            opt_text(stat.line),
            stat.signal.label()
        ));
    }
    if let Some(pra) = row.combined_projection {
        lines.push(format!("PRA proj {pra:.1}"));
    }
    lines.join("\n")
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(5)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn opt_text<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "NBA Props Terminal - Help",
        "",
        "Board:",
        "  j/k or ↑/↓   Move",
        "  Space        Toggle bet on player",
        "  v            Bets-only view",
        "  c            Clear bet slip",
        "",
        "Data:",
        "  r            Refresh now",
        "  g            Next game on scoreboard",
        "  m            Mode: auto / live / sim",
        "  n            Name-key matching panel",
        "  e            Export board to xlsx",
        "",
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
