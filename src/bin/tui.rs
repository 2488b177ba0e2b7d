mod tui_app;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame, Terminal,
};
use tui_app::{
    format_count, format_currency, format_percent, format_time_ns, truncate, AppState,
    ConnectionStatus, Pane, ProductForm, Theme, FORM_LABELS,
};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("failed to build HTTP client");

    let mut app = AppState::new(base_url);

    // Saved theme + initial snapshot before first render
    app.load_theme(&client).await;
    app.refresh(&client).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &client).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(2);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app))?;

        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.form.is_some() {
                        handle_form_key(app, client, key).await;
                    } else {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                            KeyCode::Char('r') | KeyCode::Char('R') => {
                                app.refresh(client).await;
                                last_tick = std::time::Instant::now();
                            }
                            KeyCode::Char('t') | KeyCode::Char('T') => {
                                app.toggle_theme(client).await;
                            }
                            KeyCode::Char('a') | KeyCode::Char('A') => {
                                app.form = Some(ProductForm::default());
                            }
                            KeyCode::Char('1') => app.pane = Pane::Dashboard,
                            KeyCode::Char('2') => app.pane = Pane::Products,
                            _ => {}
                        }
                    }
                }
            }
        }

        if last_tick.elapsed() >= refresh_interval {
            app.refresh(client).await;
            last_tick = std::time::Instant::now();
        }
    }
}

async fn handle_form_key(app: &mut AppState, client: &reqwest::Client, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.form = None,
        KeyCode::Enter => app.submit_form(client).await,
        KeyCode::Tab | KeyCode::Down => {
            if let Some(form) = app.form.as_mut() {
                form.next_field();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if let Some(form) = app.form.as_mut() {
                form.prev_field();
            }
        }
        KeyCode::Backspace => {
            if let Some(form) = app.form.as_mut() {
                form.backspace();
            }
        }
        KeyCode::Char(c) => {
            if let Some(form) = app.form.as_mut() {
                form.push_char(c);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Palette — dark/light rendering of the same layout
// ---------------------------------------------------------------------------

struct Palette {
    text: Color,
    dim: Color,
    accent: Color,
    good: Color,
    warn: Color,
    bad: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                text: Color::White,
                dim: Color::DarkGray,
                accent: Color::Cyan,
                good: Color::Green,
                warn: Color::Yellow,
                bad: Color::Red,
            },
            Theme::Light => Self {
                text: Color::Black,
                dim: Color::Gray,
                accent: Color::Blue,
                good: Color::Green,
                warn: Color::Magenta,
                bad: Color::Red,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState) {
    let p = Palette::for_theme(app.theme);
    let area = f.area();

    // Outer vertical split: header | body | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, &p, chunks[0]);
    match app.pane {
        Pane::Dashboard => render_dashboard(f, app, &p, chunks[1]),
        Pane::Products => render_products_table(f, app, &p, chunks[1]),
    }
    render_footer(f, &p, chunks[2]);

    if let Some(form) = &app.form {
        render_form_modal(f, form, &p, area);
    }
}

fn render_header(f: &mut Frame, app: &AppState, p: &Palette, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), p.good),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), p.warn),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), p.bad),
    };

    let title_spans = vec![
        Span::styled(
            " AdPulse  ",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} products", app.snapshot.products.len()),
            Style::default().fg(p.text),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("tick #{}", app.health.sim_ticks),
            Style::default().fg(p.text),
        ),
        Span::raw("  │  "),
        Span::styled(format!("theme: {}", app.theme.as_str()), Style::default().fg(p.dim)),
    ];

    let header_line = Line::from(title_spans);
    let paragraph = Paragraph::new(header_line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.dim)),
    );

    f.render_widget(paragraph, area);
}

fn render_dashboard(f: &mut Frame, app: &AppState, p: &Palette, area: Rect) {
    // Horizontal split: metric tiles (40%) | timeline (60%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_metric_tiles(f, app, p, halves[0]);
    render_timeline(f, app, p, halves[1]);
}

fn render_metric_tiles(f: &mut Frame, app: &AppState, p: &Palette, area: Rect) {
    let m = &app.snapshot.metrics;
    let d = &app.snapshot.derived;

    let tile = |label: &str, value: String, color: Color| {
        Line::from(vec![
            Span::styled(format!(" {label:<14}"), Style::default().fg(p.dim)),
            Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ])
    };

    let lines = vec![
        tile("Impressions", format_count(m.impressions), p.text),
        tile("Clicks", format_count(m.clicks), p.text),
        tile("Conversions", format_count(m.conversions), p.text),
        tile("Revenue", format_currency(m.revenue), p.good),
        tile("CTR", format_percent(d.ctr), p.accent),
        tile("CR", format_percent(d.cr), p.accent),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.dim))
            .title(Span::styled(
                " CAMPAIGN ",
                Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            )),
    );

    f.render_widget(paragraph, area);
}

fn render_timeline(f: &mut Frame, app: &AppState, p: &Palette, area: Rect) {
    let lines: Vec<Line> = if app.snapshot.timeline.is_empty() {
        vec![Line::from(Span::styled(
            " no events yet",
            Style::default().fg(p.dim),
        ))]
    } else {
        app.snapshot
            .timeline
            .iter()
            .map(|entry| {
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", format_time_ns(entry.at_ns)),
                        Style::default().fg(p.dim),
                    ),
                    Span::styled(entry.message.clone(), Style::default().fg(p.text)),
                ])
            })
            .collect()
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.dim))
            .title(Span::styled(
                " TIMELINE ",
                Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            )),
    );

    f.render_widget(paragraph, area);
}

fn render_products_table(f: &mut Frame, app: &AppState, p: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.dim))
        .title(Span::styled(
            " PRODUCTS ",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ));

    if app.snapshot.products.is_empty() {
        let notice = Paragraph::new(Line::from(Span::styled(
            " No products yet — press [a] to add one.",
            Style::default().fg(p.dim),
        )))
        .block(block);
        f.render_widget(notice, area);
        return;
    }

    let header_cells = ["ID", "Name", "Category", "Price", "Target CPA"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(p.warn).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .snapshot
        .products
        .iter()
        .map(|prod| {
            Row::new(vec![
                Cell::from(prod.id.clone()).style(Style::default().fg(p.dim)),
                Cell::from(truncate(&prod.name, 30)).style(Style::default().fg(p.text)),
                Cell::from(truncate(&prod.category, 14)).style(Style::default().fg(p.text)),
                Cell::from(format_currency(prod.price)).style(Style::default().fg(p.good)),
                Cell::from(format_currency(prod.target_cpa)).style(Style::default().fg(p.accent)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(16),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(block);

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, p: &Palette, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(p.warn)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(p.warn)),
        Span::raw("refresh  "),
        Span::styled("[t] ", Style::default().fg(p.warn)),
        Span::raw("theme  "),
        Span::styled("[a] ", Style::default().fg(p.warn)),
        Span::raw("add product  "),
        Span::styled("[1/2] ", Style::default().fg(p.warn)),
        Span::raw("dashboard/products  "),
        Span::styled("auto-refresh: 2s", Style::default().fg(p.dim)),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(p.text));
    f.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Add-product modal
// ---------------------------------------------------------------------------

fn render_form_modal(f: &mut Frame, form: &ProductForm, p: &Palette, area: Rect) {
    let modal = centered_rect(50, 9, area);
    f.render_widget(Clear, modal);

    let mut lines: Vec<Line> = FORM_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let focused = i == form.focus;
            let marker = if focused { "▌" } else { " " };
            let value_style = if focused {
                Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(p.text)
            };
            Line::from(vec![
                Span::styled(format!(" {label:<11}"), Style::default().fg(p.dim)),
                Span::styled(format!("{}{marker}", form.fields[i]), value_style),
            ])
        })
        .collect();

    lines.push(Line::raw(""));
    match &form.error {
        Some(msg) => lines.push(Line::from(Span::styled(
            format!(" {}", truncate(msg, modal.width.saturating_sub(3) as usize)),
            Style::default().fg(p.bad),
        ))),
        None => lines.push(Line::from(Span::styled(
            " [Enter] save  [Tab] next field  [Esc] cancel",
            Style::default().fg(p.dim),
        ))),
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.accent))
            .title(Span::styled(
                " ADD PRODUCT ",
                Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            )),
    );

    f.render_widget(paragraph, modal);
}

/// Center a fixed-height, percentage-width rect inside `r`.
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

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
