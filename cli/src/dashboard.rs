use std::{io, time::Duration};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use clubhouse_core::model::{Dashboard, Match, PositionCount};
use ratatui::{
    prelude::*,
    widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, Gauge, Padding, Paragraph},
};

// --- THEME ---
struct Theme {
    primary: Color,
    muted: Color,
    text: Color,
    good: Color,
    warn: Color,
    bar: Color,
}

const THEME: Theme = Theme {
    primary: Color::Cyan,
    muted: Color::DarkGray,
    text: Color::White,
    good: Color::Green,
    warn: Color::Red,
    bar: Color::Blue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartMode {
    Scorers,
    Positions,
}

pub struct DashboardApp {
    pub data: Dashboard,
    pub breakdown: Vec<PositionCount>,
    mode: ChartMode,
}

impl DashboardApp {
    pub fn new(data: Dashboard, breakdown: Vec<PositionCount>) -> Self {
        Self {
            data,
            breakdown,
            mode: ChartMode::Scorers,
        }
    }

    pub fn toggle_chart(&mut self) {
        self.mode = match self.mode {
            ChartMode::Scorers => ChartMode::Positions,
            ChartMode::Positions => ChartMode::Scorers,
        };
    }

    /// Bars for the chart currently shown, as (label, value).
    fn bars(&self) -> Vec<(String, u64)> {
        match self.mode {
            ChartMode::Scorers => self
                .data
                .top_scorers
                .iter()
                .map(|p| (first_name(&p.name), p.goals as u64))
                .collect(),
            ChartMode::Positions => self
                .breakdown
                .iter()
                .map(|c| (c.position.short().to_string(), c.count as u64))
                .collect(),
        }
    }
}

fn first_name(name: &str) -> String {
    name.split_whitespace().next().unwrap_or(name).to_string()
}

pub fn run(data: Dashboard, breakdown: Vec<PositionCount>) -> Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = DashboardApp::new(data, breakdown);

    // Main loop
    loop {
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Tab | KeyCode::Left | KeyCode::Right => app.toggle_chart(),
                        _ => {}
                    }
                }
            }
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

fn ui(frame: &mut Frame, app: &DashboardApp) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // --- Header ---
    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(THEME.muted));
    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(1), Constraint::Length(20)])
        .split(main_layout[0]);

    let title = Paragraph::new(Span::styled(
        "CLUBHOUSE",
        Style::default().fg(THEME.primary).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(title, header_layout[0]);

    let month = Paragraph::new(Span::styled(
        format!(" Dues {} ", app.data.month),
        Style::default().fg(THEME.text).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Right)
    .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(month, header_layout[2]);
    frame.render_widget(header_block, main_layout[0]);

    // --- Chart + side panel ---
    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Length(1),
            Constraint::Percentage(40),
        ])
        .split(main_layout[1]);

    draw_chart(frame, app, content[0]);
    draw_side_panel(frame, app, content[2]);

    // --- Footer ---
    let help = Line::from(vec![
        Span::styled("CHART: ", Style::default().fg(THEME.muted)),
        Span::styled("tab ", Style::default().fg(THEME.text)),
        Span::raw("  "),
        Span::styled("QUIT: ", Style::default().fg(THEME.muted)),
        Span::styled("q", Style::default().fg(THEME.text)),
    ]);
    frame.render_widget(Paragraph::new(help).alignment(Alignment::Center), main_layout[2]);
}

fn rounded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(THEME.muted))
        .title(title)
}

fn draw_chart(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let title = match app.mode {
        ChartMode::Scorers => " Top Scorers ",
        ChartMode::Positions => " Squad by Position ",
    };
    let data = app.bars();

    if data.is_empty() {
        let empty = Paragraph::new("No players yet")
            .alignment(Alignment::Center)
            .block(rounded(title));
        frame.render_widget(empty, area);
        return;
    }

    let bars: Vec<Bar> = data
        .iter()
        .map(|(name, amount)| {
            Bar::default()
                .label(name.as_str())
                .value(*amount)
                .style(Style::default().fg(THEME.bar))
                .text_value(amount.to_string())
        })
        .collect();

    let chart = BarChart::default()
        .block(rounded(title))
        .bar_width(7)
        .bar_gap(2)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn draw_side_panel(frame: &mut Frame, app: &DashboardApp, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(3),
            Constraint::Min(6),
        ])
        .split(area);

    // 1. Summary card
    let stats = &app.data.stats;
    let overview = vec![
        Line::from(vec![label("Goals:    "), value(stats.total_goals.to_string())]),
        Line::from(vec![label("Played:   "), value(stats.total_games.to_string())]),
        Line::from(vec![
            label("Members:  "),
            value(stats.active_players.to_string()),
            label(format!(" +{} guests", stats.guest_count)),
        ]),
        Line::from(""),
        Line::from(vec![label("Revenue:  "), value(format!("{:.2}", stats.total_revenue))]),
        Line::from(vec![label("Expected: "), value(format!("{:.2}", stats.expected_revenue))]),
    ];
    frame.render_widget(Paragraph::new(overview).block(rounded(" Summary ")), chunks[0]);

    // 2. Dues gauge
    let ratio = stats.payment_rate / 100.0;
    let gauge = Gauge::default()
        .block(rounded(" Dues Paid "))
        .gauge_style(Style::default().fg(if ratio >= 0.5 { THEME.good } else { THEME.warn }))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{}/{} ({:.0}%)", stats.paid_count, stats.active_players, stats.payment_rate));
    frame.render_widget(gauge, chunks[1]);

    // 3. Fixtures
    let mut fixtures = vec![Line::from(Span::styled(
        "Next",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    fixtures.push(fixture_line(app.data.next_match.as_ref(), false));
    fixtures.push(Line::from(""));
    fixtures.push(Line::from(Span::styled(
        "Last",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    fixtures.push(fixture_line(app.data.last_match.as_ref(), true));
    frame.render_widget(Paragraph::new(fixtures).block(rounded(" Fixtures ")), chunks[2]);
}

fn label(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(THEME.muted))
}

fn value(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(THEME.text).add_modifier(Modifier::BOLD))
}

fn fixture_line(m: Option<&Match>, with_score: bool) -> Line<'static> {
    let Some(m) = m else {
        return Line::from(Span::styled("none", Style::default().fg(THEME.muted)));
    };
    let mut spans = vec![
        Span::styled(m.date.format("%d/%m %H:%M ").to_string(), Style::default().fg(THEME.muted)),
        Span::styled(format!("vs {}", m.opponent), Style::default().fg(THEME.text)),
    ];
    if with_score {
        let color = if m.our_score >= m.opponent_score { THEME.good } else { THEME.warn };
        spans.push(Span::styled(
            format!("  {}-{}", m.our_score, m.opponent_score),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}
