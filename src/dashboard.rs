use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::report::{read_analysis_log, AnalysisRecord};

const TICK: Duration = Duration::from_millis(250);

/// Analysis log rows, best score first.
fn ranked_records(log_path: &Path) -> Vec<AnalysisRecord> {
    // the log may not exist yet; show an empty table until it does
    let mut records = read_analysis_log(log_path).unwrap_or_default();
    records.sort_by(|a, b| b.attractiveness_score.total_cmp(&a.attractiveness_score));
    records
}

fn next_index(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match selected {
        Some(i) if i + 1 < len => i + 1,
        _ => 0,
    })
}

fn previous_index(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match selected {
        Some(0) | None => len - 1,
        Some(i) => (i - 1).min(len - 1),
    })
}

pub fn run_dashboard(log_path: &Path) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, log_path);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, log_path: &Path) -> anyhow::Result<()> {
    let mut table_state = TableState::default();
    table_state.select(Some(0));

    loop {
        let records = ranked_records(log_path);
        if records.is_empty() {
            table_state.select(None);
        } else if table_state.selected().map_or(true, |i| i >= records.len()) {
            table_state.select(Some(0));
        }
        terminal.draw(|f| ui(f, log_path, &records, &mut table_state))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Down => table_state.select(next_index(table_state.selected(), records.len())),
                    KeyCode::Up => {
                        table_state.select(previous_index(table_state.selected(), records.len()))
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}

fn score_color(score: f32) -> Color {
    if score >= 0.7 {
        Color::Green
    } else if score >= 0.4 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn ui(f: &mut Frame, log_path: &Path, records: &[AnalysisRecord], table_state: &mut TableState) {
    let rects = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(7)])
        .margin(1)
        .split(f.size());

    let selected_style = Style::default().add_modifier(Modifier::REVERSED).fg(Color::Yellow);
    let normal_style = Style::default().fg(Color::White);
    let header_cells = ["#", "Score", "Sentiment", "Photo", "Analyzed"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells)
        .style(normal_style)
        .height(1)
        .bottom_margin(1);

    let rows = records.iter().enumerate().map(|(rank, item)| {
        let cells = vec![
            Cell::from((rank + 1).to_string()),
            Cell::from(format!("{:.2}", item.attractiveness_score))
                .style(Style::default().fg(score_color(item.attractiveness_score))),
            Cell::from(format!("{} {:.2}", item.sentiment, item.sentiment_score)),
            Cell::from(item.image_path.clone()),
            Cell::from(item.analyzed_at.clone()),
        ];
        Row::new(cells).style(normal_style)
    });

    let col_widths = [
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Length(15),
        Constraint::Min(30),
        Constraint::Length(20),
    ];

    let title = format!("Photo rankings ({})", log_path.display());
    let table = Table::new(rows, col_widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(selected_style)
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, rects[0], table_state);

    let detail = match table_state.selected().and_then(|i| records.get(i)) {
        Some(record) => vec![
            Line::from(vec![
                Span::styled("Photo: ", Style::default().fg(Color::Cyan)),
                Span::raw(record.image_path.clone()),
            ]),
            Line::from(vec![
                Span::styled("Caption: ", Style::default().fg(Color::Cyan)),
                Span::raw(record.caption.clone()),
            ]),
        ],
        None => vec![Line::from("No analyses logged yet. Run `profile-optimizer analyze` first.")],
    };
    let help = Line::from(Span::styled(
        "Up/Down: select   q: quit",
        Style::default().fg(Color::DarkGray),
    ));
    let paragraph = Paragraph::new([detail, vec![help]].concat())
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, rects[1]);
}
