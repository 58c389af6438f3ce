use crate::app::{App, InputMode};
use cadence::duration::format_clock;
use cadence::{Mode, RunState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, List, ListItem, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    draw_header(f, chunks[0], app);
    draw_timer(f, chunks[1], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    match app.session.mode() {
        Mode::Cycle => draw_phases(f, body[0], app),
        Mode::Timer => draw_presets(f, body[0], app),
    }
    draw_history(f, body[1], app);
    draw_status_bar(f, chunks[3], app);

    match &app.mode {
        InputMode::EditingDuration => draw_input_overlay(f, "Set Time (mm:ss)", app),
        InputMode::AddingPhase => draw_input_overlay(f, "New Phase", app),
        InputMode::RenamingPhase(_) => draw_input_overlay(f, "Rename Phase", app),
        InputMode::RetimingPhase(_) => draw_input_overlay(f, "Phase Length (minutes)", app),
        InputMode::DeletingHistory => draw_prompt_overlay(f, "Delete which history slot? (1-5)", app),
        InputMode::ShowHelp => draw_help_overlay(f, app),
        InputMode::Normal => {}
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let text = Line::from(vec![
        Span::raw(icons.header_left.clone()),
        Span::styled(
            "CADENCE",
            Style::default().fg(theme.blue).add_modifier(Modifier::BOLD),
        ),
        Span::raw(icons.header_right.clone()),
    ]);
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(theme.black)),
        ),
        area,
    );
}

fn draw_timer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let session = &app.session;
    let (mode_icon, mode_name) = match session.mode() {
        Mode::Timer => (&icons.timer, "Timer"),
        Mode::Cycle => (&icons.cycle, "Cycle"),
    };
    let state_icon = match session.state() {
        RunState::Running => &icons.play,
        RunState::Paused => &icons.pause,
        RunState::Idle => &icons.stop,
        RunState::Finished => &icons.done,
    };
    let block = Block::default()
        .title(Span::styled(
            format!(" {} {} ", mode_icon, mode_name),
            Style::default().fg(theme.gray),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.green));
    let inner_area = block.inner(area);
    f.render_widget(block, area);
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner_area);
    f.render_widget(
        Paragraph::new(format!(
            "{} {}",
            state_icon,
            format_clock(session.engine().time_left())
        ))
        .style(
            Style::default()
                .fg(theme.foreground)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center),
        v_chunks[0],
    );
    f.render_widget(
        Paragraph::new(session.phase_label())
            .style(Style::default().fg(theme.cyan))
            .alignment(Alignment::Center),
        v_chunks[1],
    );
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(theme.blue).bg(theme.black))
            .percent((session.progress() * 100.0).clamp(0.0, 100.0) as u16),
        v_chunks[2],
    );
}

fn draw_phases(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let session = &app.session;
    let (total, count) = session.cycle_summary();
    let active = match session.state() {
        RunState::Running | RunState::Paused => session.engine().phase_index(),
        _ => None,
    };
    let items: Vec<ListItem> = session
        .phases()
        .iter()
        .enumerate()
        .map(|(i, phase)| {
            let marker = if i == app.selected_phase {
                Span::styled(icons.select.clone(), Style::default().fg(theme.selection))
            } else {
                Span::raw(" ")
            };
            let name_style = if Some(i) == active {
                Style::default().fg(theme.green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.foreground)
            };
            ListItem::new(Line::from(vec![
                marker,
                Span::raw(" "),
                Span::styled(phase.name.clone(), name_style),
                Span::styled(
                    format!(" {} {}m", icons.separator, phase.minutes),
                    Style::default().fg(theme.gray),
                ),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(items).block(
            Block::default()
                .title(Span::styled(
                    format!(" Phases: {} min ({} phases) ", total, count),
                    Style::default().fg(theme.gray),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.green)),
        ),
        area,
    );
}

fn draw_presets(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let configured = app.session.engine().timer_secs();
    let items: Vec<ListItem> = app
        .config
        .presets()
        .iter()
        .map(|&minutes| {
            let current = u64::from(minutes) * 60 == configured;
            ListItem::new(Line::from(vec![
                if current {
                    Span::styled(icons.select.clone(), Style::default().fg(theme.selection))
                } else {
                    Span::raw(" ")
                },
                Span::styled(
                    format!(" {}m", minutes),
                    Style::default().fg(theme.foreground),
                ),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(items).block(
            Block::default()
                .title(Span::styled(
                    format!(" Presets ({} configured) ", format_clock(configured)),
                    Style::default().fg(theme.gray),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.green)),
        ),
        area,
    );
}

fn draw_history(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let block = Block::default()
        .title(Span::styled(
            format!(" {} Recent ", icons.history),
            Style::default().fg(theme.gray),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.green));
    let history = app.session.history();
    if history.is_empty() {
        let inner_area = block.inner(area);
        f.render_widget(block, area);
        f.render_widget(
            Paragraph::new("Nothing yet. Start a session.")
                .style(Style::default().fg(theme.gray))
                .alignment(Alignment::Center),
            inner_area,
        );
        return;
    }
    let items: Vec<ListItem> = history
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(theme.blue)),
                Span::styled(
                    format!("{}m ", entry.total_minutes),
                    Style::default().fg(theme.foreground),
                ),
                Span::styled(entry.label.clone(), Style::default().fg(theme.gray)),
            ]))
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let (state_text, state_color) = match app.session.state() {
        RunState::Idle => ("IDLE", theme.gray),
        RunState::Running => ("RUNNING", theme.green),
        RunState::Paused => ("PAUSED", theme.yellow),
        RunState::Finished => ("FINISHED", theme.magenta),
    };
    let toggle = |on: bool| if on { &icons.on } else { &icons.off };
    let help = if app.mode == InputMode::Normal {
        "space:start/pause │ r:reset │ 1-5:replay │ m:mode │ ?:help │ q:quit"
    } else {
        "enter:confirm │ esc:cancel"
    };
    let mut spans = vec![
        Span::styled(
            format!(" {} ", state_text),
            Style::default()
                .bg(state_color)
                .fg(theme.background)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " loop {} sound {} {} ",
            toggle(app.session.loop_enabled()),
            toggle(app.session.sound_enabled()),
            icons.separator
        )),
        Span::raw(help),
    ];
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(
            format!(" {} {}", icons.separator, notice),
            Style::default().fg(theme.red),
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans))
            .block(Block::default().style(Style::default().bg(theme.black).fg(theme.gray))),
        area,
    );
}

fn draw_input_overlay(f: &mut Frame, title: &str, app: &App) {
    let area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.config.theme.yellow))
        .border_type(BorderType::Double)
        .style(Style::default().bg(app.config.theme.background));
    let inner_area = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(app.config.theme.foreground)),
            Span::styled(
                app.input_buffer.as_str(),
                Style::default().fg(app.config.theme.foreground),
            ),
            Span::styled(
                &app.config.icons.input_cursor,
                Style::default()
                    .fg(app.config.theme.foreground)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
        ])),
        inner_area,
    );
}

fn draw_prompt_overlay(f: &mut Frame, question: &str, app: &App) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(question)
            .style(Style::default().fg(app.config.theme.foreground))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(app.config.theme.red))
                    .style(Style::default().bg(app.config.theme.background)),
            ),
        area,
    );
}

fn draw_help_overlay(f: &mut Frame, app: &App) {
    let area = centered_rect(70, 80, f.area());
    f.render_widget(Clear, area);

    let shortcuts = [
        (
            "Session",
            vec![
                ("Space", "Start / pause / reset"),
                ("r", "Cancel or reset"),
                ("1-5", "Replay history slot"),
                ("x", "Delete history slot"),
                ("m", "Switch timer / cycle"),
                ("e", "Edit remaining time"),
                ("p", "Next preset"),
            ],
        ),
        (
            "Phases",
            vec![
                ("a", "Add phase"),
                ("n", "Rename selected"),
                ("t", "Set selected length"),
                ("d", "Delete selected"),
                ("j/↓ k/↑", "Move selection"),
            ],
        ),
        (
            "Toggles",
            vec![("l", "Loop"), ("s", "Sound"), ("?", "Help"), ("q", "Quit")],
        ),
    ];

    let theme = &app.config.theme;
    let mut items = Vec::new();
    for (section, keys) in shortcuts {
        items.push(ListItem::new(Line::from(Span::styled(
            section,
            Style::default().fg(theme.magenta).add_modifier(Modifier::BOLD),
        ))));
        for (key, action) in keys {
            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("  {:<8}", key), Style::default().fg(theme.blue)),
                Span::styled(action, Style::default().fg(theme.foreground)),
            ])));
        }
    }
    f.render_widget(
        List::new(items).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(theme.magenta))
                .style(Style::default().bg(theme.background)),
        ),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
