use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, ConnState, Focus, InputMode, StatusLevel};
use crate::domain::HexField;

pub fn draw(f: &mut Frame, app: &mut App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_sections(f, areas.sections, app);
    draw_methods(f, areas.methods, app);
    draw_args(f, areas.args, app);
    draw_inspector(f, areas.inspector, app);
    draw_status_line(f, areas.status_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let (conn_label, conn_color) = match app.conn {
        ConnState::Connecting => ("connecting", Color::Yellow),
        ConnState::Connected => ("connected", Color::LightGreen),
        ConnState::Failed => ("failed", Color::LightRed),
    };
    let chain = app.chain.as_deref().unwrap_or("--");
    let spec = app
        .spec_version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "--".to_string());

    let title = Line::from(vec![
        Span::styled(
            "Relaycode",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Endpoint", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {} ", app.endpoint_display())),
        Span::styled("Chain", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {chain} ")),
        Span::styled("Spec", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {spec} ")),
        Span::styled("State", Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(conn_label, Style::default().fg(conn_color)),
        Span::raw("  "),
        Span::styled("Account", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            " {}",
            app.account
                .as_ref()
                .map(|a| short_address(&a.address))
                .unwrap_or_else(|| "none".to_string())
        )),
    ]);

    let header = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(header, area);
}

fn border_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn highlight_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

fn draw_sections(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .sections
        .iter()
        .map(|section| {
            let active = app.form.state().section == section.key;
            let mut spans = vec![Span::raw(section.display.clone())];
            if active {
                spans.push(Span::styled(" *", Style::default().fg(Color::LightCyan)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = format!("Sections ({})", app.sections.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style(app, Focus::Sections)),
        )
        .highlight_style(highlight_style(app, Focus::Sections))
        .highlight_symbol("-> ");

    let mut state = ListState::default();
    if !app.sections.is_empty() {
        state.select(Some(app.section_cursor.min(app.sections.len() - 1)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_methods(f: &mut Frame, area: Rect, app: &App) {
    let methods = app.form.methods();
    let items: Vec<ListItem> = methods
        .iter()
        .map(|descriptor| {
            let active = app.form.state().method == descriptor.method;
            let mut spans = vec![Span::raw(descriptor.method.clone())];
            spans.push(Span::styled(
                format!(" ({})", descriptor.args.len()),
                Style::default().fg(Color::DarkGray),
            ));
            if active {
                spans.push(Span::styled(" *", Style::default().fg(Color::LightCyan)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let section = &app.form.state().section;
    let title = if section.is_empty() {
        "Methods".to_string()
    } else {
        format!("Methods: {section}")
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style(app, Focus::Methods)),
        )
        .highlight_style(highlight_style(app, Focus::Methods))
        .highlight_symbol("-> ");

    let mut state = ListState::default();
    if !methods.is_empty() {
        state.select(Some(app.method_cursor.min(methods.len() - 1)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_args(f: &mut Frame, area: Rect, app: &App) {
    let values = &app.form.state().values;
    let editing_arg = app.input_mode == InputMode::EditArg;

    let items: Vec<ListItem> = match app.form.selected() {
        Some(descriptor) => descriptor
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let value = if editing_arg && i == app.arg_cursor {
                    format!("{}_", app.input)
                } else {
                    values.get(&arg.name).cloned().unwrap_or_default()
                };
                let line = Line::from(vec![
                    Span::styled(
                        format!("{}: ", arg.name),
                        Style::default().fg(Color::LightBlue),
                    ),
                    Span::raw(value),
                ]);
                ListItem::new(line)
            })
            .collect(),
        None => vec![ListItem::new(Line::from(Span::styled(
            "Select a method",
            Style::default().fg(Color::DarkGray),
        )))],
    };

    let title = match &app.call {
        Some(call) => format!("Arguments: {}", call.path()),
        None => "Arguments".to_string(),
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style(app, Focus::Args)),
        )
        .highlight_style(highlight_style(app, Focus::Args))
        .highlight_symbol("-> ");

    let mut state = ListState::default();
    let args_len = app.args_len();
    if args_len > 0 {
        state.select(Some(app.arg_cursor.min(args_len - 1)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn hex_color(field: HexField) -> Color {
    match field {
        HexField::Section => Color::LightRed,
        HexField::Method => Color::LightGreen,
        HexField::Arg(_) => Color::LightBlue,
        HexField::CallData => Color::White,
    }
}

fn field_label(field: HexField, app: &App) -> String {
    match field {
        HexField::Section => "section".to_string(),
        HexField::Method => "method".to_string(),
        HexField::Arg(i) => match app.call.as_ref().and_then(|c| c.args.get(i)) {
            Some(arg) => format!("arg {}", arg.name),
            None => format!("arg #{i}"),
        },
        HexField::CallData => "call data".to_string(),
    }
}

fn draw_inspector(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();

    match app.inspector.snapshot() {
        Some(snapshot) => {
            let fields = app.hex_fields();
            let editing_hex = app.input_mode == InputMode::EditHex;
            for (i, &field) in fields.iter().enumerate() {
                let selected = app.focus == Focus::Inspector && i == app.hex_cursor;
                let bytes: &[u8] = match field {
                    HexField::Section => &snapshot.section,
                    HexField::Method => &snapshot.method,
                    HexField::Arg(n) => snapshot.args.get(n).map(Vec::as_slice).unwrap_or(&[]),
                    HexField::CallData => &snapshot.call_data,
                };
                let value = if selected && editing_hex {
                    format!("{}_", app.input)
                } else {
                    format!("0x{}", hex::encode(bytes))
                };
                let marker = if selected { "-> " } else { "   " };
                let mut value_style = Style::default().fg(hex_color(field));
                if selected {
                    value_style = value_style.add_modifier(Modifier::BOLD);
                }
                lines.push(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(
                        format!("{:<12} ", field_label(field, app)),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(value, value_style),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::raw("   "),
                Span::styled("call hash   ", Style::default().fg(Color::DarkGray)),
                Span::raw(format!("0x{}", hex::encode(snapshot.call_hash))),
            ]));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "No call selected",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let mode = if app.inspector.editing() {
        Span::styled(
            " editing ",
            Style::default().fg(Color::Black).bg(Color::LightYellow),
        )
    } else {
        Span::styled(" read-only ", Style::default().fg(Color::DarkGray))
    };
    let title = Line::from(vec![Span::raw("Inspector"), Span::raw(" "), mode]);

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style(app, Focus::Inspector)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let content = if let Some((text, level)) = &app.status {
        let color = match level {
            StatusLevel::Info => Color::LightGreen,
            StatusLevel::Warn => Color::LightYellow,
            StatusLevel::Error => Color::LightRed,
        };
        Line::from(vec![
            Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
            Span::styled(text.clone(), Style::default().fg(color)),
        ])
    } else {
        Line::from(vec![Span::styled(
            "Tab focus  j/k move  Enter select  i edit  e hex edit  y copy  s submit  [ ] endpoint  r refresh  ? help  q quit",
            Style::default().fg(Color::DarkGray),
        )])
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 64, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Navigation"),
        Line::from("  Tab        Cycle focus"),
        Line::from("  j / k      Move selection"),
        Line::from("  Enter      Select / edit"),
        Line::from("  Esc        Cancel / close"),
        Line::from(""),
        Line::from("Builder"),
        Line::from("  i          Edit selected argument"),
        Line::from("  e          Toggle hex editing"),
        Line::from("  y          Copy call data"),
        Line::from("  s          Sign and submit"),
        Line::from(""),
        Line::from("Connection"),
        Line::from("  [ / ]      Prev/Next endpoint"),
        Line::from("  r          Refresh metadata"),
        Line::from(""),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn short_address(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}..{tail}")
    } else {
        value.to_string()
    }
}


fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    use ratatui::layout::{Constraint, Direction, Layout};

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
