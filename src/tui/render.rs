use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::model::filter::ViewFilter;

use super::app::{App, Mode};

const DIM: Color = Color::DarkGray;
const ACCENT: Color = Color::Cyan;
const ERROR: Color = Color::Red;
const DONE: Color = Color::Green;

pub fn draw(frame: &mut Frame, app: &App) {
    if !app.authenticated() {
        draw_signin_notice(frame);
        return;
    }

    let has_banner = app.view.global_error.is_some();
    let rows = Layout::vertical([
        Constraint::Length(1),                                // filter tabs
        Constraint::Length(1),                                // input row
        Constraint::Min(1),                                   // list
        Constraint::Length(if has_banner { 1 } else { 0 }),   // error banner
        Constraint::Length(1),                                // status row
    ])
    .split(frame.area());

    draw_tabs(frame, app, rows[0]);
    draw_input_row(frame, app, rows[1]);
    draw_list(frame, app, rows[2]);
    if has_banner {
        draw_error_banner(frame, app, rows[3]);
    }
    draw_status_row(frame, app, rows[4]);
}

/// Blocking screen shown until the session gate resolves a token.
fn draw_signin_notice(frame: &mut Frame) {
    let area = frame.area();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "not signed in",
            Style::default().fg(ERROR).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "run `tk login <token>` or set $TK_TOKEN, then start tk again",
            Style::default().fg(DIM),
        )),
        Line::from(""),
        Line::from(Span::styled("q to quit", Style::default().fg(DIM))),
    ];
    frame.render_widget(Paragraph::new(lines).centered(), area);
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(" ticklist ", Style::default().fg(ACCENT))];
    for filter in [ViewFilter::All, ViewFilter::Active, ViewFilter::Completed] {
        let style = if filter == app.view.filter {
            Style::default().fg(Color::Black).bg(ACCENT)
        } else {
            Style::default().fg(DIM)
        };
        spans.push(Span::styled(format!(" {} ", filter), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_input_row(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.mode {
        Mode::Insert => {
            let mut spans = vec![
                Span::styled(" + ", Style::default().fg(ACCENT)),
                Span::raw(app.input.clone()),
                Span::styled("\u{258C}", Style::default().fg(ACCENT)), // ▌ cursor
            ];
            if app.add_in_flight {
                spans.push(Span::styled("  syncing\u{2026}", Style::default().fg(DIM)));
            }
            Line::from(spans)
        }
        _ => Line::from(Span::styled(
            " + press a to add a todo",
            Style::default().fg(DIM),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_list(frame: &mut Frame, app: &App, area: Rect) {
    let height = area.height as usize;
    let width = area.width as usize;
    if height == 0 {
        return;
    }

    // keep the cursor inside the visible window
    let offset = app.cursor.saturating_sub(height.saturating_sub(1));

    let mut lines = Vec::with_capacity(height);
    for (row, todo) in app.view.items.iter().enumerate().skip(offset).take(height) {
        let selected = row == app.cursor;
        let pending = app.view.pending.contains(&todo.id);
        let failed = app.view.item_errors.contains_key(&todo.id);

        let marker = if pending {
            Span::styled("\u{2026} ", Style::default().fg(ACCENT)) // …
        } else if failed {
            Span::styled("! ", Style::default().fg(ERROR))
        } else {
            Span::raw("  ")
        };

        let checkbox = if todo.is_done {
            Span::styled("[x] ", Style::default().fg(DONE))
        } else {
            Span::raw("[ ] ")
        };

        let editing_this = matches!(app.mode, Mode::Edit)
            && app.edit.as_ref().is_some_and(|e| e.id == todo.id)
            && selected;
        let text = if editing_this {
            let buffer = app.edit.as_ref().map(|e| e.buffer.clone()).unwrap_or_default();
            Span::styled(
                format!("{}\u{258C}", truncate(&buffer, width.saturating_sub(10))),
                Style::default().fg(Color::White),
            )
        } else {
            let style = if todo.is_done {
                Style::default().fg(DIM).add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default()
            };
            Span::styled(truncate(&todo.text, width.saturating_sub(10)), style)
        };

        let mut spans = vec![
            marker,
            Span::styled(format!("{:>4} ", todo.id), Style::default().fg(DIM)),
            checkbox,
            text,
        ];
        if let Some(err) = app.view.item_errors.get(&todo.id) {
            spans.push(Span::styled(
                format!("  {}", truncate(err, width / 3)),
                Style::default().fg(ERROR),
            ));
        }

        let mut line = Line::from(spans);
        if selected && !editing_this {
            line = line.style(Style::default().bg(Color::Rgb(0x20, 0x20, 0x30)));
        }
        lines.push(line);
    }

    if app.view.items.is_empty() {
        let note = if app.view.global_loading {
            "loading\u{2026}"
        } else {
            "nothing here"
        };
        lines.push(Line::from(Span::styled(
            format!("  {}", note),
            Style::default().fg(DIM),
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_error_banner(frame: &mut Frame, app: &App, area: Rect) {
    let message = app.view.global_error.as_deref().unwrap_or("");
    let line = Line::from(Span::styled(
        format!(" {} ", message),
        Style::default().fg(Color::White).bg(ERROR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let hint = match app.mode {
        Mode::Navigate => "j/k move  space toggle  a add  e edit  d delete  tab filter  q quit",
        Mode::Insert => "Enter add  Esc cancel",
        Mode::Edit => "Enter save  Esc cancel",
    };
    let done = app.view.items.iter().filter(|t| t.is_done).count();
    let counts = format!("{}/{} done", done, app.view.items.len());
    let syncing = if app.view.global_loading { "syncing\u{2026}  " } else { "" };

    let width = area.width as usize;
    let left_width = hint.width();
    let right = format!("{}{}", syncing, counts);
    let padding = width.saturating_sub(left_width + right.width() + 1);

    let line = Line::from(vec![
        Span::styled(hint, Style::default().fg(DIM)),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, Style::default().fg(DIM)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('\u{2026}');
    out
}
