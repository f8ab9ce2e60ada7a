use std::collections::BTreeMap;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use taskwatch_core::api::{StepId, TaskProjection, Tone, COLUMN_WIDTH};

use super::app::{InputMode, TuiApp};

pub fn draw(f: &mut Frame<'_>, app: &TuiApp, p: &TaskProjection) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(f.area());

    draw_header(f, chunks[0], app, p);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    draw_steps(f, body[0], p);
    draw_logs(f, body[1], app, p);

    draw_footer(f, chunks[2], app);
}

fn color(tone: Tone) -> Color {
    match tone {
        Tone::Gray => Color::Gray,
        Tone::Blue => Color::Blue,
        Tone::Green => Color::Green,
        Tone::Yellow => Color::Yellow,
        Tone::Red => Color::Red,
    }
}

fn draw_header(f: &mut Frame<'_>, area: Rect, app: &TuiApp, p: &TaskProjection) {
    let h = &p.header;
    let dim = Style::default().fg(Color::Gray);
    let mut first = vec![
        Span::styled("taskwatch", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  Task: "),
        Span::styled(h.task_id.clone(), dim),
        Span::raw("  Status: "),
        Span::styled(
            format!("{} {}", h.icon, h.status_label),
            Style::default().fg(color(h.tone)),
        ),
        Span::raw("  Steps: "),
        Span::styled(
            format!(
                "{}/{} {}",
                h.counts.finished(),
                h.counts.total(),
                progress_bar(h.progress, 12)
            ),
            dim,
        ),
        Span::raw("  Stream: "),
        Span::styled(
            h.connection.label.clone(),
            Style::default().fg(color(h.connection.tone)),
        ),
        Span::raw("  Dur: "),
        Span::styled(format_duration(app.start.elapsed().as_secs()), dim),
    ];
    if let Some(version) = &h.plan_version {
        first.push(Span::raw("  Plan: "));
        first.push(Span::styled(format!("v{version}"), dim));
    }

    let mut lines = vec![Line::from(first)];
    if let Some(notice) = &h.plan_notice {
        lines.push(Line::from(Span::styled(notice.text(), dim)));
    }
    if let Some(warning) = &h.poll_warning {
        lines.push(Line::from(Span::styled(
            warning.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }

    let header = Paragraph::new(lines)
        .block(Block::default().borders(Borders::BOTTOM))
        .wrap(Wrap { trim: true });
    f.render_widget(header, area);
}

fn draw_steps(f: &mut Frame<'_>, area: Rect, p: &TaskProjection) {
    let mut deps: BTreeMap<StepId, Vec<String>> = BTreeMap::new();
    for edge in &p.edges {
        deps.entry(edge.target)
            .or_default()
            .push(edge.source.to_string());
    }

    let lines: Vec<Line> = p
        .nodes
        .iter()
        .map(|node| {
            let stage = node.position.x / COLUMN_WIDTH + 1;
            let mut spans = vec![
                Span::styled(
                    format!("S{stage} "),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{} {}", node.icon, node.label),
                    Style::default().fg(color(node.tone)),
                ),
            ];
            if let Some(agent) = &node.agent {
                spans.push(Span::styled(
                    format!(" [{agent}]"),
                    Style::default().fg(Color::Cyan),
                ));
            }
            if let Some(tool) = &node.tool {
                spans.push(Span::styled(
                    format!(" ({tool})"),
                    Style::default().fg(Color::Gray),
                ));
            }
            if let Some(after) = deps.get(&node.id) {
                spans.push(Span::styled(
                    format!("  after {}", after.join(",")),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        })
        .collect();

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Steps"))
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn draw_logs(f: &mut Frame<'_>, area: Rect, app: &TuiApp, p: &TaskProjection) {
    let skip = p.logs.len().saturating_sub(app.config.max_log_lines.max(1));
    let lines: Vec<Line> = p.logs[skip..]
        .iter()
        .map(|l| {
            let mut spans = vec![
                Span::styled(l.time.clone(), Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::styled(
                    format!("{:<5}", l.level.as_str()),
                    Style::default().fg(color(l.tone)),
                ),
            ];
            if let Some(step) = &l.step {
                spans.push(Span::styled(
                    format!(" {step}"),
                    Style::default().fg(Color::Blue),
                ));
            }
            if let Some(agent) = &l.agent {
                spans.push(Span::styled(
                    format!(" {agent}"),
                    Style::default().fg(Color::Cyan),
                ));
            }
            spans.push(Span::raw(format!("  {}", l.message)));
            Line::from(spans)
        })
        .collect();

    let title = format!(
        "Logs ({}){}{}",
        lines.len(),
        app.filter
            .level
            .map(|l| format!("  level={}", l.as_str()))
            .unwrap_or_default(),
        if app.filter.text.is_empty() {
            String::new()
        } else {
            format!("  filter=\"{}\"", app.filter.text)
        }
    );
    let height = area.height.saturating_sub(2) as usize;
    let offset = app.log_offset(lines.len(), height);
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((offset.min(u16::MAX as usize) as u16, 0));
    f.render_widget(widget, area);
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &TuiApp) {
    let block = Block::default().borders(Borders::TOP);
    let line = match app.input_mode {
        InputMode::Filter => Line::from(vec![
            Span::styled("/ ", Style::default().fg(Color::Cyan)),
            Span::raw(app.filter.text.clone()),
            Span::styled(
                "   Enter: apply  Esc: clear",
                Style::default().fg(Color::Gray),
            ),
        ]),
        InputMode::Normal => {
            let mut spans = vec![
                Span::styled("> ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!(
                        "q:quit  r:regenerate  /:filter  l:level  j/k:scroll  g/G:top/bottom  a:auto-scroll[{}]",
                        if app.auto_scroll { "on" } else { "off" }
                    ),
                    Style::default().fg(Color::Gray),
                ),
            ];
            if let Some(notice) = &app.notice {
                spans.push(Span::styled(
                    format!("  {notice}"),
                    Style::default().fg(Color::Yellow),
                ));
            }
            Line::from(spans)
        }
    };
    let footer = Paragraph::new(line)
        .block(block)
        .alignment(Alignment::Left);
    f.render_widget(footer, area);

    if app.input_mode == InputMode::Filter {
        let inner = Block::default().borders(Borders::TOP).inner(area);
        let x = inner.x + 2 + app.filter.text.chars().count() as u16;
        f.set_cursor_position((x, inner.y));
    }
}

fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn format_duration(secs: u64) -> String {
    let m = secs / 60;
    let s = secs % 60;
    format!("{m:02}:{s:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "[----]");
        assert_eq!(progress_bar(0.5, 4), "[##--]");
        assert_eq!(progress_bar(2.0, 4), "[####]");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(125), "02:05");
    }
}
