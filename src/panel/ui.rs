//! Chat panel rendering

use crate::panel::app::{timeline_lines, PanelApp, PanelLine};
use crate::timeline::Phase;
use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

fn to_line(line: &PanelLine) -> Line<'static> {
    match line {
        PanelLine::Day(label) => Line::from(Span::styled(
            format!("── {} ──", label),
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center),
        PanelLine::Message {
            time,
            from_me,
            text,
            status,
        } => {
            let (label, color) = if *from_me {
                ("You", Color::Green)
            } else {
                ("Them", Color::Blue)
            };
            Line::from(vec![
                Span::styled(format!("[{}] ", time), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{}: ", label),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(text.clone(), Style::default().fg(Color::White)),
                Span::styled(format!(" {}", status), Style::default().fg(Color::DarkGray)),
            ])
        }
    }
}

/// Draw the panel and report the resulting layout back to the app
pub fn render(f: &mut Frame, app: &mut PanelApp) {
    let size = f.size();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(20)])
        .split(size);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(columns[1]);

    // Contact list
    let items: Vec<ListItem> = app
        .contacts
        .iter()
        .enumerate()
        .map(|(i, contact)| {
            let style = if i == app.selected_index {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(contact.name.clone()).style(style)
        })
        .collect();
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title("Contacts")),
        columns[0],
    );

    // Message history
    let (lines, title) = {
        let view = app.view();
        let lines: Vec<Line> = timeline_lines(&view, &Local::now()).iter().map(to_line).collect();

        let mut title = match view.phase {
            Phase::LoadingInitial => "Messages (loading…)".to_string(),
            Phase::LoadingOlder => "Messages (loading older…)".to_string(),
            Phase::Error => "Messages (failed to load, r: retry)".to_string(),
            Phase::Idle => format!("Messages ({})", view.messages.len()),
        };
        if view.unread_count > 0 {
            title.push_str(&format!(" | {} new ↓", view.unread_count));
        }
        if view.is_typing {
            title.push_str(" | typing…");
        }
        (lines, title)
    };

    let area = rows[0];
    let viewport_height = area.height.saturating_sub(2) as usize;
    app.sync_layout(lines.len(), viewport_height);

    let messages = Paragraph::new(lines)
        .scroll((app.offset.min(u16::MAX as usize) as u16, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(messages, area);

    // Status/Help
    let help_text = app.status_message.clone().unwrap_or_else(|| {
        "↑/↓ PgUp/PgDn: Scroll | g/End: Latest | n/m: Simulate in/out | t: Typing | Tab: Next | q: Quit"
            .to_string()
    });
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, rows[1]);
}
