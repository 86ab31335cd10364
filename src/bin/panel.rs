//! Chatdesk panel (Terminal User Interface)
//!
//! A terminal chat panel over seeded in-memory conversations, for
//! exercising the timeline controller by hand.

use anyhow::Context;
use chatdesk::history::MemoryHistory;
use chatdesk::message::{Message, MessageStatus, MessageType};
use chatdesk::panel::{render, PanelApp, PanelContact};
use chatdesk::settings::TimelineSettings;
use chatdesk::timeline::SelectedContact;
use chrono::{Duration as ChronoDuration, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let settings_path = std::env::var("CHATDESK_SETTINGS").unwrap_or_else(|_| "chatdesk.json".to_string());
    let settings = TimelineSettings::load(&settings_path)
        .with_context(|| format!("loading {}", settings_path))?;

    let history = MemoryHistory::new().with_latency(Duration::from_millis(400));
    seed_history(&history).await;

    let mut app = PanelApp::new(history, &settings, demo_contacts());
    app.select_contact(0);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

/// Log to the file named by `CHATDESK_LOG`, or nowhere; the terminal is busy
fn init_logging() -> anyhow::Result<()> {
    match std::env::var("CHATDESK_LOG") {
        Ok(path) => {
            chatdesk::init_file_logging(&path).with_context(|| format!("logging to {}", path))?;
        }
        Err(_) => tracing_subscriber::fmt().with_writer(io::sink).init(),
    }
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut PanelApp,
) -> io::Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| render(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        // Give spawned fetches a chance to finish between frames
        tokio::time::sleep(Duration::from_millis(10)).await;

        if event::poll(Duration::from_millis(40))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                    KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
                    KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1),
                    KeyCode::PageUp => app.scroll_up(app.viewport_height.max(1)),
                    KeyCode::PageDown => app.scroll_down(app.viewport_height.max(1)),
                    KeyCode::End | KeyCode::Char('g') => app.jump_to_latest(),
                    KeyCode::Tab => app.next_contact(),
                    KeyCode::Char('n') => app.simulate_incoming(),
                    KeyCode::Char('m') => app.simulate_outgoing(),
                    KeyCode::Char('t') => app.toggle_typing(),
                    KeyCode::Char('r') => app.retry(),
                    _ => {}
                }
            }
        }
    }
}

fn demo_contacts() -> Vec<PanelContact> {
    vec![
        PanelContact {
            name: "Acme Bakery".to_string(),
            selection: SelectedContact::new("contact-acme", "conv-acme"),
        },
        PanelContact {
            name: "Jordan Lee".to_string(),
            selection: SelectedContact::new("contact-jordan", "conv-jordan"),
        },
        PanelContact {
            name: "New lead".to_string(),
            selection: SelectedContact {
                contact_id: "contact-lead".to_string(),
                conversation_id: None,
            },
        },
    ]
}

async fn seed_history(history: &MemoryHistory) {
    let now = Utc::now();
    let mut messages = Vec::new();

    // Long thread spanning several days
    for i in 0..120i64 {
        let sent_at = now - ChronoDuration::minutes(i * 53 + 5);
        let id = format!("acme-{}", i);
        let mut message = if i % 3 == 0 {
            let mut m = Message::outgoing(&id, "conv-acme", sent_at, &format!("Order update #{}", 120 - i));
            m.status = if i > 2 { MessageStatus::Read } else { MessageStatus::Delivered };
            m
        } else {
            Message::incoming(&id, "conv-acme", sent_at, &format!("Question #{} about the order", 120 - i))
        };
        if i % 17 == 0 {
            message.message_type = MessageType::Image;
            message.payload = serde_json::json!({ "caption": "product photo" });
        }
        if i == 40 {
            message.message_type = MessageType::from("sticker");
        }
        messages.push(message);
    }

    // Short thread
    for i in 0..6i64 {
        let sent_at = now - ChronoDuration::hours(30) + ChronoDuration::minutes(i * 4);
        messages.push(Message::incoming(
            format!("jordan-{}", i),
            "conv-jordan",
            sent_at,
            "Hi! Saw your broadcast.",
        ));
    }

    history.insert(messages).await;
}
