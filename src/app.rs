//! Terminal lifecycle and the main event loop.

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::dispatch::SubmissionDispatcher;
use crate::events::{AppEvent, TuiEvent};
use crate::session::SessionId;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use crate::webhook::WebhookClient;

const TICK: Duration = Duration::from_millis(300);

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Restores the terminal even when the loop bails out with an error
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<(Self, Tui)> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let guard = TerminalGuard;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
            .context("Failed to enter alternate screen")?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .context("Failed to create terminal")?;

        Ok((guard, terminal))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Run the chat UI until the user quits
pub async fn run(config: Config) -> Result<()> {
    let client = WebhookClient::new(config.webhook_url.clone(), SessionId::generate())?;
    tracing::info!(
        session_id = %client.session_id(),
        url = client.url(),
        delivery = ?config.delivery,
        "Starting chat"
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = SubmissionDispatcher::new(client, config.delivery, tx.clone());
    let mut manager = ConversationManager::new(dispatcher, &config.ui);

    spawn_input_reader(tx.clone());
    spawn_ticker(tx);

    let (_guard, mut terminal) = TerminalGuard::enter()?;

    loop {
        terminal
            .draw(|frame| {
                let area = frame.size();
                manager.render(area, frame.buffer_mut());
            })
            .context("Failed to draw frame")?;

        let Some(event) = rx.recv().await else {
            break;
        };

        match event {
            AppEvent::Tui(TuiEvent::Key(key)) => {
                if manager.handle_key(key) == ConversationAction::Exit {
                    break;
                }
            }
            AppEvent::Tui(TuiEvent::Paste(text)) => manager.handle_paste(&text),
            AppEvent::Tui(TuiEvent::Resize(width, height)) => {
                tracing::debug!(width, height, "Terminal resized");
            }
            AppEvent::BotReply { in_reply_to, text } => manager.handle_reply(in_reply_to, text),
            AppEvent::Tick => manager.tick(),
        }
    }

    if manager.outstanding() > 0 {
        tracing::info!(outstanding = manager.outstanding(), "Exiting with replies still pending");
    }
    Ok(())
}

/// Blocking crossterm reads live on their own thread and are forwarded to the loop
fn spawn_input_reader(tx: mpsc::UnboundedSender<AppEvent>) {
    std::thread::spawn(move || loop {
        let forwarded = match event::read() {
            Ok(Event::Key(key)) => Some(TuiEvent::Key(key)),
            Ok(Event::Paste(text)) => Some(TuiEvent::Paste(text)),
            Ok(Event::Resize(width, height)) => Some(TuiEvent::Resize(width, height)),
            Ok(_) => None,
            Err(e) => {
                tracing::error!("Failed to read terminal event: {}", e);
                break;
            }
        };

        if let Some(event) = forwarded {
            if tx.send(AppEvent::Tui(event)).is_err() {
                break;
            }
        }
    });
}

fn spawn_ticker(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK);
        loop {
            interval.tick().await;
            if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });
}
