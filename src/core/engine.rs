use crate::core::game::{Context, Game};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

pub struct Engine<G: Game> {
    game: G,
    ctx: Context<G::Event>,
    inbox: mpsc::UnboundedReceiver<G::Event>,
}

impl<G: Game> Engine<G> {
    pub fn new(game: G) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        Self { game, ctx: Context::new(tx), inbox }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn into_game(self) -> G {
        self.game
    }

    /// Interactive loop: draw, read keys into a line buffer, dispatch on Enter.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<G> {
        let mut input = String::new();

        loop {
            terminal.draw(|f| {
                if let Some(pos) = self.game.render(f, &input) {
                    f.set_cursor_position(pos);
                }
            })?;

            // INPUT (Non-blocking)
            if event::poll(Duration::from_millis(0))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if is_quit(&key) {
                            break;
                        }
                        match key.code {
                            KeyCode::Enter => {
                                let line = std::mem::take(&mut input);
                                self.dispatch(&line).await;
                            }
                            KeyCode::Backspace => {
                                input.pop();
                            }
                            KeyCode::Char(c) => input.push(c),
                            _ => {}
                        }
                    }
                }
            }

            // Wake periodically so keys keep getting polled while nothing arrives.
            tokio::select! {
                Some(ev) = self.inbox.recv() => {
                    self.ctx.settle();
                    self.game.handle_event(ev, &self.ctx);
                }
                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }
        }

        Ok(self.game)
    }

    /// Headless loop: one command per line, `#` starts a comment.
    ///
    /// Background work started by a command is waited for before the next line is
    /// read, so a script always produces the same transcript for the same seed.
    pub async fn run_script<R>(mut self, reader: R, json: bool) -> Result<G>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            self.dispatch(line).await;
            self.settle().await;

            println!("> {line}");
            println!("{}", self.game.status());
            if json {
                println!("{}", serde_json::to_string(&self.game.state())?);
            }
        }
        Ok(self.game)
    }

    pub async fn dispatch(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match G::parse_command(line) {
            Ok(command) => self.game.handle_command(command, &self.ctx).await,
            Err(message) => {
                debug!(line, "rejected command");
                self.game.report(message);
            }
        }
    }

    /// Deliver every pending background event to the game.
    pub async fn settle(&mut self) {
        while self.ctx.in_flight() > 0 {
            match self.inbox.recv().await {
                Some(ev) => {
                    self.ctx.settle();
                    self.game.handle_event(ev, &self.ctx);
                }
                None => break,
            }
        }
    }
}

/// Esc, or Ctrl+C, which raw mode delivers as a plain key press.
fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
