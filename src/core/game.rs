/// Core game interface for the facilitator framework
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

/// Handle the game uses to request side effects from the engine.
///
/// Background work is spawned through [`Context::spawn`]; its result comes back to
/// the game through [`Game::handle_event`] on the engine's loop, so game state is
/// only ever touched by one command at a time.
pub struct Context<E> {
    tx: mpsc::UnboundedSender<E>,
    in_flight: Arc<AtomicUsize>,
}

impl<E: Send + 'static> Context<E> {
    pub fn new(tx: mpsc::UnboundedSender<E>) -> Self {
        Self { tx, in_flight: Arc::new(AtomicUsize::new(0)) }
    }

    /// Run `task` in the background and deliver its output as an event.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = E> + Send + 'static,
    {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = task.await;
            // Receiver gone means the engine has shut down.
            let _ = tx.send(event);
        });
    }

    /// Number of spawned tasks whose event has not been handled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Called by the engine once it has received an event.
    pub(crate) fn settle(&self) {
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

/// Main game trait that all facilitated games implement
#[async_trait]
pub trait Game: Send {
    /// A parsed facilitator action
    type Command: Send;

    /// Result of background work started via [`Context::spawn`]
    type Event: Send + 'static;

    /// Public view of the table, safe to show to everyone at the device
    type State: Serialize;

    /// Parse one line typed by the facilitator
    fn parse_command(line: &str) -> Result<Self::Command, String>;

    async fn handle_command(&mut self, command: Self::Command, ctx: &Context<Self::Event>);

    fn handle_event(&mut self, event: Self::Event, ctx: &Context<Self::Event>);

    /// Show a message that did not come from a command (e.g. a parse error)
    fn report(&mut self, message: String);

    /// Last feedback line for the facilitator
    fn status(&self) -> &str;

    fn state(&self) -> Self::State;

    /// Draw the game. Returns where the input cursor should sit, if anywhere.
    fn render(&self, frame: &mut ratatui::Frame, input: &str) -> Option<(u16, u16)>;
}
