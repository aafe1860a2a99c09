//! Background command dispatcher
//!
//! User intents are queued to a single worker task and executed one at a
//! time in submission order. Callers get a `Command` back immediately and
//! may await its outcome or simply drop it; dropping never cancels the
//! work.

use crate::error::{AppError, Result};
use std::future::Future;
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

enum Message {
    Run(Job),
    Barrier(oneshot::Sender<()>),
}

/// Handle to the background worker. Cheap to clone; the worker stops
/// once every handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct Dispatcher {
    queue: mpsc::UnboundedSender<Message>,
}

impl Dispatcher {
    /// Spawns the worker on the current tokio runtime.
    pub fn new() -> Self {
        let (queue, mut rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            tracing::debug!("Command dispatcher started");
            while let Some(message) = rx.recv().await {
                match message {
                    Message::Run(job) => job.await,
                    Message::Barrier(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Command dispatcher stopped");
        });

        Self { queue }
    }

    /// Queues `work` and returns without waiting for it.
    pub fn submit<F>(&self, label: &'static str, work: F) -> Command
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let job: Job = Box::pin(async move {
            let outcome = work.await;
            if let Err(e) = &outcome {
                tracing::warn!("{} failed: {}", label, e);
            }
            // The caller may have stopped listening
            let _ = tx.send(outcome);
        });

        if self.queue.send(Message::Run(job)).is_err() {
            return Command::ready(Err(AppError::Generic(format!(
                "{}: dispatcher is not running",
                label
            ))));
        }

        Command { outcome: rx }
    }

    /// Resolves once every command submitted before this call has finished.
    pub async fn idle(&self) {
        let (tx, rx) = oneshot::channel();
        if self.queue.send(Message::Barrier(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending result of a submitted command
#[must_use = "dropping a Command is fine, but its failure is then only logged"]
pub struct Command {
    outcome: oneshot::Receiver<Result<()>>,
}

impl Command {
    /// An already-finished command
    pub fn ready(outcome: Result<()>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self { outcome: rx }
    }

    /// Waits for the command to finish.
    pub async fn outcome(self) -> Result<()> {
        self.outcome.await.unwrap_or_else(|_| {
            Err(AppError::Generic(
                "command was dropped before completion".to_string(),
            ))
        })
    }
}
