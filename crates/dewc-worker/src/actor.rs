//! In-process worker actor.
//!
//! SWC trees are `!Send`, so the worker, its engine and its session all live
//! on one dedicated OS thread. Callers talk to it over unbounded channels:
//!
//! ```text
//! caller (any task)                 worker thread
//! ─────────────────                 ─────────────
//! handle.send(command)   ──────▶    blocking_recv()
//!                                   worker.handle(command)
//! handle.recv().await    ◀──────    reply_tx.send(reply)
//! ```
//!
//! Replies come back in command order. Dropping the handle closes the command
//! channel, which ends the thread after the command in flight.

use crate::engine::AstEngine;
use crate::worker::TransformWorker;
use dewc_proto::{Command, Reply};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Errors talking to a worker thread.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Worker thread is no longer running")]
    Disconnected,

    #[error("Worker thread panicked")]
    Panicked,
}

/// Handle to a worker running on its own thread.
pub struct WorkerHandle {
    commands: Option<mpsc::UnboundedSender<Command>>,
    replies: mpsc::UnboundedReceiver<Reply>,
    thread: Option<std::thread::JoinHandle<()>>,
}

/// Start a worker thread.
///
/// `factory` runs on the new thread, so the engine does not need to be
/// `Send`.
pub fn spawn_worker<E, F>(factory: F) -> Result<WorkerHandle, WorkerError>
where
    E: AstEngine + 'static,
    F: FnOnce() -> E + Send + 'static,
{
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel::<Reply>();

    let thread = std::thread::Builder::new()
        .name("dewc-worker".to_string())
        .spawn(move || {
            let mut worker = TransformWorker::new(factory());
            while let Some(command) = command_rx.blocking_recv() {
                let reply = worker.handle(command);
                if reply_tx.send(reply).is_err() {
                    break;
                }
            }
            debug!("transform worker stopped");
        })
        .map_err(WorkerError::Spawn)?;

    Ok(WorkerHandle {
        commands: Some(command_tx),
        replies: reply_rx,
        thread: Some(thread),
    })
}

impl WorkerHandle {
    /// Queue a command without waiting for its reply.
    pub fn send(&self, command: Command) -> Result<(), WorkerError> {
        self.commands
            .as_ref()
            .ok_or(WorkerError::Disconnected)?
            .send(command)
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Wait for the next reply.
    pub async fn recv(&mut self) -> Result<Reply, WorkerError> {
        self.replies.recv().await.ok_or(WorkerError::Disconnected)
    }

    /// Send a command and wait for its reply.
    ///
    /// Only meaningful when no other replies are outstanding.
    pub async fn request(&mut self, command: Command) -> Result<Reply, WorkerError> {
        self.send(command)?;
        self.recv().await
    }

    /// Stop the worker and wait for its thread to exit.
    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), WorkerError> {
        self.commands.take();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| WorkerError::Panicked),
            None => Ok(()),
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
