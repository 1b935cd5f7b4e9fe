//! The single execution context that owns photo state and UI updates.

use tokio::sync::mpsc;
use tracing::warn;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Queue of work that must run on the UI-affinity context.
///
/// Whoever owns the UI loop owns the `MainContext` and pumps it; background
/// tasks only ever reach it through a [`MainContextHandle`]. Jobs run one at a
/// time, in dispatch order, on the thread that pumps the queue.
pub struct MainContext {
    rx: mpsc::UnboundedReceiver<Job>,
}

/// Cloneable sender for [`MainContext`] jobs.
#[derive(Clone)]
pub struct MainContextHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl MainContext {
    /// Creates the context and the first handle to it.
    #[must_use]
    pub fn new() -> (Self, MainContextHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, MainContextHandle { tx })
    }

    /// Waits for the next job and runs it.
    /// Returns false once every handle is gone and the queue is drained.
    pub async fn turn(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs every job already queued without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Runs jobs until every handle is dropped.
    pub async fn run(mut self) {
        while self.turn().await {}
    }
}

impl std::fmt::Debug for MainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainContext").finish_non_exhaustive()
    }
}

impl MainContextHandle {
    /// Queues `job` to run on the main context.
    /// Returns false if the context has been dropped.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) -> bool {
        if self.tx.send(Box::new(job)).is_err() {
            warn!("Main context is gone, dropping job");
            return false;
        }
        true
    }
}

impl std::fmt::Debug for MainContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainContextHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
