//! Best-effort persistence raced against a short deadline.
//!
//! The write runs on its own task. The caller waits for whichever comes
//! first: the write finishing or the deadline timer. A write that loses the
//! race keeps running to completion in the background; nobody waits for it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info, warn};

use crate::core::config::PersistConfig;
use crate::core::quote::Quote;
use crate::core::rate::NewRate;
use crate::store::RateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The store call finished inside the deadline, whatever it returned.
    Committed,
    /// The deadline fired first; the write was left running.
    Abandoned,
}

impl fmt::Display for PersistOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistOutcome::Committed => write!(f, "committed"),
            PersistOutcome::Abandoned => write!(f, "abandoned"),
        }
    }
}

#[derive(Clone)]
pub struct Persistor {
    store: Arc<dyn RateStore>,
    deadline: Duration,
    simulated_write: Duration,
}

impl Persistor {
    pub fn new(store: Arc<dyn RateStore>, config: &PersistConfig) -> Self {
        Persistor {
            store,
            deadline: config.deadline(),
            simulated_write: config.simulated_write(),
        }
    }

    /// Attempts to store `quote`, giving up after the configured deadline.
    ///
    /// The deadline is measured from this call. The outcome is for logging
    /// only.
    pub async fn persist(&self, quote: &Quote) -> PersistOutcome {
        let deadline = Instant::now() + self.deadline;
        let (done_tx, done_rx) = oneshot::channel();

        let store = Arc::clone(&self.store);
        let simulated_write = self.simulated_write;
        let quote = quote.clone();
        tokio::spawn(async move {
            sleep(simulated_write).await;
            let rate = NewRate::from_quote(&quote);
            match store.create(rate).await {
                Ok(stored) => debug!(id = stored.id, "Rate persisted"),
                Err(e) => warn!(error = %e, "Rate store rejected write"),
            }
            // The receiver is gone when the race was already lost
            let _ = done_tx.send(());
        });

        let outcome = tokio::select! {
            biased;
            res = done_rx => match res {
                Ok(()) => PersistOutcome::Committed,
                // Write task panicked before reporting back
                Err(_) => PersistOutcome::Abandoned,
            },
            _ = sleep_until(deadline) => PersistOutcome::Abandoned,
        };

        match outcome {
            PersistOutcome::Committed => info!(%outcome, "Rate persistence finished within deadline"),
            PersistOutcome::Abandoned => warn!(
                %outcome,
                deadline_ms = self.deadline.as_millis() as u64,
                "Rate persistence exceeded deadline"
            ),
        }
        outcome
    }
}
