use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};

use crate::error::TreeError;
use crate::product::ProductRow;
use crate::source::DataSource;

pub type LoadResult = Result<Vec<ProductRow>, TreeError>;

struct Delivery {
    generation: u64,
    result: LoadResult,
}

/// Runs one fetch at a time on a background thread.
///
/// Each request bumps a generation counter; results from superseded
/// requests are dropped when they arrive, so the latest request wins.
pub struct Loader {
    tx: mpsc::Sender<Delivery>,
    rx: mpsc::Receiver<Delivery>,
    generation: u64,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, generation: 0 }
    }

    /// Start fetching `source`. Returns the request's generation.
    pub fn request(&mut self, source: DataSource) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let sender = self.tx.clone();

        debug!(generation, source = %source, "starting fetch");
        let spawned = thread::Builder::new()
            .name("modeltree-fetch".to_string())
            .spawn(move || {
                let result = source.fetch();
                let _ = sender.send(Delivery { generation, result });
            });

        if let Err(e) = spawned {
            warn!(error = %e, "could not spawn fetch thread");
        }
        generation
    }

    /// Non-blocking poll for the result of the latest request.
    pub fn try_recv(&self) -> Option<LoadResult> {
        while let Ok(delivery) = self.rx.try_recv() {
            if delivery.generation == self.generation {
                return Some(delivery.result);
            }
            debug!(
                stale = delivery.generation,
                current = self.generation,
                "dropping superseded fetch result"
            );
        }
        None
    }

    /// Block until the latest request completes.
    #[cfg(test)]
    pub fn wait(&self) -> Option<LoadResult> {
        while let Ok(delivery) = self.rx.recv() {
            if delivery.generation == self.generation {
                return Some(delivery.result);
            }
        }
        None
    }
}
