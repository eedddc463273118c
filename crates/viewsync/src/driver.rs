use std::sync::Arc;

use formats::FeatureCollection;
use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::mpsc;

use crate::error::FetchError;
use crate::key::FeatureRequestKey;
use crate::source::FeatureSource;

/// Result of one dispatched fetch, tagged with the generation that issued it.
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub key: FeatureRequestKey,
    pub result: Result<FeatureCollection, FetchError>,
}

/// Runs fetches with newest-key-wins supersession.
///
/// At most one request is in flight per driver: dispatching a new key aborts
/// the prior request, and aborted tasks never report. A consumer must still
/// compare `FetchOutcome::generation` against [`FetchDriver::current_generation`]
/// before applying a result, since a completed response may be sitting in the
/// channel when a newer key is dispatched.
pub struct FetchDriver {
    source: Arc<dyn FeatureSource>,
    generation: u64,
    inflight: Option<AbortHandle>,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
}

impl FetchDriver {
    pub fn new(source: Arc<dyn FeatureSource>) -> (Self, mpsc::UnboundedReceiver<FetchOutcome>) {
        let (outcomes, receiver) = mpsc::unbounded_channel();
        (
            Self {
                source,
                generation: 0,
                inflight: None,
                outcomes,
            },
            receiver,
        )
    }

    pub fn current_generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, outcome: &FetchOutcome) -> bool {
        outcome.generation == self.generation
    }

    /// Starts fetching `key`, aborting any in-flight request first.
    pub fn dispatch(&mut self, key: FeatureRequestKey) -> u64 {
        if let Some(prior) = self.inflight.take() {
            prior.abort();
        }

        self.generation += 1;
        let generation = self.generation;
        let (handle, registration) = AbortHandle::new_pair();
        self.inflight = Some(handle);

        let source = Arc::clone(&self.source);
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let fetch = async { source.fetch_collection(&key).await };
            match Abortable::new(fetch, registration).await {
                Ok(result) => {
                    let _ = outcomes.send(FetchOutcome {
                        generation,
                        key,
                        result,
                    });
                }
                Err(_aborted) => {
                    tracing::debug!(generation, "feature fetch superseded");
                }
            }
        });

        generation
    }
}
