//! Remote option sets for select fields
//!
//! An [`OptionsSlot`] tracks the option set of one field. Every fetch starts
//! with [`OptionsSlot::begin`], which cancels whatever was in flight and
//! hands back a [`FetchTicket`]. Results are applied with
//! [`OptionsSlot::settle`]; a result whose ticket is no longer current is
//! dropped, so a slow stale response can never overwrite a newer one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Message shown to the user when options cannot be loaded
pub const LOAD_FAILURE_NOTICE: &str = "System error. Please refresh.";

/// Caller-owned handle used to abandon an in-flight fetch
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            state: Arc::new(tx),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once `cancel` has been called on any clone of this token
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for a select field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionSet {
    /// No fetch has completed yet
    #[default]
    NotLoaded,
    /// Fetch completed; the list may be empty
    Loaded(Vec<String>),
    /// Fetch failed with the given reason
    Failed(String),
}

impl OptionSet {
    pub fn is_loaded(&self) -> bool {
        matches!(self, OptionSet::Loaded(_))
    }

    pub fn values(&self) -> Option<&[String]> {
        match self {
            OptionSet::Loaded(values) => Some(values),
            _ => None,
        }
    }

    /// Loaded, but the endpoint returned nothing
    pub fn is_empty_after_load(&self) -> bool {
        matches!(self, OptionSet::Loaded(values) if values.is_empty())
    }
}

/// Why an options fetch did not produce a loaded set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Cancelled by the caller; never surfaced to the user
    #[error("options request was cancelled")]
    Cancelled,

    #[error(transparent)]
    Failure(#[from] LoadFailure),
}

/// A fetch that failed for a reason the user should be told about
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    #[error("network error fetching {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    #[error("timed out fetching {endpoint}")]
    Timeout { endpoint: String },

    #[error("{endpoint} responded with HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("could not decode options from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

/// Transport that retrieves the raw option values for an endpoint
#[async_trait]
pub trait OptionsFetcher: Send + Sync {
    async fn fetch(&self, endpoint: &str) -> Result<Vec<String>, LoadFailure>;
}

/// GET the endpoint and decode a JSON array of strings
pub struct HttpOptionsFetcher {
    client: Client,
}

impl HttpOptionsFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
            Client::new()
        });
        Self { client }
    }
}

#[async_trait]
impl OptionsFetcher for HttpOptionsFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Vec<String>, LoadFailure> {
        debug!(endpoint, "Fetching options");

        let response = self.client.get(endpoint).send().await.map_err(|e| {
            if e.is_timeout() {
                LoadFailure::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                LoadFailure::Network {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadFailure::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| LoadFailure::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_str::<Vec<String>>(&body).map_err(|e| LoadFailure::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

/// Loads option sets, honouring a cancellation token
#[derive(Clone)]
pub struct RemoteOptionsLoader {
    fetcher: Arc<dyn OptionsFetcher>,
}

impl RemoteOptionsLoader {
    pub fn new(fetcher: Arc<dyn OptionsFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn http(timeout: Duration) -> Self {
        Self::new(Arc::new(HttpOptionsFetcher::new(timeout)))
    }

    /// Fetch the option set for `endpoint`.
    ///
    /// Returns `LoadError::Cancelled` if the token fires before the
    /// response arrives, even when the response itself would have failed.
    pub async fn load(
        &self,
        endpoint: &str,
        token: &CancellationToken,
    ) -> Result<OptionSet, LoadError> {
        if token.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!(endpoint, "Options fetch cancelled");
                Err(LoadError::Cancelled)
            }
            result = self.fetcher.fetch(endpoint) => {
                if token.is_cancelled() {
                    return Err(LoadError::Cancelled);
                }
                match result {
                    Ok(values) => Ok(OptionSet::Loaded(values)),
                    Err(failure) => {
                        warn!(endpoint, error = %failure, "Options fetch failed");
                        Err(LoadError::Failure(failure))
                    }
                }
            }
        }
    }
}

/// Identifies one fetch attempt for a slot
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    token: CancellationToken,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// What `settle` did with a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The result became the slot's option set
    Applied,
    /// The current fetch failed; the caller must notify the user
    Failed(LoadFailure),
    /// Stale, cancelled, or already settled; nothing changed
    Ignored,
}

/// Option set of one field plus the fetch currently allowed to fill it
#[derive(Debug, Default)]
pub struct OptionsSlot {
    options: OptionSet,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

impl OptionsSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot whose options are known up front
    pub fn preloaded(values: Vec<String>) -> Self {
        Self {
            options: OptionSet::Loaded(values),
            ..Self::default()
        }
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a new fetch attempt, cancelling the previous one first
    pub fn begin(&mut self) -> FetchTicket {
        self.cancel();
        self.generation += 1;
        self.options = OptionSet::NotLoaded;

        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        FetchTicket {
            generation: self.generation,
            token,
        }
    }

    /// Cancel the in-flight fetch, if any. The option set is left as is.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    /// Apply the result of the fetch identified by `ticket`
    pub fn settle(
        &mut self,
        ticket: &FetchTicket,
        result: Result<OptionSet, LoadError>,
    ) -> SettleOutcome {
        let current = ticket.generation == self.generation
            && self.in_flight.is_some()
            && !ticket.token.is_cancelled();
        if !current {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Ignoring superseded options result"
            );
            return SettleOutcome::Ignored;
        }

        match result {
            Ok(options) => {
                self.in_flight = None;
                self.options = options;
                SettleOutcome::Applied
            }
            Err(LoadError::Failure(failure)) => {
                self.in_flight = None;
                self.options = OptionSet::Failed(failure.to_string());
                SettleOutcome::Failed(failure)
            }
            Err(LoadError::Cancelled) => SettleOutcome::Ignored,
        }
    }
}
