//! Application state machine.
//!
//! [`WeatherApp`] owns the [`ApplicationState`] the view renders. The view
//! only emits [`Event`]s through [`WeatherApp::handle`]; side effects run as
//! tasks and their results re-enter through [`WeatherApp::next_completion`],
//! so every mutation happens on the task that drives the app.
//!
//! Dropping the app aborts all outstanding work; no completion is applied
//! afterwards.

use std::{fmt, sync::Arc};

use chrono::Utc;
use tokio::task::{AbortHandle, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::{
    client::{ClientError, WeatherClient},
    model::{MarkerData, StoredRecord, WeatherReading},
    store::{LoadOutcome, LocalStore, StoreResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Map,
    List,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListState {
    #[default]
    Loading,
    Loaded(Vec<StoredRecord>),
    Error,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationState {
    pub list_state: ListState,
    pub current_marker: MarkerData,
    pub active_tab: Tab,
    /// True from the moment a request is accepted until its result is applied.
    pub is_requesting: bool,
    pub request_error: Option<String>,
    pub load_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ShowTab(Tab),
    Request,
    LoadRecords,
}

#[derive(Debug)]
enum Completion {
    Requested(Result<WeatherReading, ClientError>),
    Saved(StoreResult<()>),
    Loaded(StoreResult<LoadOutcome>),
}

pub struct WeatherApp {
    state: ApplicationState,
    client: Arc<dyn WeatherClient>,
    store: Arc<dyn LocalStore>,
    tasks: JoinSet<Completion>,
    request_task: Option<AbortHandle>,
}

impl fmt::Debug for WeatherApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherApp")
            .field("state", &self.state)
            .field("client", &self.client)
            .field("store", &self.store)
            .field("pending", &self.tasks.len())
            .finish()
    }
}

impl WeatherApp {
    pub fn new(client: Arc<dyn WeatherClient>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            state: ApplicationState::default(),
            client,
            store,
            tasks: JoinSet::new(),
            request_task: None,
        }
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    /// Number of side effects whose results have not been applied yet.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Applies `event`. Must be called from within a tokio runtime.
    pub fn handle(&mut self, event: Event) {
        debug!(?event, "handling event");

        match event {
            Event::ShowTab(tab) => self.state.active_tab = tab,
            Event::Request => self.start_request(),
            Event::LoadRecords => self.start_load(),
        }
    }

    /// Waits for one side effect and applies its result.
    ///
    /// Returns `false` when nothing was pending.
    pub async fn next_completion(&mut self) -> bool {
        match self.tasks.join_next().await {
            None => false,
            Some(Ok(completion)) => {
                self.apply(completion);
                true
            }
            Some(Err(err)) => {
                self.recover(err);
                true
            }
        }
    }

    /// Applies completions until no side effect is left, including the ones
    /// spawned while settling.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn start_request(&mut self) {
        if self.state.is_requesting {
            debug!("request already in flight; ignoring");
            return;
        }

        self.state.request_error = None;
        self.state.is_requesting = true;

        let client = Arc::clone(&self.client);
        let handle = self
            .tasks
            .spawn(async move { Completion::Requested(client.request_current().await) });
        self.request_task = Some(handle);
        info!("weather request started");
    }

    fn start_load(&mut self) {
        let store = Arc::clone(&self.store);
        self.tasks.spawn(async move { Completion::Loaded(store.load().await) });
    }

    fn start_save(&mut self, reading: WeatherReading) {
        let store = Arc::clone(&self.store);
        let captured_at = Utc::now();
        self.tasks
            .spawn(async move { Completion::Saved(store.insert(&reading, captured_at).await) });
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Requested(result) => {
                self.state.is_requesting = false;
                self.request_task = None;

                match result {
                    Ok(reading) => {
                        info!(name = %reading.name, "weather request succeeded");
                        self.state.current_marker = MarkerData::from_reading(&reading);
                        self.state.request_error = None;
                        self.start_save(reading);
                    }
                    Err(err) => {
                        warn!(error = %err, "weather request failed");
                        self.state.request_error = Some(err.user_message().to_string());
                    }
                }
            }
            Completion::Saved(Ok(())) => debug!("reading saved"),
            Completion::Saved(Err(err)) => {
                warn!(error = %err, "saving reading failed");
                self.state.load_error = Some(err.to_string());
            }
            Completion::Loaded(Ok(outcome)) => {
                let records = outcome.into_records();
                debug!(count = records.len(), "records loaded");
                self.state.list_state = ListState::Loaded(records);
            }
            Completion::Loaded(Err(err)) => {
                warn!(error = %err, "loading records failed");
                self.state.list_state = ListState::Error;
                self.state.load_error = Some(err.to_string());
            }
        }
    }

    /// A side effect panicked. If it was the request, release the
    /// single-flight guard so the user can retry.
    fn recover(&mut self, err: JoinError) {
        error!(error = %err, "side effect task failed");

        if self.request_task.as_ref().is_some_and(|task| task.id() == err.id()) {
            self.request_task = None;
            self.state.is_requesting = false;
            self.state.request_error = Some(ClientError::Connectivity.user_message().to_string());
        }
    }
}
