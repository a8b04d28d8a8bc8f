//! Controllable fakes for the transport, client and store seams.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::{
    client::{ClientError, WeatherClient},
    model::{StoredRecord, WeatherReading},
    store::{LoadOutcome, LocalStore, StoreError, StoreResult},
    transport::{HttpRequest, HttpResponse, Transport, TransportError},
};

pub fn sample_reading() -> WeatherReading {
    WeatherReading {
        name: "London".to_string(),
        latitude: 51.5085,
        longitude: -0.1257,
        weather_summary: "Rain, Mist".to_string(),
        temperature_c: 11.5,
        humidity_pct: 93,
    }
}

/// Polls `condition` between scheduler yields; panics after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Pending calls whose answers the test hands out by index.
#[derive(Debug)]
struct Pending<T> {
    senders: Mutex<Vec<Option<oneshot::Sender<T>>>>,
}

impl<T> Default for Pending<T> {
    fn default() -> Self {
        Self { senders: Mutex::new(Vec::new()) }
    }
}

impl<T> Pending<T> {
    fn push(&self) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        self.senders.lock().push(Some(tx));
        rx
    }

    fn len(&self) -> usize {
        self.senders.lock().len()
    }

    /// Returns false when the caller already went away.
    fn complete(&self, index: usize, value: T) -> bool {
        let sender = self.senders.lock().get_mut(index).and_then(Option::take);
        match sender {
            Some(sender) => sender.send(value).is_ok(),
            None => panic!("can't complete request {index} never made"),
        }
    }

    fn is_abandoned(&self, index: usize) -> bool {
        self.senders.lock().get(index).and_then(Option::as_ref).is_some_and(|s| s.is_closed())
    }
}

#[derive(Debug, Default)]
pub struct SpyTransport {
    requests: Mutex<Vec<HttpRequest>>,
    pending: Pending<Result<HttpResponse, TransportError>>,
}

impl SpyTransport {
    pub fn call_count(&self) -> usize {
        self.pending.len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        wait_until(|| self.call_count() >= count).await;
    }

    pub fn complete(&self, index: usize, outcome: Result<HttpResponse, TransportError>) -> bool {
        self.pending.complete(index, outcome)
    }
}

#[async_trait]
impl Transport for SpyTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);
        let answer = self.pending.push();
        answer.await.unwrap_or_else(|_| Err(TransportError::Malformed("abandoned".into())))
    }
}

#[derive(Debug, Default)]
pub struct FakeClient {
    pending: Pending<Result<WeatherReading, ClientError>>,
    panics: AtomicBool,
}

impl FakeClient {
    pub fn panicking() -> Self {
        let client = Self::default();
        client.panics.store(true, Ordering::SeqCst);
        client
    }

    pub fn call_count(&self) -> usize {
        self.pending.len()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        wait_until(|| self.call_count() >= count).await;
    }

    pub fn complete(&self, index: usize, result: Result<WeatherReading, ClientError>) -> bool {
        self.pending.complete(index, result)
    }

    pub fn is_abandoned(&self, index: usize) -> bool {
        self.pending.is_abandoned(index)
    }
}

#[async_trait]
impl WeatherClient for FakeClient {
    async fn request_current(&self) -> Result<WeatherReading, ClientError> {
        if self.panics.load(Ordering::SeqCst) {
            panic!("client blew up");
        }
        let answer = self.pending.push();
        answer.await.unwrap_or(Err(ClientError::Connectivity))
    }
}

/// In-memory store that can be told to fail.
#[derive(Debug, Default)]
pub struct FakeStore {
    records: Mutex<Vec<StoredRecord>>,
    insert_calls: Mutex<Vec<(WeatherReading, DateTime<Utc>)>>,
    fail_inserts: AtomicBool,
    fail_loads: AtomicBool,
    panic_loads: AtomicBool,
}

impl FakeStore {
    pub fn failing_inserts() -> Self {
        let store = Self::default();
        store.fail_inserts.store(true, Ordering::SeqCst);
        store
    }

    pub fn failing_loads() -> Self {
        let store = Self::default();
        store.fail_loads.store(true, Ordering::SeqCst);
        store
    }

    pub fn panicking_loads() -> Self {
        let store = Self::default();
        store.panic_loads.store(true, Ordering::SeqCst);
        store
    }

    pub fn insert_calls(&self) -> Vec<(WeatherReading, DateTime<Utc>)> {
        self.insert_calls.lock().clone()
    }
}

#[async_trait]
impl LocalStore for FakeStore {
    async fn insert(
        &self,
        reading: &WeatherReading,
        captured_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.insert_calls.lock().push((reading.clone(), captured_at));
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Worker("disk full".into()));
        }

        let mut records = self.records.lock();
        let id = records.len() as i64 + 1;
        records.push(StoredRecord { id, reading: reading.clone(), captured_at });
        Ok(())
    }

    async fn load(&self) -> StoreResult<LoadOutcome> {
        if self.panic_loads.load(Ordering::SeqCst) {
            panic!("store blew up");
        }
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError::Worker("no such table: weather_data_table".into()));
        }

        let records = self.records.lock().clone();
        if records.is_empty() { Ok(LoadOutcome::Empty) } else { Ok(LoadOutcome::Found(records)) }
    }
}
