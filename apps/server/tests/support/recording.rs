use async_trait::async_trait;
use medora::{
    db::{CollectionQuery, DocumentStore, MemoryStore, WriteBatch},
    models::{Collection, Document, JsonMap},
    Error, Result,
};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

/// One backend call as seen by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Count(CollectionQuery),
    Find(CollectionQuery),
    Get(Collection, String),
    Insert(Collection),
    Update(Collection, String),
    Delete(Collection, String),
    Commit(usize),
}

/// A `DocumentStore` decorator that records every call.
///
/// Point reads can be slowed down (to observe concurrency under a paused
/// clock) or made to fail for chosen keys.
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<Call>>,
    get_delay: Option<Duration>,
    failing_gets: Mutex<HashSet<(Collection, String)>>,
    fail_finds: bool,
    gets_in_flight: AtomicUsize,
    max_gets_in_flight: AtomicUsize,
}

impl RecordingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            get_delay: None,
            failing_gets: Mutex::new(HashSet::new()),
            fail_finds: false,
            gets_in_flight: AtomicUsize::new(0),
            max_gets_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    pub fn with_failing_finds(mut self) -> Self {
        self.fail_finds = true;
        self
    }

    pub fn fail_get(&self, collection: Collection, id: &str) {
        self.failing_gets
            .lock()
            .unwrap()
            .insert((collection, id.to_string()));
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
        self.max_gets_in_flight.store(0, Ordering::SeqCst);
    }

    pub fn gets(&self) -> Vec<(Collection, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Get(collection, id) => Some((collection, id)),
                _ => None,
            })
            .collect()
    }

    pub fn finds(&self) -> Vec<CollectionQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Find(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    pub fn counts(&self) -> Vec<CollectionQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Count(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    /// Highest number of point reads that were pending at the same time.
    pub fn max_concurrent_gets(&self) -> usize {
        self.max_gets_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn injected_failure() -> Error {
    Error::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn count(&self, query: &CollectionQuery) -> Result<u64> {
        self.record(Call::Count(query.clone()));
        self.inner.count(query).await
    }

    async fn find(&self, query: &CollectionQuery) -> Result<Vec<Document>> {
        self.record(Call::Find(query.clone()));
        if self.fail_finds {
            return Err(injected_failure());
        }
        self.inner.find(query).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        self.record(Call::Get(collection, id.to_string()));

        let in_flight = self.gets_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_gets_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        self.gets_in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = self
            .failing_gets
            .lock()
            .unwrap()
            .contains(&(collection, id.to_string()));
        if failing {
            return Err(injected_failure());
        }
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: Collection, data: JsonMap) -> Result<Document> {
        self.record(Call::Insert(collection));
        self.inner.insert(collection, data).await
    }

    async fn update(&self, collection: Collection, id: &str, patch: JsonMap) -> Result<Document> {
        self.record(Call::Update(collection, id.to_string()));
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.record(Call::Delete(collection, id.to_string()));
        self.inner.delete(collection, id).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.record(Call::Commit(batch.len()));
        self.inner.commit(batch).await
    }
}
