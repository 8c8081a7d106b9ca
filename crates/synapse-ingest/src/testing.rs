//! In-memory fakes for pipeline and resolver tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use synapse_core::{Error, Item, ItemRepository, QueryFilters, Result, VectorHit, VectorStore};

use crate::page_fetch::PageFetcher;

// =============================================================================
// PAGE FETCHER
// =============================================================================

#[derive(Default)]
struct FakePages {
    pages: HashMap<String, String>,
    json: HashMap<String, JsonValue>,
    head_ok: HashSet<String>,
    latency_ms: u64,
}

/// Serves registered URLs; anything else is a fetch error (GET) or `false` (HEAD).
#[derive(Clone, Default)]
pub struct FakePageFetcher {
    pages: Arc<FakePages>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakePageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn pages_mut(&mut self) -> &mut FakePages {
        Arc::get_mut(&mut self.pages).expect("configure before cloning")
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages_mut().pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_json(mut self, url: &str, body: JsonValue) -> Self {
        self.pages_mut().json.insert(url.to_string(), body);
        self
    }

    pub fn with_head_ok(mut self, url: &str) -> Self {
        self.pages_mut().head_ok.insert(url.to_string());
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.pages_mut().latency_ms = latency_ms;
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    async fn record(&self, url: &str) {
        self.requests.lock().unwrap().push(url.to_string());
        if self.pages.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.pages.latency_ms)).await;
        }
    }
}

#[async_trait]
impl PageFetcher for FakePageFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.record(url).await;
        self.pages
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Metadata(format!("GET {} returned 404", url)))
    }

    async fn get_json(&self, url: &str) -> Result<JsonValue> {
        self.record(url).await;
        self.pages
            .json
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Metadata(format!("GET {} returned 404", url)))
    }

    async fn head_ok(&self, url: &str) -> Result<bool> {
        self.record(url).await;
        Ok(self.pages.head_ok.contains(url))
    }
}

// =============================================================================
// STORES
// =============================================================================

/// Item repository backed by a vector; `search_items` is not supported.
#[derive(Clone, Default)]
pub struct InMemoryItemRepository {
    items: Arc<Mutex<Vec<Item>>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn insert(&self, item: &Item) -> Result<()> {
        self.items.lock().unwrap().push(item.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Item> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(Error::ItemNotFound(id))
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Item>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Item>> {
        let mut items = self.items.lock().unwrap().clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Err(Error::ItemNotFound(id));
        }
        Ok(())
    }

    async fn search_items(&self, _filters: &QueryFilters, _limit: usize) -> Result<Vec<Item>> {
        Err(Error::Internal("search not supported by this fake".to_string()))
    }
}

/// Vector store recording writes; can be told to fail every call.
#[derive(Clone, Default)]
pub struct InMemoryVectorStore {
    entries: Arc<Mutex<HashMap<(String, String), (Vec<f32>, JsonValue)>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn attributes(&self, collection: &str, id: &str) -> Option<JsonValue> {
        self.entries
            .lock()
            .unwrap()
            .get(&(collection.to_string(), id.to_string()))
            .map(|(_, attrs)| attrs.clone())
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(Error::VectorStore("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add_embedding(
        &self,
        collection: &str,
        id: &str,
        vector: &[f32],
        attributes: JsonValue,
    ) -> Result<()> {
        self.check()?;
        self.entries.lock().unwrap().insert(
            (collection.to_string(), id.to_string()),
            (vector.to_vec(), attributes),
        );
        Ok(())
    }

    async fn query(&self, _collection: &str, _vector: &[f32], _k: usize) -> Result<Vec<VectorHit>> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .remove(&(collection.to_string(), id.to_string()));
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}
