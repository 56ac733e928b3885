//! Flow definition cache with an explicit lifecycle.
//!
//! Deliberately an owned object rather than a module-level singleton: tests
//! and tools construct isolated instances and clear them at will. Documents
//! live on disk as `<root>/<audience>/<flow_id>.json`; anything missing or
//! malformed degrades to "no flow", never an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::flow::definition::{Audience, FlowDefinition};

pub struct FlowRegistry {
    root: PathBuf,
    cache: RwLock<HashMap<(Audience, String), Arc<FlowDefinition>>>,
}

impl FlowRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: RwLock::new(HashMap::new()) }
    }

    /// Fetch a flow, loading and caching it on first use. Returns `None`
    /// for unknown ids and for documents that fail to parse.
    pub fn get(&self, audience: Audience, flow_id: &str) -> Option<Arc<FlowDefinition>> {
        let key = (audience, flow_id.to_owned());
        {
            let cache = self.read_cache();
            if let Some(flow) = cache.get(&key) {
                return Some(Arc::clone(flow));
            }
        }

        let loaded = Arc::new(self.load_from_disk(audience, flow_id)?);
        let mut cache = self.write_cache();
        let entry = cache.entry(key).or_insert_with(|| Arc::clone(&loaded));
        Some(Arc::clone(entry))
    }

    /// Register a flow directly, bypassing disk. Used by tests and by the
    /// simulator, which reads its flow from an explicit path.
    pub fn insert(&self, flow: FlowDefinition) -> Arc<FlowDefinition> {
        let key = (flow.audience, flow.id.clone());
        let flow = Arc::new(flow);
        self.write_cache().insert(key, Arc::clone(&flow));
        flow
    }

    pub fn clear(&self) {
        self.write_cache().clear();
    }

    fn load_from_disk(&self, audience: Audience, flow_id: &str) -> Option<FlowDefinition> {
        let path = self.root.join(audience.as_str()).join(format!("{flow_id}.json"));
        let raw = std::fs::read_to_string(path).ok()?;
        let flow = FlowDefinition::from_json(&raw).ok()?;
        // A document under the wrong audience directory is treated as absent.
        if flow.audience != audience || flow.id != flow_id {
            return None;
        }
        Some(flow)
    }

    fn read_cache(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<(Audience, String), Arc<FlowDefinition>>> {
        match self.cache.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_cache(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<(Audience, String), Arc<FlowDefinition>>> {
        match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
