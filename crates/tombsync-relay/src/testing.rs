//! In-memory object store used by the relay's tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tombsync_core::config::TargetConfig;
use tombsync_store::{ObjectStore, StoreError, StoreResult};

use crate::registry::TargetRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCall {
    pub bucket: String,
    pub key: String,
    pub version_id: Option<String>,
}

/// Records every delete; optionally fails all of them or holds each one
/// until a gate is opened
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<DeleteCall>>,
    failure: Option<StoreError>,
    gate: Option<Arc<Notify>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: StoreError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Deletes wait for `gate` to be notified before completing
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<DeleteCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> StoreResult<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.calls.lock().unwrap().push(DeleteCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            version_id: version_id.map(String::from),
        });

        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Registry whose targets are backed by the given stores, in order
pub fn registry_of(stores: &[Arc<RecordingStore>]) -> TargetRegistry {
    // Zero-padded so name order matches store order
    let targets = (0..stores.len())
        .map(|i| {
            (
                format!("site{:03}", i),
                TargetConfig {
                    endpoint: format!("http://site{:03}.example.com:9000", i),
                    access_key: "ak".into(),
                    secret_key: "sk".into(),
                    insecure: None,
                    region: None,
                },
            )
        })
        .collect();

    let mut next = stores.iter();
    TargetRegistry::build_with(&targets, false, |_| {
        let store = next.next().expect("one store per target").clone();
        Ok(store as Arc<dyn ObjectStore>)
    })
    .unwrap()
}

mod tests {
    use super::*;

    #[test]
    fn test_registry_of_keeps_store_order() {
        let stores: Vec<_> = (0..12).map(|_| Arc::new(RecordingStore::new())).collect();
        let registry = registry_of(&stores);

        for (i, (registered, store)) in registry.iter().zip(&stores).enumerate() {
            assert_eq!(registered.target.name, format!("site{:03}", i));
            assert_eq!(
                Arc::as_ptr(&registered.store) as *const (),
                Arc::as_ptr(store) as *const ()
            );
        }
    }
}
