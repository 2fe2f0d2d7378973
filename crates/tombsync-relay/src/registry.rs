//! Target Registry
//!
//! The set of remote sites, validated and connected once at startup. After
//! [`TargetRegistry::build`] returns, the registry is only ever read, so it
//! is shared between requests behind an `Arc` without locking.

use std::collections::BTreeMap;
use std::sync::Arc;

use tombsync_core::config::{ClientConfig, TargetConfig};
use tombsync_core::types::RemoteTarget;
use tombsync_core::{Error, Result};
use tombsync_store::{ClientOptions, ObjectStore, S3Client};
use tracing::info;

/// A remote site together with its client handle
#[derive(Clone)]
pub struct RegisteredTarget {
    pub target: RemoteTarget,
    pub store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for RegisteredTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTarget")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Immutable collection of remote sites
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    targets: Vec<RegisteredTarget>,
}

impl TargetRegistry {
    /// Validate every configured site and connect an [`S3Client`] to it
    pub fn build(
        targets: &BTreeMap<String, TargetConfig>,
        default_insecure: bool,
        client: &ClientConfig,
    ) -> Result<Self> {
        let options = ClientOptions::from(client);

        Self::build_with(targets, default_insecure, |target| {
            let store = S3Client::new(target.clone(), options.clone()).map_err(|e| {
                Error::ClientSetup {
                    target: target.name.clone(),
                    reason: e.to_string(),
                }
            })?;
            Ok(Arc::new(store) as Arc<dyn ObjectStore>)
        })
    }

    /// Like [`build`](Self::build) with a caller-supplied connector
    pub fn build_with<F>(
        targets: &BTreeMap<String, TargetConfig>,
        default_insecure: bool,
        mut connect: F,
    ) -> Result<Self>
    where
        F: FnMut(&RemoteTarget) -> Result<Arc<dyn ObjectStore>>,
    {
        if targets.is_empty() {
            return Err(Error::NoTargets);
        }

        let mut registered = Vec::with_capacity(targets.len());
        for (name, config) in targets {
            let target = RemoteTarget::from_config(name, config, default_insecure)?;
            let store = connect(&target)?;

            info!(
                name = %target.name,
                host = %target.host(),
                insecure = target.insecure_tls,
                "Configured remote site"
            );

            registered.push(RegisteredTarget { target, store });
        }

        Ok(Self {
            targets: registered,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.target.name.as_str()).collect()
    }
}
