//! Physiotherapist registry
//!
//! In-memory roster loaded from configuration. The ledger and the upload
//! orchestrator both resolve payees through this registry.

use crate::config::PhysiotherapistConfig;
use fisiopay_domain::Physiotherapist;
use std::sync::RwLock;

/// Registry of known physiotherapists
pub struct PhysiotherapistRegistry {
    physiotherapists: RwLock<Vec<Physiotherapist>>,
}

impl PhysiotherapistRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            physiotherapists: RwLock::new(Vec::new()),
        }
    }

    /// Create a registry from configuration entries
    pub fn from_config(configs: &[PhysiotherapistConfig]) -> Self {
        let physiotherapists = configs.iter().map(|c| c.to_physiotherapist()).collect();
        Self {
            physiotherapists: RwLock::new(physiotherapists),
        }
    }

    /// Register a physiotherapist, replacing any existing entry with the
    /// same id
    pub fn register(&self, physiotherapist: Physiotherapist) {
        let mut physios = self.physiotherapists.write().unwrap();
        physios.retain(|p| p.id != physiotherapist.id);
        physios.push(physiotherapist);
    }

    /// Look up a physiotherapist by id
    pub fn get(&self, id: u32) -> Option<Physiotherapist> {
        self.physiotherapists
            .read()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// All active physiotherapists
    pub fn active(&self) -> Vec<Physiotherapist> {
        self.physiotherapists
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.active)
            .cloned()
            .collect()
    }

    /// Total number of registered physiotherapists
    pub fn count(&self) -> usize {
        self.physiotherapists.read().unwrap().len()
    }
}

impl Default for PhysiotherapistRegistry {
    fn default() -> Self {
        Self::new()
    }
}
