//! Flock ownership: one shared configuration, one membership roster
//!
//! The registry owns the [`FlockConfig`] behind an `Arc<RwLock>`; members
//! hold [`FlockHandle`] weak references, so the configuration always
//! outlives every agent that can still reach it.

use std::sync::{Arc, Weak};

use hashbrown::HashSet;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::flock::boid::BoidId;
use crate::flock::config::{ConfigError, FlockConfig};

/// Weak reference an agent keeps to its flock's configuration
pub type FlockHandle = Weak<RwLock<FlockConfig>>;

/// Owns a flock's configuration and tracks its current members
#[derive(Debug)]
pub struct FlockRegistry {
    config: Arc<RwLock<FlockConfig>>,
    members: HashSet<BoidId>,
}

impl FlockRegistry {
    /// Create a registry around a validated configuration
    pub fn new(config: FlockConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            members: HashSet::new(),
        })
    }

    /// Weak configuration handle for a member agent
    pub fn handle(&self) -> FlockHandle {
        Arc::downgrade(&self.config)
    }

    /// Read access to the current configuration
    pub fn read_config(&self) -> RwLockReadGuard<'_, FlockConfig> {
        self.config.read()
    }

    /// Mutate the configuration in place (the between-tick settings surface)
    ///
    /// Callers are responsible for keeping the values valid; use
    /// [`FlockRegistry::set_config`] for a validated replacement.
    pub fn update_config(&self, mutate: impl FnOnce(&mut FlockConfig)) {
        mutate(&mut self.config.write());
    }

    /// Replace the configuration wholesale after validating it
    pub fn set_config(&self, config: FlockConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.config.write() = config;
        Ok(())
    }

    /// Register a member; returns false if it was already present
    pub fn add_member(&mut self, id: BoidId) -> bool {
        self.members.insert(id)
    }

    /// Deregister a member; returns false if it was not present
    pub fn remove_member(&mut self, id: BoidId) -> bool {
        self.members.remove(&id)
    }

    pub fn contains(&self, id: BoidId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = BoidId> + '_ {
        self.members.iter().copied()
    }
}
