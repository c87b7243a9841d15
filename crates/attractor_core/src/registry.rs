//! Explicit handles for systems owned by a control layer.
//!
//! The "currently active" system lives here as a plain id so diagnostics can
//! look it up without any shared global state.

use crate::error::ChaosError;
use crate::systems::BoxedSystem;
use crate::traits::ChaoticSystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SystemId(u32);

impl SystemId {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
pub struct SystemRegistry {
    systems: BTreeMap<SystemId, BoxedSystem>,
    next_id: u32,
    active: Option<SystemId>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, system: BoxedSystem) -> SystemId {
        let id = SystemId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        debug!(%id, kind = %system.kind(), "registered system");
        self.systems.insert(id, system);
        id
    }

    pub fn get(&self, id: SystemId) -> Result<&dyn ChaoticSystem, ChaosError> {
        self.systems
            .get(&id)
            .map(|system| &**system)
            .ok_or(ChaosError::UnknownSystem(id))
    }

    pub fn get_mut(&mut self, id: SystemId) -> Result<&mut BoxedSystem, ChaosError> {
        self.systems
            .get_mut(&id)
            .ok_or(ChaosError::UnknownSystem(id))
    }

    /// Removes a system, clearing the active handle if it pointed at it.
    pub fn remove(&mut self, id: SystemId) -> Result<BoxedSystem, ChaosError> {
        let system = self
            .systems
            .remove(&id)
            .ok_or(ChaosError::UnknownSystem(id))?;
        if self.active == Some(id) {
            self.active = None;
        }
        debug!(%id, "removed system");
        Ok(system)
    }

    pub fn set_active(&mut self, id: SystemId) -> Result<(), ChaosError> {
        if !self.systems.contains_key(&id) {
            return Err(ChaosError::UnknownSystem(id));
        }
        debug!(%id, "active system changed");
        self.active = Some(id);
        Ok(())
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    pub fn active_id(&self) -> Option<SystemId> {
        self.active
    }

    pub fn active(&self) -> Option<&dyn ChaoticSystem> {
        self.active.and_then(|id| self.get(id).ok())
    }

    pub fn active_mut(&mut self) -> Option<&mut BoxedSystem> {
        let id = self.active?;
        self.systems.get_mut(&id)
    }

    /// Steps every registered system once, in id order.
    pub fn step_all(&mut self, speed: f64) {
        for system in self.systems.values_mut() {
            system.step(speed);
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = SystemId> + '_ {
        self.systems.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
