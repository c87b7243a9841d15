//! Multi-system handle table for side-by-side runs.

use crate::system::{build_attractor, flatten_points2, flatten_points3, point_vec, to_js_error};
use attractor_core::registry::{SystemId, SystemRegistry};
use attractor_core::systems::SystemSnapshot;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
#[derive(Default)]
pub struct WasmRegistry {
    registry: SystemRegistry,
}

#[wasm_bindgen]
impl WasmRegistry {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmRegistry {
        console_error_panic_hook::set_once();
        WasmRegistry::default()
    }

    /// Builds a system and returns its handle. The first system created
    /// becomes active.
    pub fn create(
        &mut self,
        kind: &str,
        initial_state: Vec<f64>,
        param_names: Vec<String>,
        params: Vec<f64>,
    ) -> Result<u32, JsValue> {
        let system = build_attractor(kind, None, &initial_state, &param_names, &params)
            .map_err(to_js_error)?;
        let id = self.registry.insert(system);
        if self.registry.active_id().is_none() {
            self.registry
                .set_active(id)
                .map_err(|e| to_js_error(e.into()))?;
        }
        Ok(id.raw())
    }

    pub fn remove(&mut self, id: u32) -> Result<(), JsValue> {
        self.registry
            .remove(SystemId::from_raw(id))
            .map(|_| ())
            .map_err(|e| to_js_error(e.into()))
    }

    pub fn set_active(&mut self, id: u32) -> Result<(), JsValue> {
        self.registry
            .set_active(SystemId::from_raw(id))
            .map_err(|e| to_js_error(e.into()))
    }

    pub fn clear_active(&mut self) {
        self.registry.clear_active();
    }

    pub fn active_id(&self) -> Option<u32> {
        self.registry.active_id().map(SystemId::raw)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.registry.ids().map(SystemId::raw).collect()
    }

    pub fn step_all(&mut self, speed: f64) {
        self.registry.step_all(speed);
    }

    pub fn step(&mut self, id: u32, speed: f64) -> Result<Vec<f64>, JsValue> {
        let system = self
            .registry
            .get_mut(SystemId::from_raw(id))
            .map_err(|e| to_js_error(e.into()))?;
        Ok(point_vec(system.step(speed)))
    }

    pub fn perturb(&mut self, id: u32, amount: f64) -> Result<(), JsValue> {
        let system = self
            .registry
            .get_mut(SystemId::from_raw(id))
            .map_err(|e| to_js_error(e.into()))?;
        system.perturb(amount);
        Ok(())
    }

    pub fn trail(&self, id: u32) -> Result<Vec<f64>, JsValue> {
        let system = self
            .registry
            .get(SystemId::from_raw(id))
            .map_err(|e| to_js_error(e.into()))?;
        Ok(flatten_points3(system.trail()))
    }

    pub fn poincare_points(&self, id: u32) -> Result<Vec<f64>, JsValue> {
        let system = self
            .registry
            .get(SystemId::from_raw(id))
            .map_err(|e| to_js_error(e.into()))?;
        Ok(flatten_points2(system.poincare_points()))
    }

    pub fn state(&self, id: u32) -> Result<Vec<f64>, JsValue> {
        let system = self
            .registry
            .get(SystemId::from_raw(id))
            .map_err(|e| to_js_error(e.into()))?;
        Ok(system.state().to_vec())
    }

    /// Exponent of the active system, `None` when nothing is active.
    pub fn active_lyapunov_exponent(&self) -> Option<f64> {
        self.registry
            .active()
            .map(|system| system.lyapunov_exponent())
    }

    pub fn active_snapshot(&self) -> Result<JsValue, JsValue> {
        let system = self
            .registry
            .active()
            .ok_or_else(|| JsValue::from_str("No active system."))?;
        to_value(&SystemSnapshot::capture(system))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::WasmRegistry;

    #[test]
    fn first_system_becomes_active() {
        let mut registry = WasmRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.active_lyapunov_exponent().is_none());

        let a = registry
            .create("lorenz", vec![], vec![], vec![])
            .expect("valid");
        let b = registry
            .create("rossler", vec![], vec![], vec![])
            .expect("valid");
        assert_ne!(a, b);
        assert_eq!(registry.active_id(), Some(a));
        assert_eq!(registry.ids(), vec![a, b]);

        registry.set_active(b).expect("registered");
        assert_eq!(registry.active_id(), Some(b));
    }

    #[test]
    fn step_all_advances_every_system() {
        let mut registry = WasmRegistry::new();
        let a = registry
            .create("lorenz", vec![], vec![], vec![])
            .expect("valid");
        let b = registry
            .create("double_pendulum", vec![], vec![], vec![])
            .expect("valid");
        for _ in 0..200 {
            registry.step_all(1.0);
        }
        assert_eq!(registry.trail(a).expect("registered").len(), 201 * 3);
        assert_eq!(registry.trail(b).expect("registered").len(), 201 * 3);
        assert_eq!(registry.state(b).expect("registered").len(), 4);
        assert!(registry
            .active_lyapunov_exponent()
            .is_some_and(|value| value.is_finite()));
    }

    #[test]
    fn removing_the_active_system_clears_it() {
        let mut registry = WasmRegistry::new();
        let id = registry
            .create("lorenz", vec![], vec![], vec![])
            .expect("valid");
        registry.step(id, 1.0).expect("registered");
        registry.remove(id).expect("registered");
        assert!(registry.active_id().is_none());
        assert!(registry.is_empty());
    }
}
