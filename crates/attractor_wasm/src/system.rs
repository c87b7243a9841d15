//! Single-system wrapper and the flattening helpers shared with the registry.

use anyhow::{bail, Context};
use attractor_core::config::EngineSettings;
use attractor_core::systems::{build_system_with, BoxedSystem, SystemKind, SystemSnapshot};
use attractor_core::{Point2, Point3};
use serde_wasm_bindgen::{from_value, to_value};
use std::collections::VecDeque;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmAttractor {
    pub(crate) inner: BoxedSystem,
}

/// Builds a boxed system from loosely typed JS arguments. An empty
/// `initial_state` keeps the canonical starting point.
pub(crate) fn build_attractor(
    kind: &str,
    settings: Option<EngineSettings>,
    initial_state: &[f64],
    param_names: &[String],
    params: &[f64],
) -> anyhow::Result<BoxedSystem> {
    let kind: SystemKind = kind.parse()?;
    if param_names.len() != params.len() {
        bail!(
            "Expected {} parameter values, got {}.",
            param_names.len(),
            params.len()
        );
    }

    let mut system = build_system_with(kind, settings.unwrap_or_else(|| kind.default_settings()));
    for (name, value) in param_names.iter().zip(params) {
        system
            .update_param(name, *value)
            .with_context(|| format!("Failed to configure {kind}"))?;
    }

    // Reset after the parameters land so the first trail point reflects them.
    let state = if initial_state.is_empty() {
        system.state().to_vec()
    } else {
        initial_state.to_vec()
    };
    system
        .reset_state(&state)
        .with_context(|| format!("Invalid initial state for {kind}"))?;
    Ok(system)
}

pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

pub(crate) fn flatten_points3(points: &VecDeque<Point3<f64>>) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}

pub(crate) fn flatten_points2(points: &VecDeque<Point2<f64>>) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

pub(crate) fn point_vec(point: Point3<f64>) -> Vec<f64> {
    vec![point.x, point.y, point.z]
}

#[wasm_bindgen]
impl WasmAttractor {
    #[wasm_bindgen(constructor)]
    pub fn new(
        kind: &str,
        initial_state: Vec<f64>,
        param_names: Vec<String>,
        params: Vec<f64>,
    ) -> Result<WasmAttractor, JsValue> {
        console_error_panic_hook::set_once();

        let inner = build_attractor(kind, None, &initial_state, &param_names, &params)
            .map_err(to_js_error)?;
        Ok(WasmAttractor { inner })
    }

    /// Same as the constructor but with explicit engine settings, given as a
    /// plain object with any subset of the `EngineSettings` fields.
    pub fn with_settings(
        kind: &str,
        settings: JsValue,
        initial_state: Vec<f64>,
    ) -> Result<WasmAttractor, JsValue> {
        console_error_panic_hook::set_once();

        let settings: EngineSettings = from_value(settings)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?;
        let inner = build_attractor(kind, Some(settings), &initial_state, &[], &[])
            .map_err(to_js_error)?;
        Ok(WasmAttractor { inner })
    }

    pub fn kind(&self) -> String {
        self.inner.kind().to_string()
    }

    /// Advances one frame and returns the new [x, y, z] position.
    pub fn step(&mut self, speed: f64) -> Vec<f64> {
        point_vec(self.inner.step(speed))
    }

    /// Advances `count` frames, returning the final position.
    pub fn step_many(&mut self, speed: f64, count: u32) -> Vec<f64> {
        for _ in 0..count {
            self.inner.step(speed);
        }
        point_vec(self.inner.position())
    }

    pub fn reset(&mut self, initial_state: Vec<f64>) -> Result<(), JsValue> {
        self.inner
            .reset_state(&initial_state)
            .map_err(|e| to_js_error(e.into()))
    }

    pub fn update_params(&mut self, names: Vec<String>, values: Vec<f64>) -> Result<(), JsValue> {
        if names.len() != values.len() {
            return Err(JsValue::from_str(
                "Parameter names and values must have the same length.",
            ));
        }
        for (name, value) in names.iter().zip(values) {
            self.inner
                .update_param(name, value)
                .map_err(|e| to_js_error(e.into()))?;
        }
        Ok(())
    }

    pub fn trim_trail(&mut self, max_len: usize) {
        self.inner.trim_trail(max_len);
    }

    pub fn perturb(&mut self, amount: f64) {
        self.inner.perturb(amount);
    }

    pub fn get_speed(&self) -> f64 {
        self.inner.speed()
    }

    pub fn get_state(&self) -> Vec<f64> {
        self.inner.state().to_vec()
    }

    pub fn get_params(&self) -> Vec<f64> {
        self.inner.param_values()
    }

    pub fn get_param_names(&self) -> Vec<String> {
        self.inner
            .param_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn get_position(&self) -> Vec<f64> {
        point_vec(self.inner.position())
    }

    /// Trail as a flat [x0, y0, z0, x1, ...] buffer, oldest first.
    pub fn trail(&self) -> Vec<f64> {
        flatten_points3(self.inner.trail())
    }

    pub fn trail_len(&self) -> usize {
        self.inner.trail().len()
    }

    pub fn lyapunov_exponent(&self) -> f64 {
        self.inner.lyapunov_exponent()
    }

    /// Section points as a flat [u0, v0, u1, v1, ...] buffer.
    pub fn poincare_points(&self) -> Vec<f64> {
        flatten_points2(self.inner.poincare_points())
    }

    /// Pendulum joints as [p1x, p1y, p2x, p2y] per frame; empty for other
    /// systems.
    pub fn joints(&self) -> Vec<f64> {
        self.inner
            .joints()
            .map(|joints| {
                joints
                    .iter()
                    .flat_map(|j| [j.p1.x, j.p1.y, j.p2.x, j.p2.y])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn recoveries(&self) -> f64 {
        self.inner.recoveries() as f64
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let snapshot = SystemSnapshot::capture(&*self.inner);
        to_value(&snapshot).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
