//! WebAssembly bindings for the attractor engine.
//!
//! `WasmAttractor` wraps a single system; `WasmRegistry` owns several behind
//! numeric handles so a page can run side-by-side comparisons.

mod registry;
mod system;

pub use registry::WasmRegistry;
pub use system::WasmAttractor;

