//! wavelab-core - 2D TMz FDTD electromagnetic wave solver.
//!
//! Simulates the transverse-magnetic mode of Maxwell's equations (Ez, Hx,
//! Hy) on a uniform Yee grid: leapfrog stepping in a homogeneous lossy
//! medium, periodic / second-order Mur absorbing / PEC boundaries per
//! axis, hard or additive excitation sources, separable halfband
//! smoothing, and color-mapped rasterization of the Ez field.
//!
//! Compiled to WebAssembly for browser-based simulation; the same types
//! back the native test build.

mod boundary;
mod colormap;
mod constants;
mod halfband;
mod probe;
mod solver;
mod source;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub use boundary::MurBoundary;
pub use colormap::{rgb_f_jet, rgb_f_viridis, rgb_i_jet, rgb_i_viridis, rgb_value, rgba_value};
pub use constants::{
    COURANT_FACTOR, TWO_PI, VACUUM_IMPEDANCE, VACUUM_PERMEABILITY, VACUUM_PERMITTIVITY,
    VACUUM_VELOCITY,
};
pub use halfband::HalfbandFilter;
pub use probe::{FieldProbe, SpectrumAnalyzer};
pub use solver::Solver;
pub use source::{Source, SourceKind};

/// Initialize the Wasm module (called once at startup).
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    web_sys::console::log_1(&JsValue::from_str(&format!(
        "wavelab-core {} ready",
        env!("CARGO_PKG_VERSION")
    )));
}

/// Library version string.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// The module's linear memory, typed, so the host can build
/// Float64Array/Uint32Array views over field and image buffers without
/// copying.
#[wasm_bindgen]
pub fn wasm_memory() -> js_sys::WebAssembly::Memory {
    wasm_bindgen::memory().unchecked_into::<js_sys::WebAssembly::Memory>()
}
