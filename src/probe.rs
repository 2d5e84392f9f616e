//! Field measurement: a world-coordinate Ez trace and its wavelength
//! spectrum.
//!
//! A `FieldProbe` sits at a world position like the excitation source
//! does, and records one bilinear Ez sample per call through
//! `Solver::probe_ez`. The `SpectrumAnalyzer` turns such a trace into a
//! calibrated magnitude spectrum and recovers the dominant wavelength in
//! points per wavelength via f = S / ppw, skipping the DC bin that a
//! hard source leaves in the trace.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use wasm_bindgen::prelude::*;

use crate::constants::COURANT_FACTOR;
use crate::solver::Solver;

/// Magnitudes below this are f64 rounding residue for O(1) Ez traces;
/// they are pinned to `DB_FLOOR` instead of entering log10.
const MAG_FLOOR: f64 = 1.0e-15;
const DB_FLOOR: f64 = -300.0;

/// Ez trace recorder at a fixed world position.
///
/// The trace is a fixed-capacity ring that reports how much of it is
/// actually filled, so a freshly placed probe never mixes real samples
/// with stale zeros.
#[wasm_bindgen]
pub struct FieldProbe {
    x: f64,
    y: f64,
    samples: Vec<f64>,
    head: usize,
    len: usize,
}

#[wasm_bindgen]
impl FieldProbe {
    #[wasm_bindgen(constructor)]
    pub fn new(x: f64, y: f64, capacity: usize) -> FieldProbe {
        FieldProbe {
            x,
            y,
            samples: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Move the probe; the trace belongs to the old position and is
    /// discarded.
    pub fn place(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.clear();
    }

    /// Record the interpolated Ez under the probe, typically once per
    /// solver step.
    pub fn record(&mut self, solver: &Solver) {
        self.push(solver.probe_ez(self.x, self.y));
    }

    /// Append one sample, evicting the oldest once the ring is full.
    pub fn push(&mut self, sample: f64) {
        let cap = self.samples.len();
        self.samples[self.head] = sample;
        self.head = (self.head + 1) % cap;
        if self.len < cap {
            self.len += 1;
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.samples.len()
    }

    /// Most recent sample; 0 while the trace is empty.
    pub fn latest(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        let cap = self.samples.len();
        self.samples[(self.head + cap - 1) % cap]
    }

    /// The recorded samples in time order, oldest first. Only the filled
    /// part of the ring is returned.
    pub fn trace(&self) -> Vec<f64> {
        let cap = self.samples.len();
        let start = (self.head + cap - self.len) % cap;
        (0..self.len)
            .map(|i| self.samples[(start + i) % cap])
            .collect()
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.head = 0;
        self.len = 0;
    }
}

/// Wavelength analyzer for probe traces.
///
/// Hann-windowed forward FFT, with magnitudes normalized by the window's
/// coherent gain so a unit-amplitude sinusoid reads 0 dB at its bin.
#[wasm_bindgen]
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    coherent_gain: f64,
    scratch: Vec<Complex<f64>>,
    spectrum: Vec<f64>,
}

#[wasm_bindgen]
impl SpectrumAnalyzer {
    /// `size` is rounded up to a power of two, at least 8.
    #[wasm_bindgen(constructor)]
    pub fn new(size: usize) -> SpectrumAnalyzer {
        let size = size.max(8).next_power_of_two();

        let window: Vec<f64> = (0..size)
            .map(|i| {
                let s = (std::f64::consts::PI * i as f64 / (size - 1) as f64).sin();
                s * s
            })
            .collect();
        // A windowed unit sinusoid lands at its bin with magnitude
        // sum(w) / 2; dividing by that calibrates the spectrum.
        let coherent_gain = window.iter().sum::<f64>() / 2.0;

        let fft = FftPlanner::<f64>::new().plan_fft_forward(size);

        SpectrumAnalyzer {
            fft,
            window,
            coherent_gain,
            scratch: vec![Complex::new(0.0, 0.0); size],
            spectrum: vec![DB_FLOOR; size / 2],
        }
    }

    pub fn size(&self) -> usize {
        self.window.len()
    }

    pub fn spectrum_size(&self) -> usize {
        self.spectrum.len()
    }

    /// Calibrated magnitude spectrum in dB. Input shorter than the FFT
    /// size is zero-padded, longer input is truncated.
    pub fn compute(&mut self, samples: &[f64]) -> Vec<f64> {
        self.scratch.fill(Complex::new(0.0, 0.0));
        for (slot, (&s, &w)) in self
            .scratch
            .iter_mut()
            .zip(samples.iter().zip(self.window.iter()))
        {
            *slot = Complex::new(s * w, 0.0);
        }

        self.fft.process(&mut self.scratch);

        for (bin, out) in self.spectrum.iter_mut().enumerate() {
            let amplitude = self.scratch[bin].norm() / self.coherent_gain;
            *out = if amplitude > MAG_FLOOR {
                20.0 * amplitude.log10()
            } else {
                DB_FLOOR
            };
        }

        self.spectrum.clone()
    }

    pub fn spectrum_ptr(&self) -> *const f64 {
        self.spectrum.as_ptr()
    }

    /// Strongest bin of the last computed spectrum outside the DC main
    /// lobe. A hard source biases the trace, and under the Hann window
    /// that offset spreads across bins 0 and 1, so the scan starts at
    /// bin 2.
    pub fn peak_bin(&self) -> usize {
        let mut best = 2;
        for bin in 3..self.spectrum.len() {
            if self.spectrum[bin] > self.spectrum[best] {
                best = bin;
            }
        }
        best
    }

    /// Normalized frequency (cycles per step) of a bin.
    pub fn bin_to_frequency(&self, bin: usize) -> f64 {
        bin as f64 / self.window.len() as f64
    }

    /// Points-per-wavelength implied by a bin, via f = S / ppw. Bin 0
    /// (DC) has no wavelength; returns 0.
    pub fn bin_to_ppw(&self, bin: usize) -> f64 {
        let f = self.bin_to_frequency(bin);
        if f <= 0.0 {
            return 0.0;
        }
        COURANT_FACTOR / f
    }

    /// One-shot wavelength estimate of a trace, in points per
    /// wavelength.
    pub fn dominant_ppw(&mut self, samples: &[f64]) -> f64 {
        self.compute(samples);
        self.bin_to_ppw(self.peak_bin())
    }
}
