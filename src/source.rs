//! Excitation source for the TMz solver.
//!
//! Periodic waveforms (sinusoid, square, sawtooth) are driven by a phase
//! accumulator that the solver advances once per timestep, after the
//! sample has been injected. The Ricker pulse is indexed directly by the
//! update counter and repeats with period 2*q_d.

use wasm_bindgen::prelude::*;

use crate::constants::{COURANT_FACTOR, TWO_PI, VACUUM_PERMEABILITY, VACUUM_VELOCITY};

/// Excitation waveform selector.
#[wasm_bindgen]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Source disabled; the injection step is skipped entirely
    NoSource,
    /// Pure sinusoid amp * sin(theta)
    Monochromatic,
    /// Mexican-hat pulse centered q_d steps into each period
    RickerPulse,
    /// Band-limited square wave (first four odd harmonics)
    SquareWave,
    /// Band-limited sawtooth (first five harmonics)
    Sawtooth,
}

/// Point excitation state.
///
/// Position is in world coordinates; the solver rounds it onto the grid
/// at injection time. `ppw` (points per wavelength) sets both the phase
/// increment of the periodic forms and the width of the Ricker pulse.
pub struct Source {
    pub kind: SourceKind,
    pub additive: bool,
    pub x: f64,
    pub y: f64,
    pub amp: f64,
    pub ppw: f64,
    pub delay_multiplier: f64,
    theta: f64,
    radians_per_timestep: f64,
}

impl Source {
    pub fn new_default() -> Source {
        let mut s = Source {
            kind: SourceKind::Monochromatic,
            additive: false,
            x: 0.05,
            y: 0.05,
            amp: 1.0,
            ppw: 30.0,
            delay_multiplier: 2.0,
            theta: 0.0,
            radians_per_timestep: 0.0,
        };
        s.set_ppw(30.0);
        s
    }

    pub fn set_ppw(&mut self, ppw: f64) {
        self.ppw = ppw;
        self.radians_per_timestep = TWO_PI * COURANT_FACTOR / ppw;
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn radians_per_timestep(&self) -> f64 {
        self.radians_per_timestep
    }

    /// Advance the phase accumulator by one timestep. The solver calls
    /// this after the source sample has been injected, never before.
    pub fn advance_theta(&mut self) {
        self.theta += self.radians_per_timestep;
    }

    pub fn reset_theta(&mut self) {
        self.theta = 0.0;
    }

    fn sinusoidal(&self) -> f64 {
        self.amp * self.theta.sin()
    }

    /// Fourier square wave: amp * (4/pi) * sum over k in {1,3,5,7} of
    /// sin(k*theta)/k.
    fn square_wave(&self) -> f64 {
        let mut s = 0.0;
        for k in [1.0_f64, 3.0, 5.0, 7.0] {
            s += (k * self.theta).sin() / k;
        }
        self.amp * (4.0 / std::f64::consts::PI) * s
    }

    /// Fourier sawtooth: amp * (2/pi) * sum over k in 1..=5 of
    /// (-1)^(k+1) * sin(k*theta)/k.
    fn sawtooth(&self) -> f64 {
        let mut s = 0.0;
        let mut sign = 1.0;
        for k in 1..=5 {
            s += sign * (k as f64 * self.theta).sin() / k as f64;
            sign = -sign;
        }
        self.amp * (2.0 / std::f64::consts::PI) * s
    }

    /// Ricker wavelet evaluated at update count q. The delay q_d places
    /// the peak; wrapping at 2*q_d makes the pulse train periodic.
    fn ricker(&self, q: u64) -> f64 {
        let qd = ((self.delay_multiplier * self.ppw / COURANT_FACTOR) as u64).max(1);
        let qeff = q % (2 * qd);
        let eta =
            std::f64::consts::PI * COURANT_FACTOR * (qeff as f64 - qd as f64) / self.ppw;
        self.amp * (-eta * eta).exp() * (1.0 - 2.0 * eta * eta)
    }

    /// Number of steps from period start to the Ricker peak.
    pub fn ricker_delay(&self) -> u64 {
        ((self.delay_multiplier * self.ppw / COURANT_FACTOR) as u64).max(1)
    }

    /// Current source sample for update count q.
    pub fn get(&self, q: u64) -> f64 {
        match self.kind {
            SourceKind::NoSource => 0.0,
            SourceKind::Monochromatic => self.sinusoidal(),
            SourceKind::RickerPulse => self.ricker(q),
            SourceKind::SquareWave => self.square_wave(),
            SourceKind::Sawtooth => self.sawtooth(),
        }
    }

    /// sigma * delta achieving a skin depth of `lhat` space steps at the
    /// source wavelength: 1 / (lhat^2 * mu_0 * mu_r * pi * c / ppw).
    pub fn sigma_delta(&self, lhat: f64, mu_r: f64) -> f64 {
        let recip = lhat * lhat * VACUUM_PERMEABILITY * mu_r * std::f64::consts::PI
            * VACUUM_VELOCITY
            / self.ppw;
        1.0 / recip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_source_state() {
        let s = Source::new_default();
        assert_eq!(s.kind, SourceKind::Monochromatic);
        assert!(!s.additive);
        assert_eq!(s.x, 0.05);
        assert_eq!(s.y, 0.05);
        assert_eq!(s.amp, 1.0);
        assert_eq!(s.ppw, 30.0);
        assert_eq!(s.delay_multiplier, 2.0);
        assert_eq!(s.theta(), 0.0);
    }

    #[test]
    fn phase_increment_follows_ppw() {
        let mut s = Source::new_default();
        s.set_ppw(20.0);
        let expect = TWO_PI * COURANT_FACTOR / 20.0;
        assert!((s.radians_per_timestep() - expect).abs() < 1e-15);

        // Accumulated phase after n advances is n * dtheta.
        let n = 1000;
        for _ in 0..n {
            s.advance_theta();
        }
        assert!((s.theta() - n as f64 * expect).abs() <= 1e-10);
    }

    #[test]
    fn monochromatic_sample_is_amp_sin_theta() {
        let mut s = Source::new_default();
        s.amp = 2.5;
        for q in 0..50 {
            let expect = 2.5 * (q as f64 * s.radians_per_timestep()).sin();
            assert!((s.get(q) - expect).abs() < 1e-12);
            s.advance_theta();
        }
    }

    #[test]
    fn ricker_peaks_at_delay() {
        let s = {
            let mut s = Source::new_default();
            s.kind = SourceKind::RickerPulse;
            s
        };
        // ppw = 30, d = 2: q_d = floor(60 / S) = 84.
        let qd = s.ricker_delay();
        assert_eq!(qd, 84);
        assert!((s.get(qd) - 1.0).abs() < 1e-15);
        // Strictly below the peak elsewhere in the period.
        assert!(s.get(qd + 10) < 1.0);
        assert!(s.get(qd - 10) < 1.0);
    }

    #[test]
    fn ricker_is_periodic_in_update_count() {
        let mut s = Source::new_default();
        s.kind = SourceKind::RickerPulse;
        let period = 2 * s.ricker_delay();
        for q in 0..20 {
            assert_eq!(s.get(q), s.get(q + period));
        }
    }

    #[test]
    fn square_and_sawtooth_are_odd_harmonic_sums() {
        let mut s = Source::new_default();
        s.amp = 1.0;
        // Drive theta to pi/2 directly through advances of a known size.
        s.set_ppw(30.0);
        let steps = 100;
        for _ in 0..steps {
            s.advance_theta();
        }
        let th = steps as f64 * s.radians_per_timestep();

        s.kind = SourceKind::SquareWave;
        let mut expect = 0.0;
        for k in [1.0_f64, 3.0, 5.0, 7.0] {
            expect += (k * th).sin() / k;
        }
        expect *= 4.0 / std::f64::consts::PI;
        assert!((s.get(0) - expect).abs() < 1e-12);

        s.kind = SourceKind::Sawtooth;
        let mut expect = 0.0;
        for k in 1..=5 {
            let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
            expect += sign * (k as f64 * th).sin() / k as f64;
        }
        expect *= 2.0 / std::f64::consts::PI;
        assert!((s.get(0) - expect).abs() < 1e-12);
    }

    #[test]
    fn sigma_delta_inverts_skin_depth_expression() {
        let s = Source::new_default();
        let lhat = 10.0;
        let mu_r = 1.0;
        let sd = s.sigma_delta(lhat, mu_r);
        let recomputed =
            1.0 / (lhat * lhat * VACUUM_PERMEABILITY * mu_r * std::f64::consts::PI
                * VACUUM_VELOCITY
                / s.ppw);
        assert!((sd - recomputed).abs() <= 1e-18);
        assert!(sd > 0.0);
    }

    #[test]
    fn no_source_sample_is_zero() {
        let mut s = Source::new_default();
        s.kind = SourceKind::NoSource;
        assert_eq!(s.get(123), 0.0);
    }
}
