//! 2D TMz FDTD solver.
//!
//! Staggered Yee grid with Ez at cell nodes, Hx shifted half a cell in y,
//! Hy half a cell in x. Flat row-major f64 arrays, stride NX along x.
//! One `step()` advances the field by dt = delta * S / c: H update, E
//! interior update, per-axis boundary resolution, source injection, phase
//! advance.

use wasm_bindgen::prelude::*;

use crate::boundary::MurBoundary;
use crate::colormap;
use crate::constants::{
    COURANT_FACTOR, VACUUM_IMPEDANCE, VACUUM_PERMEABILITY, VACUUM_PERMITTIVITY,
    VACUUM_VELOCITY,
};
use crate::halfband::HalfbandFilter;
use crate::source::{Source, SourceKind};

/// FDTD solver instance owning the grid, fields, update coefficients,
/// boundary state, excitation source, and smoothing filter.
#[wasm_bindgen]
pub struct Solver {
    nx: usize,
    ny: usize,

    xmin: f64,
    ymin: f64,
    delta: f64,

    // Ez at t = n * dt; Hx, Hy at t = (n - 1/2) * dt. Hx uses rows
    // 0..NY-1, Hy columns 0..NX-1; both are allocated full-size.
    ez: Vec<f64>,
    hx: Vec<f64>,
    hy: Vec<f64>,

    // Per-cell update coefficients. The medium is uniform today; the
    // arrays stay per-cell for future inhomogeneity.
    chxh: Vec<f64>,
    chxe: Vec<f64>,
    chyh: Vec<f64>,
    chye: Vec<f64>,
    ceze: Vec<f64>,
    cezh: Vec<f64>,

    relative_permeability: f64,
    relative_permittivity: f64,
    magnetic_conductivity: f64,
    electric_conductivity: f64,

    periodic_x: bool,
    periodic_y: bool,
    absorbing_left: bool,
    absorbing_right: bool,
    absorbing_top: bool,
    absorbing_bottom: bool,

    abc: MurBoundary,
    source: Source,
    hbf: HalfbandFilter,

    // Scratch for the separable filter, length max(NX, NY).
    scratch: Vec<f64>,

    update_counter: u64,
}

#[wasm_bindgen]
impl Solver {
    /// Create a solver over an NX x NY grid with world origin
    /// (xmin, ymin) and uniform spacing delta, then run `initialize`.
    #[wasm_bindgen(constructor)]
    pub fn new(nx: usize, ny: usize, xmin: f64, ymin: f64, delta: f64) -> Solver {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        assert!(nx >= 3 && ny >= 3, "grid must be at least 3x3");

        let size = nx * ny;
        let mut solver = Solver {
            nx,
            ny,
            xmin,
            ymin,
            delta,
            ez: vec![0.0; size],
            hx: vec![0.0; size],
            hy: vec![0.0; size],
            chxh: vec![0.0; size],
            chxe: vec![0.0; size],
            chyh: vec![0.0; size],
            chye: vec![0.0; size],
            ceze: vec![0.0; size],
            cezh: vec![0.0; size],
            relative_permeability: 1.0,
            relative_permittivity: 1.0,
            magnetic_conductivity: 0.0,
            electric_conductivity: 0.0,
            periodic_x: true,
            periodic_y: true,
            absorbing_left: false,
            absorbing_right: false,
            absorbing_top: false,
            absorbing_bottom: false,
            abc: MurBoundary::new(nx, ny),
            source: Source::new_default(),
            hbf: HalfbandFilter::new(5),
            scratch: vec![0.0; nx.max(ny)],
            update_counter: 0,
        };
        solver.initialize(xmin, ymin, delta);
        solver
    }

    /// Install the default configuration: periodic on both axes, uniform
    /// vacuum, zero field, counter 0, default monochromatic source.
    pub fn initialize(&mut self, xmin: f64, ymin: f64, delta: f64) {
        self.xmin = xmin;
        self.ymin = ymin;
        self.delta = delta;

        self.set_periodic_x();
        self.set_periodic_y();

        self.set_uniform_medium(1.0, 1.0, 0.0, 0.0);
        self.abc.initialize(self.cezh[0], self.chye[0]);

        self.reset();

        self.source = Source::new_default();
    }

    /// Zero fields, boundary histories, update counter, and source phase.
    /// Medium, boundary modes, and source configuration are untouched.
    pub fn reset(&mut self) {
        self.zero_field();
        self.abc.zero();
        self.update_counter = 0;
        self.source.reset_theta();
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn get_nx(&self) -> usize {
        self.nx
    }

    pub fn get_ny(&self) -> usize {
        self.ny
    }

    pub fn size(&self) -> usize {
        self.nx * self.ny
    }

    pub fn get_delta(&self) -> f64 {
        self.delta
    }

    pub fn get_timestep(&self) -> f64 {
        self.delta * COURANT_FACTOR / VACUUM_VELOCITY
    }

    pub fn get_update_count(&self) -> u64 {
        self.update_counter
    }

    pub fn get_update_time(&self) -> f64 {
        self.update_counter as f64 * self.get_timestep()
    }

    pub fn get_xmin(&self) -> f64 {
        self.xmin
    }

    pub fn get_xmax(&self) -> f64 {
        self.xmin + (self.nx - 1) as f64 * self.delta
    }

    pub fn get_ymin(&self) -> f64 {
        self.ymin
    }

    pub fn get_ymax(&self) -> f64 {
        self.ymin + (self.ny - 1) as f64 * self.delta
    }

    pub fn is_periodic_x(&self) -> bool {
        self.periodic_x
    }

    pub fn is_periodic_y(&self) -> bool {
        self.periodic_y
    }

    pub fn is_absorbing_x(&self) -> bool {
        self.absorbing_left && self.absorbing_right && !self.periodic_x
    }

    pub fn is_absorbing_y(&self) -> bool {
        self.absorbing_top && self.absorbing_bottom && !self.periodic_y
    }

    pub fn is_mixed_x(&self) -> bool {
        (self.absorbing_left ^ self.absorbing_right) && !self.periodic_x
    }

    pub fn is_mixed_y(&self) -> bool {
        (self.absorbing_top ^ self.absorbing_bottom) && !self.periodic_y
    }

    /// Raw pointer to the Ez array for zero-copy host views. Valid while
    /// the solver is alive and no mutating call runs.
    pub fn ez_ptr(&self) -> *const f64 {
        self.ez.as_ptr()
    }

    pub fn ez_len(&self) -> usize {
        self.ez.len()
    }

    /// Sampled finite-value check; false once the field has diverged.
    pub fn is_stable(&self) -> bool {
        let n = self.ez.len();
        let samples = [0, n / 4, n / 2, 3 * n / 4, n - 1];
        samples.iter().all(|&i| self.ez[i].is_finite())
    }

    /// Bilinear-interpolated Ez at a world position, in full precision.
    /// Samples are clamped onto the grid the same way the rasterizer
    /// clamps its viewport.
    pub fn probe_ez(&self, x: f64, y: f64) -> f64 {
        let xlim = (self.nx - 1) as f64 - 1e-9;
        let ylim = (self.ny - 1) as f64 - 1e-9;
        let xhat = ((x - self.xmin) / self.delta).clamp(0.0, xlim);
        let yhat = ((y - self.ymin) / self.delta).clamp(0.0, ylim);
        self.interpolate(xhat, yhat)
    }

    // ------------------------------------------------------------------
    // Medium
    // ------------------------------------------------------------------

    /// Set the uniform lossy medium and rebuild the update coefficients.
    /// The field itself is left untouched.
    pub fn set_uniform_medium(&mut self, mur: f64, epr: f64, sigmam: f64, sigma: f64) {
        self.relative_permeability = mur;
        self.relative_permittivity = epr;
        self.magnetic_conductivity = sigmam;
        self.electric_conductivity = sigma;

        let ch = COURANT_FACTOR / (mur * VACUUM_IMPEDANCE);
        let ce = VACUUM_IMPEDANCE * COURANT_FACTOR / epr;

        let sh = (sigmam * self.delta / 2.0) * ch;
        let ahh = (1.0 - sh) / (1.0 + sh);
        let ahe = 1.0 / (1.0 + sh);

        let se = (sigma * self.delta / 2.0) * ce;
        let aeh = 1.0 / (1.0 + se);
        let aee = (1.0 - se) / (1.0 + se);

        self.chxh.fill(ahh);
        self.chxe.fill(ahe * ch);
        self.chyh.fill(ahh);
        self.chye.fill(ahe * ch);
        self.cezh.fill(aeh * ce);
        self.ceze.fill(aee);

        // Keep the absorbing operator consistent with the live medium.
        self.abc.set_coefficients(self.cezh[0], self.chye[0]);
    }

    pub fn set_vacuum(&mut self) {
        self.set_uniform_medium(1.0, 1.0, 0.0, 0.0);
    }

    pub fn is_vacuum(&self) -> bool {
        self.relative_permeability == 1.0
            && self.relative_permittivity == 1.0
            && self.magnetic_conductivity == 0.0
            && self.electric_conductivity == 0.0
    }

    /// Set the electric conductivity so that the skin depth is `lhat`
    /// space steps at the current source wavelength.
    pub fn set_damping(&mut self, lhat: f64) {
        let sigma_delta = self.source.sigma_delta(lhat, self.relative_permeability);
        self.set_uniform_medium(
            self.relative_permeability,
            self.relative_permittivity,
            self.magnetic_conductivity,
            sigma_delta / self.delta,
        );
    }

    // ------------------------------------------------------------------
    // Boundary modes
    // ------------------------------------------------------------------

    pub fn set_periodic_x(&mut self) {
        self.absorbing_left = false;
        self.absorbing_right = false;
        self.periodic_x = true;
        self.abc.zero_x();
        self.taper_border_x(8);
    }

    pub fn set_periodic_y(&mut self) {
        self.absorbing_top = false;
        self.absorbing_bottom = false;
        self.periodic_y = true;
        self.abc.zero_y();
        self.taper_border_y(8);
    }

    pub fn set_absorbing_x(&mut self) {
        let taper = 12;
        self.absorbing_left = true;
        self.absorbing_right = true;
        self.periodic_x = false;
        self.abc.zero_x();
        self.taper_border_x(taper);
        if self.is_absorbing_y() {
            self.abc.zero_y();
            self.taper_border_y(taper);
        }
    }

    pub fn set_absorbing_y(&mut self) {
        let taper = 12;
        self.absorbing_top = true;
        self.absorbing_bottom = true;
        self.periodic_y = false;
        self.abc.zero_y();
        self.taper_border_y(taper);
        if self.is_absorbing_x() {
            self.abc.zero_x();
            self.taper_border_x(taper);
        }
    }

    pub fn set_pec_x(&mut self) {
        self.absorbing_left = false;
        self.absorbing_right = false;
        self.periodic_x = false;
        self.zero_boundary_ez_x();
    }

    pub fn set_pec_y(&mut self) {
        self.absorbing_top = false;
        self.absorbing_bottom = false;
        self.periodic_y = false;
        self.zero_boundary_ez_y();
    }

    // ------------------------------------------------------------------
    // Source
    // ------------------------------------------------------------------

    pub fn source_move(&mut self, dx: f64, dy: f64) {
        self.source.x += dx;
        self.source.y += dy;
    }

    pub fn source_place(&mut self, x: f64, y: f64) {
        self.source.x = x;
        self.source.y = y;
    }

    pub fn source_type(&mut self, kind: SourceKind) {
        self.source.kind = kind;
    }

    /// Nudge the source wavelength by `dppw` points, floored at 2.
    pub fn source_tune(&mut self, dppw: f64) {
        let new_ppw = (self.source.ppw + dppw).max(2.0);
        self.source.set_ppw(new_ppw);
    }

    pub fn source_tune_get(&self) -> f64 {
        self.source.ppw
    }

    pub fn source_amplitude(&self) -> f64 {
        self.source.amp
    }

    pub fn set_source_amplitude(&mut self, a: f64) {
        self.source.amp = a;
    }

    pub fn source_additive(&self) -> bool {
        self.source.additive
    }

    pub fn set_source_additive(&mut self, a: bool) {
        self.source.additive = a;
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Advance one full timestep.
    pub fn step(&mut self) {
        self.update_hx_hy();
        self.update_ez_interior();

        if self.periodic_x {
            self.make_ez_periodic_x();
        } else {
            if self.absorbing_left {
                self.abc.apply_left(&mut self.ez);
            }
            if self.absorbing_right {
                self.abc.apply_right(&mut self.ez);
            }
        }

        if self.periodic_y {
            self.make_ez_periodic_y();
        } else {
            if self.absorbing_top {
                self.abc.apply_top(&mut self.ez);
            }
            if self.absorbing_bottom {
                self.abc.apply_bottom(&mut self.ez);
            }
        }

        self.apply_source();

        self.source.advance_theta();
        self.update_counter += 1;
    }

    pub fn step_n(&mut self, n: u32) {
        for _ in 0..n {
            self.step();
        }
    }

    // ------------------------------------------------------------------
    // Field utilities
    // ------------------------------------------------------------------

    /// Add a Gaussian bump onto the interior Ez cells; (xc, yc) and the
    /// widths are in grid points.
    pub fn superimpose_gaussian(&mut self, xc: f64, yc: f64, sigmax: f64, sigmay: f64) {
        if sigmax <= 0.0 || sigmay <= 0.0 {
            return;
        }
        for iy in 1..self.ny - 1 {
            for ix in 1..self.nx - 1 {
                let xhat = (ix as f64 - xc) / sigmax;
                let yhat = (iy as f64 - yc) / sigmay;
                self.ez[iy * self.nx + ix] += (-0.5 * (xhat * xhat + yhat * yhat)).exp();
            }
        }
    }

    /// Electric field energy at t = n * dt.
    pub fn energy_e(&self) -> f64 {
        let sum: f64 = self.ez.iter().map(|&v| v * v).sum();
        self.relative_permittivity
            * VACUUM_PERMITTIVITY
            * (sum * self.delta * self.delta / 2.0)
    }

    /// Magnetic field energy; sampled at t = (n - 1/2) * dt, so the sum
    /// with `energy_e` is only approximately conserved.
    pub fn energy_b(&self) -> f64 {
        let sum: f64 = self
            .hx
            .iter()
            .zip(self.hy.iter())
            .map(|(&hx, &hy)| hx * hx + hy * hy)
            .sum();
        self.relative_permeability
            * VACUUM_PERMEABILITY
            * (sum * self.delta * self.delta / 2.0)
    }

    pub fn minimum_ez(&self) -> f64 {
        self.ez.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn maximum_ez(&self) -> f64 {
        self.ez.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smooth all three field components with the separable halfband
    /// filter (rows then columns, zero-extended), then taper the outer
    /// cells and drop the now-inconsistent boundary histories.
    pub fn halfband_filter_xy(&mut self) {
        Self::filter_field(
            &mut self.hbf,
            &mut self.ez,
            &mut self.scratch,
            self.nx,
            self.ny,
        );
        Self::filter_field(
            &mut self.hbf,
            &mut self.hx,
            &mut self.scratch,
            self.nx,
            self.ny,
        );
        Self::filter_field(
            &mut self.hbf,
            &mut self.hy,
            &mut self.scratch,
            self.nx,
            self.ny,
        );

        let taper = 8;
        self.taper_border_x(taper);
        self.abc.zero_x();
        self.taper_border_y(taper);
        self.abc.zero_y();
    }

    // ------------------------------------------------------------------
    // Rasterization
    // ------------------------------------------------------------------

    /// Rasterize Ez over a world-coordinate viewport into a w x h RGBA
    /// pixel buffer (row-major, A<<24|B<<16|G<<8|R, image y inverted
    /// relative to world y). No-op on an undersized buffer or an empty
    /// color range.
    #[allow(clippy::too_many_arguments)]
    pub fn rasterize_ez(
        &self,
        imgdata: &mut [u32],
        w: usize,
        h: usize,
        viridis: bool,
        ezmin: f64,
        ezmax: f64,
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
    ) {
        let rgbfunc = if viridis {
            colormap::rgb_f_viridis
        } else {
            colormap::rgb_f_jet
        };
        if w == 0 || h == 0 || imgdata.len() < w * h {
            return;
        }
        if ezmin >= ezmax {
            return;
        }

        let delta = self.delta;
        let crange = ezmax - ezmin;
        let a = (1.0 / crange) as f32;
        let b = (-ezmin / crange) as f32;

        let xupp = (xmax - xmin) / w as f64; // x units per pixel
        let yupp = (ymax - ymin) / h as f64; // y units per pixel

        let y0 = (ymax - self.ymin) / delta;
        let y1 = -yupp / delta;

        // Keep the bilinear accesses at (xi+1, yi+1) inside the grid.
        let xlim = (self.nx - 1) as f64 - 1e-9;
        let ylim = (self.ny - 1) as f64 - 1e-9;

        for i in 0..w {
            let xi = xmin + i as f64 * xupp;
            let xhat = ((xi - self.xmin) / delta).clamp(0.0, xlim);
            for j in 0..h {
                let yhat = (y0 + y1 * j as f64).clamp(0.0, ylim);
                let ezij = self.interpolate_f32(xhat, yhat);
                imgdata[i + j * w] = rgbfunc(a * ezij + b);
            }
        }
    }

    /// Diagnostic raster mixing pixel indices with the update counter.
    pub fn rasterize_test_pattern(
        &self,
        imgdata: &mut [u32],
        w: usize,
        h: usize,
        viridis: bool,
    ) {
        let rgbfunc = if viridis {
            colormap::rgb_i_viridis
        } else {
            colormap::rgb_i_jet
        };
        if w == 0 || h == 0 || imgdata.len() < w * h {
            return;
        }
        for i in 0..w {
            for j in 0..h {
                let idx = ((i + j) as u64 + self.update_counter) % 255;
                imgdata[i + j * w] = rgbfunc(idx as u32);
            }
        }
    }
}

impl Solver {
    fn index(&self, ix: usize, iy: usize) -> usize {
        self.nx * iy + ix
    }

    fn zero_field(&mut self) {
        self.ez.fill(0.0);
        self.hx.fill(0.0);
        self.hy.fill(0.0);
    }

    fn integer_x(&self, x: f64) -> i64 {
        ((x - self.xmin) / self.delta).round() as i64
    }

    fn integer_y(&self, y: f64) -> i64 {
        ((y - self.ymin) / self.delta).round() as i64
    }

    fn update_hx_hy(&mut self) {
        let nx = self.nx;
        let ny = self.ny;

        for iy in 0..ny - 1 {
            for ix in 0..nx {
                let idx = iy * nx + ix;
                self.hx[idx] = self.chxh[idx] * self.hx[idx]
                    - self.chxe[idx] * (self.ez[idx + nx] - self.ez[idx]);
            }
        }

        for iy in 0..ny {
            for ix in 0..nx - 1 {
                let idx = iy * nx + ix;
                self.hy[idx] = self.chyh[idx] * self.hy[idx]
                    + self.chye[idx] * (self.ez[idx + 1] - self.ez[idx]);
            }
        }
    }

    fn update_ez_interior(&mut self) {
        let nx = self.nx;
        for iy in 1..self.ny - 1 {
            for ix in 1..nx - 1 {
                let idx = iy * nx + ix;
                let dxhy = self.hy[idx] - self.hy[idx - 1];
                let dyhx = self.hx[idx] - self.hx[idx - nx];
                self.ez[idx] = self.ceze[idx] * self.ez[idx] + self.cezh[idx] * (dxhy - dyhx);
            }
        }
    }

    /// Ez update along ix = 0 and ix = NX-1 with Hy wrapped around the
    /// x axis. Transverse corner rows are left to the y-axis resolution.
    fn make_ez_periodic_x(&mut self) {
        let nx = self.nx;
        for iy in 1..self.ny - 1 {
            let idx = iy * nx;
            let dxhy = self.hy[idx] - self.hy[idx + nx - 2];
            let dyhx = self.hx[idx] - self.hx[idx - nx];
            self.ez[idx] = self.ceze[idx] * self.ez[idx] + self.cezh[idx] * (dxhy - dyhx);

            let idx = iy * nx + nx - 1;
            let dxhy = self.hy[iy * nx] - self.hy[idx - 1];
            let dyhx = self.hx[idx] - self.hx[idx - nx];
            self.ez[idx] = self.ceze[idx] * self.ez[idx] + self.cezh[idx] * (dxhy - dyhx);
        }
    }

    fn make_ez_periodic_y(&mut self) {
        let nx = self.nx;
        let ny = self.ny;
        for ix in 1..nx - 1 {
            let idx = ix;
            let dxhy = self.hy[idx] - self.hy[idx - 1];
            let dyhx = self.hx[idx] - self.hx[(ny - 2) * nx + ix];
            self.ez[idx] = self.ceze[idx] * self.ez[idx] + self.cezh[idx] * (dxhy - dyhx);

            let idx = (ny - 1) * nx + ix;
            let dxhy = self.hy[idx] - self.hy[idx - 1];
            let dyhx = self.hx[ix] - self.hx[idx - nx];
            self.ez[idx] = self.ceze[idx] * self.ez[idx] + self.cezh[idx] * (dxhy - dyhx);
        }
    }

    fn zero_boundary_ez_x(&mut self) {
        let nx = self.nx;
        for iy in 0..self.ny {
            self.ez[iy * nx] = 0.0;
            self.ez[iy * nx + nx - 1] = 0.0;
        }
    }

    fn zero_boundary_ez_y(&mut self) {
        let nx = self.nx;
        let ny = self.ny;
        for ix in 0..nx {
            self.ez[ix] = 0.0;
            self.ez[(ny - 1) * nx + ix] = 0.0;
        }
    }

    /// Scale the outer `width` columns of all fields by (w/width)^2 to
    /// damp boundary transients after a mode switch.
    fn taper_border_x(&mut self, width: usize) {
        let width = width.min(self.nx / 2);
        let nx = self.nx;
        for iy in 0..self.ny {
            for w in 0..width {
                let sw = w as f64 / width as f64;
                let swsq = sw * sw;
                let lo = iy * nx + w;
                let hi = iy * nx + nx - 1 - w;
                self.ez[lo] *= swsq;
                self.ez[hi] *= swsq;
                self.hx[lo] *= swsq;
                self.hx[hi] *= swsq;
                self.hy[lo] *= swsq;
                self.hy[hi] *= swsq;
            }
        }
    }

    fn taper_border_y(&mut self, width: usize) {
        let width = width.min(self.ny / 2);
        let nx = self.nx;
        let ny = self.ny;
        for ix in 0..nx {
            for w in 0..width {
                let sw = w as f64 / width as f64;
                let swsq = sw * sw;
                let lo = w * nx + ix;
                let hi = (ny - 1 - w) * nx + ix;
                self.ez[lo] *= swsq;
                self.ez[hi] *= swsq;
                self.hx[lo] *= swsq;
                self.hx[hi] *= swsq;
                self.hy[lo] *= swsq;
                self.hy[hi] *= swsq;
            }
        }
    }

    fn apply_source(&mut self) {
        let ix = self.integer_x(self.source.x);
        if ix < 0 || ix >= self.nx as i64 {
            return;
        }

        let iy = self.integer_y(self.source.y);
        if iy < 0 || iy >= self.ny as i64 {
            return;
        }

        if self.source.kind == SourceKind::NoSource {
            return;
        }

        let sxy = self.source.get(self.update_counter);
        let idx = self.index(ix as usize, iy as usize);

        if self.source.additive {
            self.ez[idx] += sxy;
        } else {
            self.ez[idx] = sxy;
        }
    }

    /// Separable halfband pass over one field: every row along x, then
    /// every column along y, through the shared scratch buffer.
    fn filter_field(
        hbf: &mut HalfbandFilter,
        f: &mut [f64],
        scratch: &mut [f64],
        nx: usize,
        ny: usize,
    ) {
        for iy in 0..ny {
            let row = iy * nx;
            hbf.apply_zero(&mut scratch[..nx], 1, &f[row..row + nx], 1, nx);
            f[row..row + nx].copy_from_slice(&scratch[..nx]);
        }
        for ix in 0..nx {
            hbf.apply_zero(&mut scratch[..ny], 1, &f[ix..], nx, ny);
            for iy in 0..ny {
                f[iy * nx + ix] = scratch[iy];
            }
        }
    }

    /// Bilinear interpolation of Ez at fractional grid coordinates.
    fn interpolate(&self, xhat: f64, yhat: f64) -> f64 {
        let xi = xhat as usize;
        let yi = yhat as usize;
        let etax = xhat - xi as f64;
        let etay = yhat - yi as f64;

        let idx = yi * self.nx + xi;

        let v00 = self.ez[idx];
        let v01 = self.ez[idx + self.nx];
        let v10 = self.ez[idx + 1];
        let v11 = self.ez[idx + 1 + self.nx];

        let w00 = (1.0 - etax) * (1.0 - etay);
        let w01 = (1.0 - etax) * etay;
        let w10 = etax * (1.0 - etay);
        let w11 = etax * etay;

        w00 * v00 + w01 * v01 + w10 * v10 + w11 * v11
    }

    /// Same stencil in f32, the rasterizer's fast path. Floor indices
    /// are still taken in f64 so the clamp above stays authoritative.
    fn interpolate_f32(&self, xhat: f64, yhat: f64) -> f32 {
        let xi = xhat as usize;
        let yi = yhat as usize;
        let etax = (xhat - xi as f64) as f32;
        let etay = (yhat - yi as f64) as f32;

        let idx = yi * self.nx + xi;

        let v00 = self.ez[idx] as f32;
        let v01 = self.ez[idx + self.nx] as f32;
        let v10 = self.ez[idx + 1] as f32;
        let v11 = self.ez[idx + 1 + self.nx] as f32;

        let w00 = (1.0 - etax) * (1.0 - etay);
        let w01 = (1.0 - etax) * etay;
        let w10 = etax * (1.0 - etay);
        let w11 = etax * etay;

        w00 * v00 + w01 * v01 + w10 * v10 + w11 * v11
    }

    #[cfg(test)]
    fn ez_at(&self, ix: usize, iy: usize) -> f64 {
        self.ez[self.index(ix, iy)]
    }
}
