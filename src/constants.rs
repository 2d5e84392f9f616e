//! Vacuum constants shared by the update equations and the source model.
//!
//! `sqrt` is not usable in const context, so the derived constants are
//! precomputed literals; a unit test pins them against the defining
//! expressions.

/// Vacuum permeability mu_0 [N / A^2]
pub const VACUUM_PERMEABILITY: f64 = 1.2566370621219e-6;

/// Vacuum permittivity eps_0 [F / m]
pub const VACUUM_PERMITTIVITY: f64 = 8.854187812813e-12;

/// Vacuum impedance eta_0 = sqrt(mu_0 / eps_0) [Ohm]
pub const VACUUM_IMPEDANCE: f64 = 376.73031366686996;

/// Vacuum wave velocity c = 1 / sqrt(mu_0 * eps_0) [m / s]
pub const VACUUM_VELOCITY: f64 = 2.9979245799955976e8;

/// Courant factor S for the 2D Yee stepper (stability bound 1/sqrt(2))
pub const COURANT_FACTOR: f64 = std::f64::consts::FRAC_1_SQRT_2;

pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;
