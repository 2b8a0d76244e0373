//! # Constants and type definitions for desimap
//!
//! This module centralizes the **survey constants**, **conversion factors**, and **common type
//! definitions** used throughout the `desimap` crate.
//!
//! ## Overview
//!
//! - Angular constants and unit conversions (degrees ↔ radians, full-sky solid angle)
//! - Random-catalog density constants used to estimate the observed area fraction
//! - Core type aliases used across the crate
//!
//! These definitions are shared by the pixelization, catalog and collection modules.

// -------------------------------------------------------------------------------------------------
// Angular constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Full-sky solid angle expressed in square degrees (4π sr)
pub const FULL_SKY_DEG2: f64 = 4.0 * std::f64::consts::PI / (RADEG * RADEG);

// -------------------------------------------------------------------------------------------------
// Random-catalog constants
// -------------------------------------------------------------------------------------------------

/// Number of random-catalog shard files per tracer
pub const RANDOM_SHARD_COUNT: usize = 10;

/// Angular density of the generated randoms in one shard file, in objects per square degree
pub const RANDOM_DENSITY_PER_DEG2: f64 = 2500.0;

/// A pixel whose inverse fractional area exceeds this value is considered an
/// outlier and masked out of the fracarea map.
pub const FRACAREA_OUTLIER_THRESHOLD: f64 = 5.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Dimensionless redshift
pub type Redshift = f64;

/// Flat per-pixel array in the RING ordering of a given nside
pub type HealpixMap = Vec<f64>;

/// Inclusive-exclusive redshift window `(z_min, z_max)` applied as `z_min < z < z_max`
pub type RedshiftWindow = (Redshift, Redshift);
