pub mod catalog;
pub mod collect;
pub mod constants;
pub mod desimap_errors;
pub mod fits;
pub mod footprint;
pub mod healpix;
pub mod skymap;
