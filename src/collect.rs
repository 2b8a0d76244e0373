//! # Per-tracer collection pipeline
//!
//! From a tracer's clustering and random catalogs, build and save the healpix
//! distribution of the observed objects and the corresponding fracarea map.
//!
//! The pipeline is a single linear pass per tracer:
//! 1. load the clustering catalog and apply the tracer's redshift window;
//! 2. bin the selected objects into a WEIGHT_COMP-weighted counts map;
//! 3. log how the observed pixels split across the DR9 imaging surveys;
//! 4. concatenate the random shards and bin them as a density per deg²;
//! 5. derive the per-pixel observed-area fraction from the known random
//!    generation density, masking empty and outlier pixels as NaN;
//! 6. save both maps as npy arrays named after version, tracer and nside.

use camino::Utf8Path;
use tracing::info;

use crate::catalog::{clustering_filename, redshift_selection, ClusteringCatalog, RandomCatalog};
use crate::constants::{
    HealpixMap, FRACAREA_OUTLIER_THRESHOLD, RANDOM_DENSITY_PER_DEG2, RANDOM_SHARD_COUNT,
};
use crate::desimap_errors::DesimapError;
use crate::footprint::Dr9Footprint;
use crate::skymap::{build_healpix_map, fracarea_filename, map_filename, write_npy};

/// Build and save the healpix maps of one tracer.
///
/// Arguments
/// ---------
/// * `lss`: directory holding the clustering and random catalogs
/// * `version`: catalog version label, only used in the output filenames
/// * `tracer`: tracer label, e.g. `BGS_ANY` / `LRG` / `ELG` / `QSO`
/// * `nside`: resolution of the output healpix maps
/// * `dir_out`: directory where the two npy files are written
///
/// Side effects
/// ------------
/// * writes `{version}_{tracer}_{nside}.npy` (weighted counts) and
///   `{version}_{tracer}_fracarea_{nside}.npy` (observed area fraction)
///   into `dir_out`, and logs per-region coverage diagnostics.
pub fn save_desi_data(
    lss: &Utf8Path,
    version: &str,
    tracer: &str,
    nside: u32,
    dir_out: &Utf8Path,
) -> Result<(), DesimapError> {
    info!("Collect data for {tracer}:");

    let data = ClusteringCatalog::from_fits(&lss.join(clustering_filename(tracer)))?;
    let data = data.select_redshift(redshift_selection(tracer));
    let map_data = build_healpix_map(
        nside,
        &data.ra,
        &data.dec,
        Some(&data.weight_comp),
        false,
    )?;

    log_imaging_regions(nside, &map_data);

    let randoms = RandomCatalog::from_shards(lss, tracer)?;
    // The randoms are binned as a density since their generation density
    // per deg2 is known.
    let map_randoms = build_healpix_map(nside, &randoms.ra, &randoms.dec, None, true)?;
    let fracarea = compute_fracarea(&map_randoms);

    let filename_data = dir_out.join(map_filename(version, tracer, nside));
    info!("Save data: {filename_data}");
    write_npy(&filename_data, &map_data)?;

    let filename_fracarea = dir_out.join(fracarea_filename(version, tracer, nside));
    info!("Save corresponding fracarea: {filename_fracarea}");
    write_npy(&filename_fracarea, &fracarea)?;

    Ok(())
}

/// Observed area fraction per pixel from the random-catalog density map.
///
/// The expected density under full coverage is the number of shards times the
/// per-shard generation density. Pixels with no randoms and pixels whose
/// implied area fraction is below `1 / FRACAREA_OUTLIER_THRESHOLD` are set to
/// NaN; the outlier count is logged.
pub fn compute_fracarea(map_randoms: &HealpixMap) -> HealpixMap {
    let full_coverage_density = RANDOM_SHARD_COUNT as f64 * RANDOM_DENSITY_PER_DEG2;

    let mut fracarea: HealpixMap = map_randoms
        .iter()
        .map(|&density| {
            let frac = density / full_coverage_density;
            if frac == 0.0 {
                f64::NAN
            } else {
                frac
            }
        })
        .collect();

    // Remove pixels with too small a fracarea.
    let mut n_outliers = 0usize;
    for value in &mut fracarea {
        if 1.0 / *value > FRACAREA_OUTLIER_THRESHOLD {
            *value = f64::NAN;
            n_outliers += 1;
        }
    }
    let n_valid = fracarea.iter().filter(|&&v| v > 0.0).count();
    info!("{n_outliers} pixels are outlier on {n_valid}");

    fracarea
}

/// Log how the pixels with observed objects split across the imaging surveys.
fn log_imaging_regions(nside: u32, map_data: &HealpixMap) {
    let (north, south, des) =
        Dr9Footprint::new(nside, false, true, true, false).imaging_surveys();
    let n_observed = map_data.iter().filter(|&&v| v > 0.0).count();

    let in_region = |mask: &[bool]| {
        map_data
            .iter()
            .zip(mask)
            .filter(|(&v, &in_mask)| v > 0.0 && in_mask)
            .count()
    };
    let percent = |n: usize| 100.0 * n as f64 / n_observed as f64;

    let (n_north, n_south, n_des) = (in_region(&north), in_region(&south), in_region(&des));
    info!("Number of pixels observed in each region:");
    info!("        * North: {} ({:.2}%)", n_north, percent(n_north));
    info!("        * South: {} ({:.2}%)", n_south, percent(n_south));
    info!("        * Des:   {}  ({:.2}%)", n_des, percent(n_des));
}
