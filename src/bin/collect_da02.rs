//! DA02 collection driver.
//!
//! One-shot batch job: for each tracer of the DA02 release, build the healpix
//! distribution of the observed objects and the corresponding fracarea map,
//! and save both under `data/`. All parameters are fixed below; there is no
//! CLI surface. A failure on one tracer aborts the remaining ones.

use camino::Utf8Path;

use desimap::collect::save_desi_data;
use desimap::desimap_errors::DesimapError;

fn main() -> Result<(), DesimapError> {
    tracing_subscriber::fmt::init();

    // Wiki page for DA02: https://desi.lbl.gov/trac/wiki/ClusteringWG/LSScat/DA02main/version1
    let lss = Utf8Path::new("/global/cfs/cdirs/desi/survey/catalogs/main/LSS/everest/LSScats/test");
    let version = "DA02";
    // BGS_ANY has no dedicated redshift window and falls back to the wide default.
    let tracers = ["BGS_ANY", "LRG", "ELG", "QSO"];
    let nside = 128; // same nside for all tracers
    let dir_out = Utf8Path::new("data");

    std::fs::create_dir_all(dir_out)?;
    for tracer in tracers {
        save_desi_data(lss, version, tracer, nside, dir_out)?;
    }
    Ok(())
}
