//! # Tracer catalogs and redshift windows
//!
//! Loading of the per-tracer clustering catalogs and their associated random
//! catalogs from the LSS directory, plus the fixed redshift windows used for
//! the clustering analysis.
//!
//! File naming follows the LSS catalog conventions: the clustering catalog is
//! `{tracer}zdone_clustering.dat.fits` and the randoms are split across
//! [`RANDOM_SHARD_COUNT`] shard files `{tracer}zdone_{i}_clustering.ran.fits`.

use camino::{Utf8Path, Utf8PathBuf};
use itertools::{izip, multiunzip};

use crate::constants::{Degree, Redshift, RedshiftWindow, RANDOM_SHARD_COUNT};
use crate::desimap_errors::DesimapError;
use crate::fits::read_bintable_columns;

/// Redshift window for the clustering analysis as a function of tracer.
///
/// Unrecognized tracer labels (including `BGS_ANY`) fall back to the wide
/// default window rather than failing.
///
/// Arguments
/// ---------
/// * `tracer`: tracer label, e.g. `BGS`, `LRG`, `ELG`, `QSO`
///
/// Return
/// ------
/// * `(z_min, z_max)`, applied as the strict cut `z_min < z < z_max`
pub fn redshift_selection(tracer: &str) -> RedshiftWindow {
    match tracer {
        "BGS" => (0.1, 0.5),
        "LRG" => (0.4, 1.1),
        "ELG" | "ELGnoQSO" => (0.8, 1.5),
        "QSO" => (0.8, 3.5),
        _ => (0.1, 5.9),
    }
}

/// Filename of a tracer's clustering catalog inside the LSS directory.
pub fn clustering_filename(tracer: &str) -> String {
    format!("{tracer}zdone_clustering.dat.fits")
}

/// Filename of one random-catalog shard of a tracer.
pub fn random_filename(tracer: &str, shard: usize) -> String {
    format!("{tracer}zdone_{shard}_clustering.ran.fits")
}

/// Column-oriented view of a clustering catalog.
///
/// All vectors have the same length; rows are immutable once loaded.
#[derive(Debug)]
pub struct ClusteringCatalog {
    pub ra: Vec<Degree>,
    pub dec: Vec<Degree>,
    pub z: Vec<Redshift>,
    pub weight_comp: Vec<f64>,
}

impl ClusteringCatalog {
    /// Load RA, DEC, Z and WEIGHT_COMP from a clustering catalog file.
    pub fn from_fits(path: &Utf8Path) -> Result<Self, DesimapError> {
        let mut columns = read_bintable_columns(path, &["RA", "DEC", "Z", "WEIGHT_COMP"])?;
        let weight_comp = columns.pop().unwrap_or_default();
        let z = columns.pop().unwrap_or_default();
        let dec = columns.pop().unwrap_or_default();
        let ra = columns.pop().unwrap_or_default();
        Ok(ClusteringCatalog {
            ra,
            dec,
            z,
            weight_comp,
        })
    }

    /// Keep only the objects inside the redshift window, strict on both ends.
    pub fn select_redshift(&self, (z_min, z_max): RedshiftWindow) -> Self {
        let (ra, dec, z, weight_comp) = multiunzip(
            izip!(&self.ra, &self.dec, &self.z, &self.weight_comp)
                .filter(|(_, _, &z, _)| z > z_min && z < z_max)
                .map(|(&ra, &dec, &z, &w)| (ra, dec, z, w)),
        );
        ClusteringCatalog {
            ra,
            dec,
            z,
            weight_comp,
        }
    }

    pub fn len(&self) -> usize {
        self.ra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ra.is_empty()
    }
}

/// Concatenation of a tracer's random-catalog shards.
///
/// The redshift column is loaded along with the positions to mirror the
/// catalog schema, but the fracarea estimate only consumes RA/DEC.
#[derive(Debug)]
pub struct RandomCatalog {
    pub ra: Vec<Degree>,
    pub dec: Vec<Degree>,
    pub z: Vec<Redshift>,
}

impl RandomCatalog {
    /// Load and concatenate all [`RANDOM_SHARD_COUNT`] shards of a tracer.
    ///
    /// Arguments
    /// ---------
    /// * `lss`: directory holding the per-tracer catalog files
    /// * `tracer`: tracer label used in the shard filenames
    pub fn from_shards(lss: &Utf8Path, tracer: &str) -> Result<Self, DesimapError> {
        let mut randoms = RandomCatalog {
            ra: Vec::new(),
            dec: Vec::new(),
            z: Vec::new(),
        };
        for shard in 0..RANDOM_SHARD_COUNT {
            let path: Utf8PathBuf = lss.join(random_filename(tracer, shard));
            let mut columns = read_bintable_columns(&path, &["RA", "DEC", "Z"])?;
            randoms.z.append(&mut columns[2]);
            randoms.dec.append(&mut columns[1]);
            randoms.ra.append(&mut columns[0]);
        }
        Ok(randoms)
    }

    pub fn len(&self) -> usize {
        self.ra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ra.is_empty()
    }
}
