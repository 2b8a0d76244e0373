//! # DR9 imaging-survey footprint regions
//!
//! Diagnostic region masks over the healpix pixel space for the three Legacy
//! Imaging DR9 photometric surveys: **North** (MzLS/BASS), **South** (DECaLS)
//! and **DES**. The pipeline only uses these masks to report how the observed
//! pixels split across photometric regions, so the geometry is analytic:
//!
//! - North is the part of the sky imaged by MzLS/BASS, i.e. galactic latitude
//!   `b > 0` and declination above 32.375°.
//! - DES is approximated by an embedded boundary polygon in (RA, Dec), with RA
//!   shifted to `(-180°, 180°]` so the polygon does not straddle the wrap.
//! - South is the remainder, optionally cleaned of the Large Magellanic Cloud
//!   neighborhood, of a buffer zone around the DES boundary, and of the
//!   disconnected islands below declination −30°.
//!
//! Masks are indexed in RING ordering and are pairwise disjoint.

use nalgebra::Vector3;

use crate::constants::Degree;
use crate::healpix::{nside2npix, pix2ang_ring};

/// North galactic pole, J2000 equatorial coordinates (degrees).
const NGP_RA: Degree = 192.8594813;
const NGP_DEC: Degree = 27.1282512;

/// Declination of the MzLS/BASS – DECaLS split.
const NORTH_DEC_LIMIT: Degree = 32.375;

/// Southern declination limit of the DESI footprint.
const DESI_DEC_LIMIT: Degree = -30.0;

/// Large Magellanic Cloud center and exclusion radius (degrees).
const LMC_RA: Degree = 80.894;
const LMC_DEC: Degree = -69.756;
const LMC_RADIUS: Degree = 6.0;

/// Width of the buffer zone removed around the DES boundary (degrees).
const DES_BUFFER: Degree = 2.0;

/// Approximate DES boundary polygon, vertices as (shifted RA, Dec) in degrees.
/// RA is shifted to (-180, 180] since DES straddles RA = 0.
const DES_POLYGON: [(Degree, Degree); 17] = [
    (-60.0, -40.0),
    (-60.0, -55.0),
    (-40.0, -62.0),
    (0.0, -65.0),
    (40.0, -65.0),
    (80.0, -60.0),
    (100.0, -52.0),
    (100.0, -40.0),
    (95.0, -30.0),
    (90.0, -15.0),
    (80.0, -5.0),
    (60.0, 3.0),
    (40.0, 5.0),
    (0.0, 5.0),
    (-30.0, 3.0),
    (-45.0, -5.0),
    (-55.0, -20.0),
];

/// Unit vector of an equatorial direction.
fn radec_unit_vector(ra_deg: Degree, dec_deg: Degree) -> Vector3<f64> {
    let (ra, dec) = (ra_deg.to_radians(), dec_deg.to_radians());
    Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
}

/// Galactic latitude of an equatorial direction, in degrees.
pub fn galactic_latitude(ra_deg: Degree, dec_deg: Degree) -> Degree {
    let ngp = radec_unit_vector(NGP_RA, NGP_DEC);
    let v = radec_unit_vector(ra_deg, dec_deg);
    v.dot(&ngp).clamp(-1.0, 1.0).asin().to_degrees()
}

/// Shift RA into (-180, 180] so DES-related tests avoid the 0/360 wrap.
fn shifted_ra(ra_deg: Degree) -> Degree {
    let ra = ra_deg.rem_euclid(360.0);
    if ra > 180.0 {
        ra - 360.0
    } else {
        ra
    }
}

/// Even-odd ray casting in the (shifted RA, Dec) plane.
fn point_in_polygon(polygon: &[(Degree, Degree)], x: Degree, y: Degree) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn in_des(ra_deg: Degree, dec_deg: Degree) -> bool {
    point_in_polygon(&DES_POLYGON, shifted_ra(ra_deg), dec_deg)
}

/// Sample the DES boundary edges at roughly one-degree steps.
fn des_boundary_samples() -> Vec<Vector3<f64>> {
    let mut samples = Vec::new();
    for i in 0..DES_POLYGON.len() {
        let (x0, y0) = DES_POLYGON[i];
        let (x1, y1) = DES_POLYGON[(i + 1) % DES_POLYGON.len()];
        let steps = ((x1 - x0).hypot(y1 - y0).ceil() as usize).max(1);
        for s in 0..steps {
            let t = s as f64 / steps as f64;
            samples.push(radec_unit_vector(x0 + t * (x1 - x0), y0 + t * (y1 - y0)));
        }
    }
    samples
}

/// Cheap reject for the DES buffer test: bounding box of the polygon grown by
/// the buffer width (generous in RA, the exact test follows).
fn near_des_bounding_box(ra_shifted: Degree, dec_deg: Degree) -> bool {
    (-70.0..=110.0).contains(&ra_shifted) && (-70.0..=10.0).contains(&dec_deg)
}

/// Angular separation below `radius_deg` between a direction and any sample.
fn within_any(v: &Vector3<f64>, samples: &[Vector3<f64>], radius_deg: Degree) -> bool {
    let cos_radius = radius_deg.to_radians().cos();
    samples.iter().any(|s| v.dot(s) > cos_radius)
}

/// Provider of the DR9 imaging-survey masks at a given healpix resolution.
///
/// The boolean flags mirror the knobs of the footprint definition:
/// `mask_lmc` removes the LMC neighborhood from the south, `clear_south`
/// removes the disconnected south islands below declination −30°,
/// `mask_around_des` removes a buffer zone around the DES boundary, and
/// `cut_desi` restricts every mask to the DESI declination range.
#[derive(Debug, Clone, Copy)]
pub struct Dr9Footprint {
    nside: u32,
    mask_lmc: bool,
    clear_south: bool,
    mask_around_des: bool,
    cut_desi: bool,
}

impl Dr9Footprint {
    pub fn new(
        nside: u32,
        mask_lmc: bool,
        clear_south: bool,
        mask_around_des: bool,
        cut_desi: bool,
    ) -> Self {
        Dr9Footprint {
            nside,
            mask_lmc,
            clear_south,
            mask_around_des,
            cut_desi,
        }
    }

    /// Per-pixel region masks for the three imaging surveys.
    ///
    /// Return
    /// ------
    /// * `(north, south, des)`, each of length `12·nside²` in RING ordering
    pub fn imaging_surveys(&self) -> (Vec<bool>, Vec<bool>, Vec<bool>) {
        let npix = nside2npix(self.nside) as usize;
        let mut north = vec![false; npix];
        let mut south = vec![false; npix];
        let mut des = vec![false; npix];

        let lmc = radec_unit_vector(LMC_RA, LMC_DEC);
        let cos_lmc_radius = LMC_RADIUS.to_radians().cos();
        let boundary = if self.mask_around_des {
            des_boundary_samples()
        } else {
            Vec::new()
        };

        for pix in 0..npix {
            let (ra, dec) = pix2ang_ring(self.nside, pix as u64);
            if self.cut_desi && dec <= DESI_DEC_LIMIT {
                continue;
            }

            if in_des(ra, dec) {
                des[pix] = true;
                continue;
            }
            if dec > NORTH_DEC_LIMIT && galactic_latitude(ra, dec) > 0.0 {
                north[pix] = true;
                continue;
            }

            if self.clear_south && dec < DESI_DEC_LIMIT {
                continue;
            }
            let v = radec_unit_vector(ra, dec);
            if self.mask_lmc && v.dot(&lmc) > cos_lmc_radius {
                continue;
            }
            if self.mask_around_des
                && near_des_bounding_box(shifted_ra(ra), dec)
                && within_any(&v, &boundary, DES_BUFFER)
            {
                continue;
            }
            south[pix] = true;
        }
        (north, south, des)
    }
}
