//! # HEALPix RING-scheme pixelization
//!
//! Minimal HEALPix support for binning sky positions: the angle→pixel and
//! pixel→angle transforms in the **RING** ordering, plus the pixel-count and
//! pixel-area helpers. The implementation follows the standard z/φ
//! classification of the HEALPix paper (Górski et al. 2005): the sphere is
//! split into an equatorial band (`|z| ≤ 2/3`) where rings hold `4·nside`
//! pixels, and two polar caps where ring `i` holds `4·i` pixels.
//!
//! ## Units & Conventions
//! -----------------
//! - Positions are given as right ascension / declination in **degrees**
//!   (the `lonlat` convention of the catalog files); the colatitude used
//!   internally is `θ = 90° − dec`.
//! - Right ascension is wrapped into `[0°, 360°)` before classification, so
//!   negative RA values are accepted.
//! - Pixel indices are RING-ordered, `0 ≤ pix < 12·nside²`.

use crate::constants::{Degree, DPI, FULL_SKY_DEG2};

/// Number of pixels of a HEALPix tiling at the given resolution.
pub fn nside2npix(nside: u32) -> u64 {
    12 * nside as u64 * nside as u64
}

/// Area of a single pixel in square degrees (all pixels are equal-area).
pub fn pixel_area_deg2(nside: u32) -> f64 {
    FULL_SKY_DEG2 / nside2npix(nside) as f64
}

/// Integer square root with correction of the floating-point estimate.
fn isqrt(v: i64) -> i64 {
    let mut r = (v as f64).sqrt() as i64;
    while (r + 1) * (r + 1) <= v {
        r += 1;
    }
    while r * r > v {
        r -= 1;
    }
    r
}

/// Map a sky position to its RING-ordered HEALPix pixel.
///
/// Arguments
/// ---------
/// * `nside`: resolution parameter of the tiling
/// * `ra_deg`: right ascension in degrees (any value, wrapped modulo 360)
/// * `dec_deg`: declination in degrees, in `[-90, 90]`
///
/// Return
/// ------
/// * the RING pixel index, in `0..nside2npix(nside)`
pub fn ang2pix_ring(nside: u32, ra_deg: Degree, dec_deg: Degree) -> u64 {
    let nside = nside as i64;
    let z = (dec_deg.to_radians()).sin();
    let za = z.abs();
    // tt = φ / (π/2), in [0, 4)
    let tt = ra_deg.rem_euclid(360.0) / 90.0;

    if za <= 2.0 / 3.0 {
        // Equatorial region
        let temp1 = nside as f64 * (0.5 + tt);
        let temp2 = nside as f64 * z * 0.75;
        let jp = (temp1 - temp2) as i64; // ascending edge line index
        let jm = (temp1 + temp2) as i64; // descending edge line index

        // ring number counted from z = 2/3, in {1, ..., 2·nside + 1}
        let ir = nside + 1 + jp - jm;
        let kshift = 1 - (ir & 1);
        let ip = (jp + jm - nside + kshift + 1) / 2;
        let ip = ip.rem_euclid(4 * nside);

        (2 * nside * (nside - 1) + (ir - 1) * 4 * nside + ip) as u64
    } else {
        // North & South polar caps
        let tp = tt - tt.floor();
        let tmp = nside as f64 * (3.0 * (1.0 - za)).sqrt();
        let jp = (tp * tmp) as i64;
        let jm = ((1.0 - tp) * tmp) as i64;

        // ring number counted from the closest pole
        let ir = jp + jm + 1;
        let ip = (tt * ir as f64) as i64;
        let ip = ip.rem_euclid(4 * ir);

        if z > 0.0 {
            (2 * ir * (ir - 1) + ip) as u64
        } else {
            (12 * nside * nside - 2 * ir * (ir + 1) + ip) as u64
        }
    }
}

/// Sky position of the center of a RING-ordered HEALPix pixel.
///
/// Arguments
/// ---------
/// * `nside`: resolution parameter of the tiling
/// * `pix`: RING pixel index, must be `< nside2npix(nside)`
///
/// Return
/// ------
/// * `(ra_deg, dec_deg)` of the pixel center, with RA in `[0, 360)`
pub fn pix2ang_ring(nside: u32, pix: u64) -> (Degree, Degree) {
    let nside = nside as i64;
    let pix = pix as i64;
    let npix = 12 * nside * nside;
    debug_assert!(pix < npix);

    let ncap = 2 * nside * (nside - 1);
    let fact2 = 4.0 / npix as f64;
    let half_pi = std::f64::consts::FRAC_PI_2;

    let (z, phi) = if pix < ncap {
        // North polar cap
        let iring = (1 + isqrt(1 + 2 * pix)) >> 1;
        let iphi = pix + 1 - 2 * iring * (iring - 1);
        (
            1.0 - (iring * iring) as f64 * fact2,
            (iphi as f64 - 0.5) * half_pi / iring as f64,
        )
    } else if pix < npix - ncap {
        // Equatorial region
        let fact1 = 2.0 * nside as f64 * fact2;
        let ip = pix - ncap;
        let iring = ip / (4 * nside) + nside; // counted from North pole
        let iphi = ip % (4 * nside) + 1;
        // phase offset: 1 if iring + nside is odd, 1/2 otherwise
        let fodd = if (iring + nside) & 1 == 1 { 1.0 } else { 0.5 };
        (
            (2 * nside - iring) as f64 * fact1,
            (iphi as f64 - fodd) * half_pi / nside as f64,
        )
    } else {
        // South polar cap
        let ip = npix - pix;
        let iring = (1 + isqrt(2 * ip - 1)) >> 1; // counted from South pole
        let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
        (
            -1.0 + (iring * iring) as f64 * fact2,
            (iphi as f64 - 0.5) * half_pi / iring as f64,
        )
    };

    let dec_deg = z.asin().to_degrees();
    let ra_deg = phi.rem_euclid(DPI).to_degrees();
    (ra_deg, dec_deg)
}
