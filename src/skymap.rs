//! # Healpix map construction and persistence
//!
//! Bins catalog positions into RING-ordered healpix maps and persists the
//! resulting arrays in the NumPy `.npy` format (version 1.0, little-endian
//! `<f8`, C order), which is what the downstream clustering analysis reads.
//!
//! Two binning flavors are provided through the `in_deg2` flag of
//! [`build_healpix_map`]:
//! - raw weighted counts per pixel, used for the tracer catalogs;
//! - counts divided by the pixel area in deg², used for the random catalogs
//!   whose generation density per deg² is known.

use std::fs::File as StdFile;
use std::io::{BufReader, BufWriter, Read, Write};

use camino::Utf8Path;

use crate::constants::{Degree, HealpixMap};
use crate::desimap_errors::DesimapError;
use crate::healpix::{ang2pix_ring, nside2npix, pixel_area_deg2};

/// Accumulate sky positions into a RING-ordered healpix map.
///
/// Arguments
/// ---------
/// * `nside`: resolution parameter of the map
/// * `ra`: right ascensions in degrees
/// * `dec`: declinations in degrees, same length as `ra`
/// * `weights`: optional per-object weights; objects count as 1 when absent
/// * `in_deg2`: when set, the map is divided by the pixel area so that values
///   are densities per square degree instead of raw counts
///
/// Return
/// ------
/// * a map of length `12·nside²`
pub fn build_healpix_map(
    nside: u32,
    ra: &[Degree],
    dec: &[Degree],
    weights: Option<&[f64]>,
    in_deg2: bool,
) -> Result<HealpixMap, DesimapError> {
    if ra.len() != dec.len() {
        return Err(DesimapError::CoordinateLengthMismatch {
            ra_len: ra.len(),
            dec_len: dec.len(),
        });
    }
    if let Some(w) = weights {
        if w.len() != ra.len() {
            return Err(DesimapError::WeightLengthMismatch {
                weights_len: w.len(),
                expected: ra.len(),
            });
        }
    }

    let mut map = vec![0.0; nside2npix(nside) as usize];
    for (i, (&ra_i, &dec_i)) in ra.iter().zip(dec).enumerate() {
        let pix = ang2pix_ring(nside, ra_i, dec_i) as usize;
        map[pix] += weights.map_or(1.0, |w| w[i]);
    }

    if in_deg2 {
        let area = pixel_area_deg2(nside);
        for value in &mut map {
            *value /= area;
        }
    }
    Ok(map)
}

/// Output filename of the per-pixel counts map.
pub fn map_filename(version: &str, tracer: &str, nside: u32) -> String {
    format!("{version}_{tracer}_{nside}.npy")
}

/// Output filename of the fractional-area map.
pub fn fracarea_filename(version: &str, tracer: &str, nside: u32) -> String {
    format!("{version}_{tracer}_fracarea_{nside}.npy")
}

// -------------------------------------------------------------------------------------------------
// npy serialization
// -------------------------------------------------------------------------------------------------

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Write a flat f64 array as an npy file (format 1.0, `<f8`, C order).
///
/// The header is padded with spaces so that the data section starts on a
/// 64-byte boundary, as required by the NumPy format specification.
pub fn write_npy(path: &Utf8Path, values: &[f64]) -> Result<(), DesimapError> {
    let mut writer = BufWriter::new(StdFile::create(path)?);

    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({},), }}",
        values.len()
    );
    // magic (6) + version (2) + header length (2) + dict + padding + '\n'
    let unpadded = NPY_MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_len = (dict.len() + padding + 1) as u16;

    writer.write_all(NPY_MAGIC)?;
    writer.write_all(&[0x01, 0x00])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(dict.as_bytes())?;
    writer.write_all(&vec![b' '; padding])?;
    writer.write_all(b"\n")?;

    for value in values {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read back a flat `<f8` npy file written by [`write_npy`].
///
/// Accepts any npy 1.x file holding a one-dimensional little-endian f64 array;
/// used by the test suites to inspect pipeline outputs.
pub fn read_npy(path: &Utf8Path) -> Result<Vec<f64>, DesimapError> {
    let invalid = |reason: &str| DesimapError::InvalidNpyFile {
        file: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut reader = BufReader::new(StdFile::open(path)?);
    let mut preamble = [0u8; 10];
    reader.read_exact(&mut preamble)?;
    if &preamble[..6] != NPY_MAGIC {
        return Err(invalid("bad magic"));
    }
    if preamble[6] != 1 {
        return Err(invalid("unsupported npy major version"));
    }
    let header_len = u16::from_le_bytes([preamble[8], preamble[9]]) as usize;

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8(header).map_err(|_| invalid("non-ASCII header"))?;
    if !header.contains("'<f8'") {
        return Err(invalid("dtype is not <f8"));
    }
    if !header.contains("'fortran_order': False") {
        return Err(invalid("fortran-ordered arrays are not supported"));
    }

    let shape_start = header.find('(').ok_or_else(|| invalid("missing shape"))?;
    let shape_end = header[shape_start..]
        .find(')')
        .ok_or_else(|| invalid("missing shape"))?
        + shape_start;
    let len: usize = header[shape_start + 1..shape_end]
        .trim_end_matches(',')
        .trim()
        .parse()
        .map_err(|_| invalid("shape is not one-dimensional"))?;

    let mut values = Vec::with_capacity(len);
    let mut buf = [0u8; 8];
    for _ in 0..len {
        reader.read_exact(&mut buf)?;
        values.push(f64::from_le_bytes(buf));
    }
    Ok(values)
}

#[cfg(test)]
mod test_skymap {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn weighted_counts_land_in_one_pixel() {
        let nside = 64;
        // All objects share the same position, hence the same pixel.
        let ra = vec![142.3; 4];
        let dec = vec![-8.7; 4];
        let weights = vec![0.5, 1.0, 1.25, 2.25];

        let map = build_healpix_map(nside, &ra, &dec, Some(&weights), false).unwrap();
        let pix = ang2pix_ring(nside, ra[0], dec[0]) as usize;

        assert_eq!(map.len(), nside2npix(nside) as usize);
        assert!((map[pix] - 5.0).abs() < 1e-12);
        let elsewhere: f64 = map
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pix)
            .map(|(_, v)| v)
            .sum();
        assert_eq!(elsewhere, 0.0);
    }

    #[test]
    fn density_map_divides_by_pixel_area() {
        let nside = 32;
        let ra = vec![210.0; 7];
        let dec = vec![45.0; 7];
        let counts = build_healpix_map(nside, &ra, &dec, None, false).unwrap();
        let density = build_healpix_map(nside, &ra, &dec, None, true).unwrap();
        let pix = ang2pix_ring(nside, ra[0], dec[0]) as usize;
        assert_eq!(counts[pix], 7.0);
        assert!((density[pix] - 7.0 / pixel_area_deg2(nside)).abs() < 1e-9);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let err = build_healpix_map(8, &[0.0, 1.0], &[0.0], None, false).unwrap_err();
        assert!(matches!(err, DesimapError::CoordinateLengthMismatch { .. }));
        let err = build_healpix_map(8, &[0.0], &[0.0], Some(&[1.0, 2.0]), false).unwrap_err();
        assert!(matches!(err, DesimapError::WeightLengthMismatch { .. }));
    }

    #[test]
    fn output_filename_patterns() {
        assert_eq!(map_filename("DA02", "LRG", 128), "DA02_LRG_128.npy");
        assert_eq!(
            fracarea_filename("DA02", "LRG", 128),
            "DA02_LRG_fracarea_128.npy"
        );
    }

    #[test]
    fn npy_round_trip_preserves_values_and_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("map.npy")).unwrap();

        let values = vec![0.0, 1.5, f64::NAN, -2.25e10, 1e-300];
        write_npy(&path, &values).unwrap();

        // Data section must start on a 64-byte boundary.
        let raw = std::fs::read(&path).unwrap();
        assert_eq!((raw.len() - values.len() * 8) % 64, 0);

        let back = read_npy(&path).unwrap();
        assert_eq!(back.len(), values.len());
        for (a, b) in values.iter().zip(&back) {
            assert!(a.is_nan() && b.is_nan() || a == b);
        }
    }
}
