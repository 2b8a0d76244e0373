use approx::assert_relative_eq;
use camino::Utf8PathBuf;

use desimap::catalog::{clustering_filename, random_filename, ClusteringCatalog};
use desimap::collect::save_desi_data;
use desimap::constants::{RANDOM_DENSITY_PER_DEG2, RANDOM_SHARD_COUNT};
use desimap::desimap_errors::DesimapError;
use desimap::healpix::{ang2pix_ring, nside2npix, pix2ang_ring, pixel_area_deg2};
use desimap::skymap::read_npy;

mod common;

fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path).unwrap()
}

#[test]
fn pipeline_builds_counts_and_fracarea_maps() {
    let nside = 128u32;
    let tracer = "LRG";
    let scratch = tempfile::tempdir().unwrap();
    let lss = utf8(scratch.path().join("lss"));
    let dir_out = utf8(scratch.path().join("out"));
    std::fs::create_dir_all(&lss).unwrap();
    std::fs::create_dir_all(&dir_out).unwrap();

    // Two pixels of interest, addressed through their centers so every
    // synthetic object falls unambiguously inside them.
    let full_pix = ang2pix_ring(nside, 150.0, 20.0) as usize;
    let (full_ra, full_dec) = pix2ang_ring(nside, full_pix as u64);
    let sparse_pix = ang2pix_ring(nside, 10.0, -20.0) as usize;
    let (sparse_ra, sparse_dec) = pix2ang_ring(nside, sparse_pix as u64);

    // Clustering catalog: three LRGs inside the (0.4, 1.1) window in the full
    // pixel, two objects exactly at the window bounds (must be cut), and one
    // object in the sparse pixel.
    let ra = [full_ra, full_ra, full_ra, full_ra, full_ra, sparse_ra];
    let dec = [full_dec, full_dec, full_dec, full_dec, full_dec, sparse_dec];
    let z = [0.7, 0.8, 1.0, 0.4, 1.1, 0.9];
    let weight = [0.5, 1.5, 2.0, 10.0, 10.0, 1.0];
    common::write_bintable(
        &lss.join(clustering_filename(tracer)),
        &[
            ("RA", &ra[..]),
            ("DEC", &dec[..]),
            ("Z", &z[..]),
            ("WEIGHT_COMP", &weight[..]),
        ],
    );

    // Random shards: the full pixel receives the nominal 2500 randoms per
    // deg2 in every shard (rounded to an integer count), the sparse pixel a
    // handful, everything else nothing.
    let pixel_area = pixel_area_deg2(nside);
    let n_full_per_shard = (RANDOM_DENSITY_PER_DEG2 * pixel_area).round() as usize;
    let n_sparse_per_shard = 10usize;
    let mut shard_ra = vec![full_ra; n_full_per_shard];
    let mut shard_dec = vec![full_dec; n_full_per_shard];
    shard_ra.extend(vec![sparse_ra; n_sparse_per_shard]);
    shard_dec.extend(vec![sparse_dec; n_sparse_per_shard]);
    let shard_z = vec![0.5; shard_ra.len()];
    for shard in 0..RANDOM_SHARD_COUNT {
        common::write_bintable(
            &lss.join(random_filename(tracer, shard)),
            &[
                ("RA", &shard_ra[..]),
                ("DEC", &shard_dec[..]),
                ("Z", &shard_z[..]),
            ],
        );
    }

    save_desi_data(&lss, "DA02", tracer, nside, &dir_out).unwrap();

    let counts = read_npy(&dir_out.join("DA02_LRG_128.npy")).unwrap();
    let fracarea = read_npy(&dir_out.join("DA02_LRG_fracarea_128.npy")).unwrap();

    let npix = nside2npix(nside) as usize;
    assert_eq!(counts.len(), npix);
    assert_eq!(fracarea.len(), npix);

    // Weighted counts: the bound objects were cut, the in-window weights sum.
    assert_relative_eq!(counts[full_pix], 4.0, epsilon = 1e-12);
    assert_relative_eq!(counts[sparse_pix], 1.0, epsilon = 1e-12);
    assert_relative_eq!(counts.iter().sum::<f64>(), 5.0, epsilon = 1e-12);

    // The fully sampled pixel sits at unit fracarea, up to the integer
    // rounding of the synthetic shard counts.
    let n_total = (RANDOM_SHARD_COUNT * n_full_per_shard) as f64;
    let expected = n_total / (pixel_area * RANDOM_SHARD_COUNT as f64 * RANDOM_DENSITY_PER_DEG2);
    assert_relative_eq!(fracarea[full_pix], expected, epsilon = 1e-9);
    assert!((fracarea[full_pix] - 1.0).abs() < 2e-3);

    // Undersampled pixel: masked as an outlier even though it holds objects.
    assert!(fracarea[sparse_pix].is_nan());
    // Pixel with no randoms at all: NaN, never zero.
    let empty_pix = ang2pix_ring(nside, 260.0, 60.0) as usize;
    assert_eq!(counts[empty_pix], 0.0);
    assert!(fracarea[empty_pix].is_nan());
}

#[test]
fn missing_weight_column_is_reported() {
    let scratch = tempfile::tempdir().unwrap();
    let path = utf8(scratch.path().join("no_weight.fits"));
    common::write_bintable(
        &path,
        &[("RA", &[1.0][..]), ("DEC", &[2.0][..]), ("Z", &[0.5][..])],
    );

    let err = ClusteringCatalog::from_fits(&path).unwrap_err();
    match err {
        DesimapError::ColumnNotFound { column, .. } => assert_eq!(column, "WEIGHT_COMP"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn shards_are_concatenated() {
    use desimap::catalog::RandomCatalog;

    let scratch = tempfile::tempdir().unwrap();
    let lss = utf8(scratch.path().to_path_buf());
    for shard in 0..RANDOM_SHARD_COUNT {
        let ra = [shard as f64; 3];
        common::write_bintable(
            &lss.join(random_filename("QSO", shard)),
            &[("RA", &ra[..]), ("DEC", &[0.0; 3][..]), ("Z", &[1.2; 3][..])],
        );
    }

    let randoms = RandomCatalog::from_shards(&lss, "QSO").unwrap();
    assert_eq!(randoms.len(), 3 * RANDOM_SHARD_COUNT);
    // Shards appear in file order.
    assert_eq!(randoms.ra[0], 0.0);
    assert_eq!(randoms.ra[3 * RANDOM_SHARD_COUNT - 1], (RANDOM_SHARD_COUNT - 1) as f64);
}
