use approx::assert_abs_diff_eq;
use fastKde::internals::math::grid::GridBuilder;
use fastKde::internals::raster::geotiff::{read_geotiff, write_geotiff};
use fastKde::internals::raster::sampler::PointSampler;
use fastKde::internals::raster::transform::AffineTransform;
use fastKde::internals::raster::writer::{grid_transform, SurfaceRasterizer};
use fastKde::prelude::*;
use ndarray::Array2;
use tempfile::tempdir;

// ============================================================================
// Affine transform and CRS
// ============================================================================

#[test]
fn test_transform_composition_order() {
    let t = AffineTransform::translation(100.0, 200.0) * AffineTransform::scale(2.0, 0.5);

    assert_eq!(t.apply(0.0, 0.0), (100.0, 200.0));
    assert_eq!(t.apply(3.0, 4.0), (106.0, 202.0));
    assert!(t.is_axis_aligned());
    assert_abs_diff_eq!(t.determinant(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_transform_inverse() {
    let t = AffineTransform {
        a: 2.0,
        b: 0.5,
        c: 10.0,
        d: -0.25,
        e: 3.0,
        f: -4.0,
    };
    let inv = t.invert().unwrap();
    let (x, y) = t.apply(7.0, 11.0);
    let (col, row) = inv.apply(x, y);

    assert_abs_diff_eq!(col, 7.0, epsilon = 1e-9);
    assert_abs_diff_eq!(row, 11.0, epsilon = 1e-9);
    assert_eq!(t.to_pixel(x, y).0.round(), 7.0);

    assert!(AffineTransform::scale(0.0, 1.0).invert().is_none());
}

#[test]
fn test_zero_scale_axis_maps_to_first_pixel() {
    let t = AffineTransform::translation(5.0, 5.0) * AffineTransform::scale(0.0, 2.0);
    let (col, row) = t.to_pixel(123.0, 9.0);

    assert_eq!(col, 0.0);
    assert_abs_diff_eq!(row, 2.0, epsilon = 1e-12);
}

#[test]
fn test_model_transformation_tag_layout() {
    let t = AffineTransform::translation(1.0, 2.0) * AffineTransform::scale(3.0, 4.0);
    let m = t.to_model_transformation();

    assert_eq!(m.len(), 16);
    assert_eq!((m[0], m[3], m[5], m[7], m[15]), (3.0, 1.0, 4.0, 2.0, 1.0));
    assert_eq!(AffineTransform::from_model_transformation(&m), Some(t));
    assert_eq!(AffineTransform::from_model_transformation(&m[..6]), None);
}

#[test]
fn test_crs_epsg_code() {
    assert_eq!(Crs::new("EPSG:2272").epsg(), Some(2272));
    assert_eq!(Crs::new("  epsg:4326 ").epsg(), Some(4326));
    assert_eq!(Crs::new(" EPSG:2272 ").as_str(), "EPSG:2272");
    assert_eq!(Crs::new("ESRI:102729").epsg(), None);
    assert_eq!(Crs::new("local").epsg(), None);
    assert_eq!(Crs::from("EPSG:2272"), Crs::new("EPSG:2272"));
}

// ============================================================================
// GeoTIFF persistence
// ============================================================================

#[test]
fn test_geotiff_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("sample_density.tif");

    let values = Array2::from_shape_fn((3, 4), |(r, c)| (r * 10 + c) as f64 * 0.125);
    let transform = AffineTransform::translation(2_690_000.0, 230_000.0)
        * AffineTransform::scale(25.0, 30.0);
    let crs = Crs::new("EPSG:2272");

    write_geotiff(&path, &values, &transform, &crs).unwrap();
    let data = read_geotiff(&path).unwrap();

    assert_eq!(data.values, values);
    assert_eq!(data.transform, transform);
    assert_eq!(data.crs, Some(crs));
    assert!(!path.with_file_name("sample_density.tif.tmp").exists());
}

#[test]
fn test_geotiff_non_epsg_crs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local.tif");
    let values = Array2::from_elem((2, 2), 1.5);
    let crs = Crs::new("ESRI:102729");

    write_geotiff(&path, &values, &AffineTransform::identity(), &crs).unwrap();
    let data = read_geotiff(&path).unwrap();

    assert_eq!(data.crs, Some(crs));
}

#[test]
fn test_read_missing_raster() {
    let dir = tempdir().unwrap();
    let err = read_geotiff(&dir.path().join("missing.tif")).unwrap_err();

    assert!(matches!(err, DensityError::RasterIo { .. }));
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_read_corrupt_raster() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.tif");
    std::fs::write(&path, b"definitely not a tiff").unwrap();

    let err = PointSampler::open_path(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

// ============================================================================
// Rasterizer and sampler
// ============================================================================

fn lattice_fixture() -> (fastKde::internals::math::grid::Grid<f64>, Vec<f64>) {
    let events = vec![(1000.0, 2000.0), (1090.0, 2045.0), (1030.0, 2010.0)]
        .to_point_cloud()
        .unwrap();
    let grid = GridBuilder::new(10).build(&events).unwrap();
    let densities: Vec<f64> = (0..grid.len()).map(|i| i as f64 + 0.5).collect();
    (grid, densities)
}

#[test]
fn test_grid_transform_places_pixels_on_lattice() {
    let (grid, _) = lattice_fixture();
    let t = grid_transform(&grid);

    for row in 0..grid.resolution() {
        for col in 0..grid.resolution() {
            let (x, y) = t.apply(col as f64, row as f64);
            assert_abs_diff_eq!(x, grid.xs()[col], epsilon = 1e-9);
            assert_abs_diff_eq!(y, grid.ys()[row], epsilon = 1e-9);
        }
    }
}

#[test]
fn test_raster_path_is_deterministic() {
    let rasterizer = SurfaceRasterizer::new("/data/out");
    assert_eq!(
        rasterizer.raster_path("code_violations"),
        std::path::PathBuf::from("/data/out/code_violations_density.tif")
    );
}

#[test]
fn test_round_trip_at_lattice_coordinates() {
    let dir = tempdir().unwrap();
    let (grid, densities) = lattice_fixture();
    let rasterizer = SurfaceRasterizer::new(dir.path());

    let (surface, raster) = rasterizer
        .rasterize(&grid, densities.clone(), Crs::new("EPSG:2272"), "fixture")
        .unwrap();
    assert_eq!(surface.shape(), (10, 10));
    assert_eq!((raster.width, raster.height), (10, 10));
    assert_eq!(raster.path, dir.path().join("fixture_density.tif"));

    let sampler = PointSampler::open(&raster).unwrap();
    let lattice = grid.lattice();
    let sampled = sampler.sample(&lattice);

    assert_eq!(sampled, densities);
    assert_eq!(sampler.crs().as_str(), "EPSG:2272");
    assert!(sampler.ensure_crs(&Crs::new("EPSG:2272")).is_ok());
}

#[test]
fn test_sampler_truncates_between_lattice_points() {
    let dir = tempdir().unwrap();
    let (grid, densities) = lattice_fixture();
    let (_, raster) = SurfaceRasterizer::new(dir.path())
        .rasterize(&grid, densities, Crs::new("EPSG:2272"), "between")
        .unwrap();
    let sampler = PointSampler::open(&raster).unwrap();

    // Pixel size is (10, 5); a point 0.9 pixels past (col 3, row 2) stays there.
    let x = grid.xs()[3] + 9.0;
    let y = grid.ys()[2] + 4.5;
    assert_eq!(sampler.pixel_index(x, y), (2, 3));
    assert_eq!(sampler.sample_point(Point::new(x, y)), 2.0 * 10.0 + 3.0 + 0.5);
}

#[test]
fn test_sampler_clamps_out_of_bounds() {
    let dir = tempdir().unwrap();
    let (grid, densities) = lattice_fixture();
    let (_, raster) = SurfaceRasterizer::new(dir.path())
        .rasterize(&grid, densities.clone(), Crs::new("EPSG:2272"), "clamp")
        .unwrap();
    let sampler = PointSampler::open(&raster).unwrap();

    let queries = vec![
        Point::new(-1e6, -1e6),
        Point::new(1e6, 1e6),
        Point::new(-1e6, 1e6),
        Point::new(1e6, -1e6),
    ];
    let sampled = sampler.sample(&queries);

    assert_eq!(sampled[0], densities[0]);
    assert_eq!(sampled[1], densities[99]);
    assert_eq!(sampled[2], densities[90]);
    assert_eq!(sampled[3], densities[9]);

    let paired = sampler.sample_values(&queries);
    assert_eq!(paired.len(), 4);
    for (value, (query, density)) in paired.iter().zip(queries.iter().zip(&sampled)) {
        assert_eq!(value.point, *query);
        assert_eq!(value.density, *density);
    }
}

#[test]
fn test_sampler_crs_mismatch() {
    let dir = tempdir().unwrap();
    let (grid, densities) = lattice_fixture();
    let (_, raster) = SurfaceRasterizer::new(dir.path())
        .rasterize(&grid, densities, Crs::new("EPSG:2272"), "crs")
        .unwrap();
    let sampler = PointSampler::open(&raster).unwrap();

    let err = sampler.ensure_crs(&Crs::new("EPSG:4326")).unwrap_err();
    assert!(matches!(err, DensityError::InvalidRaster { .. }));
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_rasterize_overwrites_previous_file() {
    let dir = tempdir().unwrap();
    let (grid, densities) = lattice_fixture();
    let rasterizer = SurfaceRasterizer::new(dir.path());

    rasterizer
        .rasterize(&grid, densities.clone(), Crs::new("EPSG:2272"), "again")
        .unwrap();
    let doubled: Vec<f64> = densities.iter().map(|d| d * 2.0).collect();
    let (_, raster) = rasterizer
        .rasterize(&grid, doubled.clone(), Crs::new("EPSG:2272"), "again")
        .unwrap();

    let sampler = PointSampler::open(&raster).unwrap();
    assert_eq!(sampler.sample(&grid.lattice()), doubled);
}

#[test]
fn test_rasterize_rejects_wrong_length() {
    let dir = tempdir().unwrap();
    let (grid, _) = lattice_fixture();
    let err = SurfaceRasterizer::new(dir.path())
        .rasterize(&grid, vec![1.0; 7], Crs::new("EPSG:2272"), "short")
        .unwrap_err();

    assert!(matches!(err, DensityError::InvalidInput(_)));
}
