use approx::assert_abs_diff_eq;
use fastKde::internals::math::kde::{DensityEstimator, DensityModel, KdeParams};
use fastKde::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn uniform_cloud(n: usize, seed: u64, width: f64, height: f64) -> PointCloud<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let points: Vec<Point<f64>> = (0..n)
        .map(|_| Point::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)))
        .collect();
    PointCloud::new(points).unwrap()
}

/// Riemann sum of the density over `[x0, x1] x [y0, y1]` with spacing `step`.
fn integrate<M>(model: &M, (x0, x1): (f64, f64), (y0, y1): (f64, f64), step: f64) -> f64
where
    M: DensityModel<f64>,
{
    let nx = ((x1 - x0) / step).round() as usize + 1;
    let ny = ((y1 - y0) / step).round() as usize + 1;
    let points: Vec<Point<f64>> = (0..ny)
        .flat_map(|j| {
            (0..nx).map(move |i| Point::new(x0 + i as f64 * step, y0 + j as f64 * step))
        })
        .collect();
    model.predict(&points).iter().sum::<f64>() * step * step
}

#[test]
fn test_predict_length_and_non_negative() {
    let events = uniform_cloud(100, 7, 50.0, 80.0);
    let model = DensityEstimator::new().fit(&events).unwrap();

    let queries = vec![
        Point::new(0.0, 0.0),
        Point::new(25.0, 40.0),
        Point::new(-1000.0, 1000.0),
        Point::new(1e9, -1e9),
    ];
    let densities = model.predict(&queries);

    assert_eq!(densities.len(), queries.len());
    assert!(densities.iter().all(|d| d.is_finite() && *d >= 0.0));
    assert!(densities[1] > 0.0);
    assert_eq!(densities[3], 0.0);
    assert_eq!(model.len(), 100);
}

#[test]
fn test_density_integrates_to_one() {
    let events = uniform_cloud(200, 42, 10.0, 10.0);
    let model = DensityEstimator::new()
        .bandwidth(0.3)
        .sensitivity(0.5)
        .fit(&events)
        .unwrap();

    let mass = integrate(&model, (-10.0, 20.0), (-10.0, 20.0), 0.1);
    assert_abs_diff_eq!(mass, 1.0, epsilon = 0.01);
}

#[test]
fn test_full_covariance_density_integrates_to_one() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let points: Vec<Point<f64>> = (0..200)
        .map(|_| {
            let u: f64 = rng.gen_range(0.0..10.0);
            let v: f64 = rng.gen_range(0.0..10.0);
            Point::new(u, u + v)
        })
        .collect();
    let events = PointCloud::new(points).unwrap();

    for fast in [true, false] {
        let model = DensityEstimator::new()
            .bandwidth(0.3)
            .sensitivity(0.5)
            .fast_covariance(fast)
            .fit(&events)
            .unwrap();
        let mass = integrate(&model, (-20.0, 30.0), (-20.0, 40.0), 0.1);
        assert_abs_diff_eq!(mass, 1.0, epsilon = 0.01);
    }
}

#[test]
fn test_outlier_gets_wider_kernel() {
    let mut points: Vec<Point<f64>> = (0..20)
        .map(|i| Point::new((i % 5) as f64 * 0.1, (i / 5) as f64 * 0.1))
        .collect();
    points.push(Point::new(50.0, 50.0));
    let events = PointCloud::new(points).unwrap();

    let model = DensityEstimator::new().fit(&events).unwrap();
    let widths = model.bandwidths();
    let outlier = widths[20];

    assert_eq!(widths.len(), 21);
    assert!(widths[..20].iter().all(|&w| w < outlier));
    assert!(model.density_at(Point::new(0.2, 0.15)) > model.density_at(Point::new(25.0, 25.0)));
}

#[test]
fn test_zero_sensitivity_is_fixed_bandwidth() {
    let events = uniform_cloud(50, 11, 5.0, 5.0);
    let model = DensityEstimator::new()
        .bandwidth(0.2)
        .sensitivity(0.0)
        .fit(&events)
        .unwrap();

    for w in model.bandwidths() {
        assert_abs_diff_eq!(w, 0.2, epsilon = 1e-12);
    }
}

#[test]
fn test_fit_is_deterministic() {
    let events = uniform_cloud(150, 5, 100.0, 100.0);
    let estimator = DensityEstimator::new();
    let a = estimator.fit(&events).unwrap();
    let b = estimator.fit(&events).unwrap();

    let samples: Vec<Point<f64>> = (0..10).map(|i| Point::new(i as f64 * 10.0, 50.0)).collect();
    assert_eq!(a.predict(&samples), b.predict(&samples));
    assert_eq!(a, b);
}

#[test]
fn test_f32_fit() {
    let points: Vec<(f32, f32)> = (0..30)
        .map(|i| ((i % 6) as f32, (i / 6) as f32 * 1.5))
        .collect();
    let events = points.to_point_cloud().unwrap();
    let model = DensityEstimator::<f32>::new().fit(&events).unwrap();

    let d = model.density_at(Point::new(2.5f32, 3.0f32));
    assert!(d.is_finite() && d > 0.0);
}

#[test]
fn test_repeated_single_point() {
    let events = vec![(3.0, 4.0); 10].to_point_cloud().unwrap();
    let err = DensityEstimator::new().fit(&events).unwrap_err();

    assert!(matches!(
        err,
        DensityError::TooFewDistinctPoints { got: 1, min: 2 }
    ));
    assert_eq!(err.kind(), ErrorKind::Fit);
}

#[test] // Events on a horizontal line fit with unit scale across the line
fn test_flat_axis_fits() {
    let events = vec![(0.0, 5.0), (1.0, 5.0), (3.0, 5.0)]
        .to_point_cloud()
        .unwrap();

    for fast in [true, false] {
        let model = DensityEstimator::new()
            .fast_covariance(fast)
            .fit(&events)
            .unwrap();
        let on_line: f64 = model.density_at(Point::new(1.0, 5.0));
        let off_line = model.density_at(Point::new(1.0, 6.0));

        assert!(on_line.is_finite() && on_line > 0.0);
        assert!(off_line < on_line);
        assert_abs_diff_eq!(
            model.density_at(Point::new(1.0, 4.0)),
            off_line,
            epsilon = 1e-12
        );
    }

    let vertical = vec![(2.0, 0.0), (2.0, 1.0), (2.0, 4.0)]
        .to_point_cloud()
        .unwrap();
    assert!(DensityEstimator::new().fit(&vertical).is_ok());
}

#[test]
fn test_collinear_points_full_covariance() {
    let points: Vec<(f64, f64)> = (0..10)
        .map(|i| (i as f64, 2.0 * i as f64 + 1.0))
        .collect();
    let events = points.to_point_cloud().unwrap();

    let err = DensityEstimator::new()
        .fast_covariance(false)
        .fit(&events)
        .unwrap_err();
    assert!(matches!(err, DensityError::SingularCovariance(_)));

    // The diagonal approximation only needs spread on each axis
    assert!(DensityEstimator::new().fit(&events).is_ok());
}

#[test]
fn test_empty_cloud() {
    let events = PointCloud::<f64>::new(Vec::new()).unwrap();
    let err = DensityEstimator::new().fit(&events).unwrap_err();

    assert!(matches!(err, DensityError::EmptyInput));
}

#[test]
fn test_invalid_parameters() {
    let events = uniform_cloud(10, 1, 1.0, 1.0);

    for h in [0.0, -0.1, f64::NAN, f64::INFINITY] {
        let err = DensityEstimator::new().bandwidth(h).fit(&events).unwrap_err();
        assert!(matches!(err, DensityError::InvalidBandwidth(_)));
        assert_eq!(err.kind(), ErrorKind::Config);
    }
    for a in [-0.01, 1.5, f64::NAN] {
        let err = DensityEstimator::new().sensitivity(a).fit(&events).unwrap_err();
        assert!(matches!(err, DensityError::InvalidSensitivity(_)));
    }

    let params = KdeParams::<f64>::default();
    assert_eq!(params.bandwidth, 0.1);
    assert_eq!(params.sensitivity, 0.999);
    assert!(params.fast_covariance);
    assert!(params.validate().is_ok());
}
