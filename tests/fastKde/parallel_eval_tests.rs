use fastKde::internals::engine::executor::{ParallelGridEvaluator, DEFAULT_CHUNK_SIZE};
use fastKde::internals::math::grid::{Grid, GridBuilder};
use fastKde::internals::math::kde::{AdaptiveKde, DensityEstimator, DensityModel};
use fastKde::internals::primitives::timing::StageTimer;
use fastKde::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn fitted(n: usize, resolution: usize) -> (AdaptiveKde<f64>, Grid<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let points: Vec<Point<f64>> = (0..n)
        .map(|_| Point::new(rng.gen_range(0.0..500.0), rng.gen_range(0.0..300.0)))
        .collect();
    let events = PointCloud::new(points).unwrap();
    let model = DensityEstimator::new().fit(&events).unwrap();
    let grid = GridBuilder::new(resolution).build(&events).unwrap();
    (model, grid)
}

struct ConstantModel(f64);

impl DensityModel<f64> for ConstantModel {
    fn predict_into(&self, _points: &[Point<f64>], out: &mut [f64]) {
        out.fill(self.0);
    }
}

struct PanickingModel;

impl DensityModel<f64> for PanickingModel {
    fn predict_into(&self, points: &[Point<f64>], out: &mut [f64]) {
        for (slot, p) in out.iter_mut().zip(points) {
            if p.x > 250.0 {
                panic!("model exploded");
            }
            *slot = 1.0;
        }
    }
}

#[test] // Chunk size is a performance knob only
fn test_chunk_size_invariance() {
    let (model, grid) = fitted(300, 40);

    let reference = ParallelGridEvaluator::new()
        .parallel(false)
        .evaluate_grid(&model, &grid)
        .unwrap();
    assert_eq!(reference.len(), 1600);

    for chunk in [7, 14, 1000, 1600, 5000] {
        let par = ParallelGridEvaluator::new()
            .chunk_size(chunk)
            .evaluate_grid(&model, &grid)
            .unwrap();
        let seq = ParallelGridEvaluator::new()
            .chunk_size(chunk)
            .parallel(false)
            .evaluate_grid(&model, &grid)
            .unwrap();
        assert_eq!(par, reference, "parallel, chunk_size = {}", chunk);
        assert_eq!(seq, reference, "sequential, chunk_size = {}", chunk);
    }
}

#[test]
fn test_grid_evaluation_matches_direct_prediction() {
    let (model, grid) = fitted(120, 25);

    let direct = model.predict(&grid.lattice());
    let evaluated = ParallelGridEvaluator::new()
        .chunk_size(33)
        .workers(2)
        .evaluate_grid(&model, &grid)
        .unwrap();

    assert_eq!(evaluated, direct);
    assert!(evaluated.iter().all(|&d| d.is_finite() && d >= 0.0));
}

#[test]
fn test_evaluate_points_preserves_order() {
    let (model, _) = fitted(80, 2);
    let points: Vec<Point<f64>> = (0..57)
        .map(|i| Point::new(i as f64 * 9.0, 300.0 - i as f64 * 5.0))
        .collect();

    let evaluated = ParallelGridEvaluator::new()
        .chunk_size(5)
        .evaluate_points(&model, &points)
        .unwrap();

    for (p, d) in points.iter().zip(&evaluated) {
        assert_eq!(*d, model.density_at(*p));
    }
}

#[test]
fn test_empty_point_list() {
    let none: Vec<Point<f64>> = Vec::new();
    let evaluated = ParallelGridEvaluator::new()
        .evaluate_points(&ConstantModel(1.0), &none)
        .unwrap();
    assert!(evaluated.is_empty());
}

#[test]
fn test_cancelled_before_start() {
    let (model, grid) = fitted(50, 30);
    let token = CancellationToken::new();
    token.cancel();

    let err = ParallelGridEvaluator::new()
        .chunk_size(100)
        .cancellation(token.clone())
        .evaluate_grid(&model, &grid)
        .unwrap_err();

    assert!(matches!(err, DensityError::Cancelled { total: 9, .. }));
    assert_eq!(err.kind(), ErrorKind::Compute);
    assert!(token.is_cancelled());
}

#[test]
fn test_cancelled_sequential() {
    let (model, grid) = fitted(50, 30);
    let token = CancellationToken::new();
    token.cancel();

    let err = ParallelGridEvaluator::new()
        .parallel(false)
        .cancellation(token)
        .evaluate_grid(&model, &grid)
        .unwrap_err();

    assert!(matches!(
        err,
        DensityError::Cancelled {
            completed: 0,
            total: 1
        }
    ));
}

#[test]
fn test_worker_panic_becomes_chunk_failure() {
    let (_, grid) = fitted(50, 20);

    for parallel in [true, false] {
        let err = ParallelGridEvaluator::new()
            .chunk_size(10)
            .parallel(parallel)
            .evaluate_grid(&PanickingModel, &grid)
            .unwrap_err();

        match err {
            DensityError::ChunkFailed { reason, .. } => assert!(reason.contains("model exploded")),
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn test_non_finite_density_rejected() {
    let (_, grid) = fitted(50, 10);

    for bad in [f64::NAN, f64::INFINITY, -1.0] {
        let err = ParallelGridEvaluator::new()
            .chunk_size(10)
            .parallel(false)
            .evaluate_grid(&ConstantModel(bad), &grid)
            .unwrap_err();
        assert!(matches!(err, DensityError::ChunkFailed { chunk: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::Compute);
    }
}

#[test]
fn test_chunk_size_setting() {
    assert_eq!(ParallelGridEvaluator::new().get_chunk_size(), DEFAULT_CHUNK_SIZE);
    assert_eq!(ParallelGridEvaluator::new().chunk_size(7).get_chunk_size(), 7);
}

#[test]
fn test_stage_timer_measures_elapsed() {
    let timer = StageTimer::start("evaluate");
    std::thread::sleep(std::time::Duration::from_millis(5));
    let first = timer.elapsed();

    assert!(first >= std::time::Duration::from_millis(5));
    assert!(timer.elapsed() >= first);
}

#[test]
fn test_invalid_evaluator_settings() {
    let (model, grid) = fitted(50, 10);

    let err = ParallelGridEvaluator::new()
        .chunk_size(0)
        .evaluate_grid(&model, &grid)
        .unwrap_err();
    assert!(matches!(err, DensityError::InvalidChunkSize { got: 0, min: 1 }));

    let err = ParallelGridEvaluator::new()
        .workers(0)
        .evaluate_grid(&model, &grid)
        .unwrap_err();
    assert!(matches!(err, DensityError::InvalidConfig(_)));
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_trait_object_model() {
    let (model, grid) = fitted(60, 12);
    let dynamic: &dyn DensityModel<f64> = &model;

    let a = ParallelGridEvaluator::new()
        .chunk_size(16)
        .evaluate_grid(dynamic, &grid)
        .unwrap();
    let b = ParallelGridEvaluator::new()
        .chunk_size(16)
        .evaluate_grid(&model, &grid)
        .unwrap();
    assert_eq!(a, b);
}
