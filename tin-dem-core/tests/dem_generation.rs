//! End to end elevation grid generation on small hand-checked inputs.

use approx::assert_relative_eq;
use tin_dem_core::prelude::*;

fn split(points: &[[f64; 3]]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    (
        points.iter().map(|p| p[0]).collect(),
        points.iter().map(|p| p[1]).collect(),
        points.iter().map(|p| p[2]).collect(),
    )
}

fn terrain() -> Vec<[f64; 3]> {
    let mut points = vec![];
    for i in 0..9 {
        for j in 0..7 {
            let x = i as f64 * 1.7 + (j % 2) as f64 * 0.4;
            let y = j as f64 * 1.3 + (i % 3) as f64 * 0.2;
            points.push([x, y, (x * 0.3).sin() * 4.0 + y * 0.5]);
        }
    }
    points
}

#[test]
fn test_three_point_grid() {
    let (x, y, z) = split(&[[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 2.0]]);
    let settings = DemSettings {
        background: Some(-1.0),
        ..Default::default()
    };
    let output = generate_dem(x, y, z, &settings).unwrap();
    assert_eq!(output.grid.width(), 2);
    assert_eq!(output.grid.height(), 2);
    assert_eq!(output.grid.value(0, 0), Some(2.0));
    assert_eq!(output.grid.value(0, 1), Some(-1.0));
    assert_eq!(output.grid.value(1, 0), Some(0.0));
    assert_eq!(output.grid.value(1, 1), Some(1.0));
    assert_eq!(output.triangulation.triangles().len(), 1);
}

#[test]
fn test_collinear_input() {
    let (x, y, z) = split(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0], [3.0, 3.0, 3.0]]);
    assert_eq!(
        generate_dem(x, y, z, &DemSettings::default()),
        Err(TinError::AllPointsCollinear)
    );
}

#[test]
fn test_insufficient_points() {
    let (x, y, z) = split(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
    assert_eq!(
        generate_dem(x, y, z, &DemSettings::default()),
        Err(TinError::InsufficientPoints { remaining: 2 })
    );
    let (x, y, z) = split(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [1.0, 1.0, 5.0]]);
    assert_eq!(
        generate_dem(x, y, z, &DemSettings::default()),
        Err(TinError::InsufficientPoints { remaining: 2 })
    );
}

#[test]
fn test_mismatched_lengths() {
    assert_eq!(
        generate_dem(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0], &DemSettings::default()),
        Err(TinError::MismatchedLengths { x: 2, y: 1, z: 2 })
    );
}

#[test]
fn test_duplicates_removed() {
    let mut points = terrain();
    let copies = points
        .iter()
        .step_by(5)
        .map(|p| [p[0] + 1.0e-12, p[1], p[2] + 3.0])
        .collect::<Vec<_>>();
    let count = copies.len();
    points.extend(copies);
    let (x, y, z) = split(&points);
    let settings = DemSettings {
        tolerance: 1.0e-9,
        ..Default::default()
    };
    let output = generate_dem(x, y, z, &settings).unwrap();
    assert_eq!(output.triangulation.removed_doublets(), count);
    assert_eq!(output.triangulation.points().len(), points.len() - count);
    assert_eq!(output.triangulation.validate(), Ok(()));
}

#[test]
fn test_long_edges_are_background() {
    let (x, y, z) = split(&[[0.0, 0.0, 1.0], [10.0, 0.0, 2.0], [0.0, 10.0, 3.0]]);
    let settings = DemSettings {
        background: Some(-1.0),
        max_edge_length: 5.0,
        ..Default::default()
    };
    let output = generate_dem(x, y, z, &settings).unwrap();
    assert_eq!(output.grid.width(), 11);
    assert_eq!(output.grid.height(), 11);
    assert!(output.grid.values().iter().all(|v| *v == -1.0));
    assert_eq!(output.grid.min_max(), None);
}

#[test]
fn test_stepwise_matches_one_shot() {
    let (x, y, z) = split(&terrain());
    let settings = DemSettings {
        pixel_size: 0.5,
        ..Default::default()
    };
    let expected = generate_dem(x.clone(), y.clone(), z.clone(), &settings).unwrap();

    let mut generator = DemGenerator::new(x, y, z, settings).unwrap();
    let mut stages = vec![generator.stage()];
    while generator.process().unwrap() == ProcessStatus::InProgress {
        let stage = generator.stage();
        if stages.last() != Some(&stage) {
            stages.push(stage);
        }
    }
    assert_eq!(
        stages,
        vec![
            GeneratorStage::Preparing,
            GeneratorStage::Triangulating,
            GeneratorStage::Rasterizing,
        ]
    );
    assert_eq!(generator.stage(), GeneratorStage::Completed);
    assert_eq!(generator.process(), Err(TinError::AlreadyCompleted));

    let output = generator.into_output().unwrap();
    assert_eq!(output.triangulation, expected.triangulation);
    assert_eq!(output.grid.metadata(), expected.grid.metadata());
    for (a, b) in output.grid.values().iter().zip(expected.grid.values()) {
        assert_relative_eq!(a, b, epsilon = 1.0e-9);
    }
}

#[test]
fn test_samples_are_reproduced_at_pixel_centers() {
    let points = (0..6)
        .flat_map(|i| (0..6).map(move |j| [i as f64 * 2.0, j as f64 * 2.0, (i * j) as f64]))
        .collect::<Vec<_>>();
    let (x, y, z) = split(&points);
    let settings = DemSettings {
        pixel_size: 2.0,
        ..Default::default()
    };
    let output = generate_dem(x, y, z, &settings).unwrap();
    for point in &points {
        let value = output
            .grid
            .value_at_point(Coord::new(point[0], point[1]))
            .unwrap();
        assert_relative_eq!(value, point[2], epsilon = 1.0e-9);
    }
}

#[test]
fn test_oversized_grid_is_rejected() {
    let (x, y, z) = split(&[[0.0, 0.0, 0.0], [1.0e10, 0.0, 1.0], [0.0, 1.0e10, 2.0]]);
    let settings = DemSettings {
        pixel_size: 1.0e-6,
        ..Default::default()
    };
    assert!(matches!(
        generate_dem(x, y, z, &settings),
        Err(TinError::GridTooLarge { .. })
    ));
}

#[test]
fn test_lowest_samples_have_data() {
    let (x, y, z) = split(&[[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 2.0]]);
    let output = generate_dem(x, y, z, &DemSettings::default()).unwrap();
    assert_eq!(output.grid.metadata().background, 0.0);
    assert_eq!(
        output.grid.data_iter().collect::<Vec<_>>(),
        vec![Some(2.0), None, Some(0.0), Some(1.0)]
    );
    assert_eq!(output.grid.min_max(), Some((0.0, 2.0)));
}
