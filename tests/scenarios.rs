//! End-to-end scenarios for the triangulation engine and refinement driver.
//!
//! - Corner re-insertion leaves the two-triangle seed mesh unchanged
//! - Inserting the center of a square yields four equal quarters
//! - Subdivision samples stay strictly inside the parent triangle
//! - Refinement to a 10% cutoff terminates with every triangle below it

use approx::assert_relative_eq;
use plasma_mesh::core::triangle::Triangle;
use plasma_mesh::core::vertex::VertexKey;
use plasma_mesh::prelude::*;
use slotmap::SlotMap;

fn ten_by_ten(seed: u64) -> DelaunayTriangulation {
    let options = TriangulationOptionsBuilder::default()
        .seed(seed)
        .build()
        .unwrap();
    DelaunayTriangulation::with_options(BoundingBox::from_size(10.0, 10.0).unwrap(), options)
        .unwrap()
}

// =============================================================================
// SEED MESH AND INSERTION
// =============================================================================

#[test]
fn corners_only_yield_two_half_squares() {
    let mut dt = ten_by_ten(0);
    let outcomes = dt
        .insert_points([
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
        .unwrap();

    assert!(
        outcomes
            .iter()
            .all(|o| matches!(o, InsertionOutcome::Coincident { .. }))
    );
    assert_eq!(dt.number_of_triangles(), 2);
    assert_eq!(dt.number_of_vertices(), 4);
    for (_, triangle) in dt.triangles() {
        assert_relative_eq!(triangle.area(), 50.0);
    }
    dt.validate().unwrap();
}

#[test]
fn center_insertion_yields_four_quarters() {
    let mut dt = ten_by_ten(0);
    let center = dt.insert_point(Point::new(5.0, 5.0)).unwrap().vertex_key();

    assert_eq!(dt.number_of_triangles(), 4);
    for (_, triangle) in dt.triangles() {
        assert_relative_eq!(triangle.area(), 25.0);
        assert!(triangle.has_vertex(center));
    }
    let vertex = dt.vertex(center).unwrap();
    assert_eq!(vertex.degree(), 4);
    assert_eq!(vertex.point(), Point::new(5.0, 5.0));
    dt.validate().unwrap();
}

#[test]
fn later_points_see_earlier_insertions() {
    let mut dt = ten_by_ten(0);
    let points = [
        Point::new(2.0, 2.5),
        Point::new(7.5, 3.0),
        Point::new(4.0, 8.0),
        Point::new(5.5, 5.25),
        Point::new(8.25, 8.5),
        Point::new(1.5, 6.0),
    ];
    for (i, &p) in points.iter().enumerate() {
        dt.insert_point(p).unwrap();
        // Each interior vertex adds two triangles.
        assert_eq!(dt.number_of_triangles(), 2 + 2 * (i + 1));
        dt.validate().unwrap();
    }
    assert_eq!(dt.number_of_vertices(), 4 + points.len());
}

#[test]
fn rejected_points_leave_mesh_untouched() {
    let mut dt = ten_by_ten(0);
    dt.insert_point(Point::new(4.0, 6.0)).unwrap();
    let before = dt.snapshot();

    for p in [
        Point::new(-0.1, 5.0),
        Point::new(5.0, 10.0),
        Point::new(0.0, 3.0),
        Point::new(f64::INFINITY, 2.0),
    ] {
        let err = dt.insert_point(p).unwrap_err();
        assert!(matches!(err, TriangulationError::InvalidInput(_)));
        assert!(!err.is_retriable());
    }
    assert_eq!(dt.snapshot(), before);
}

// =============================================================================
// SUBDIVISION SAMPLING
// =============================================================================

#[test]
fn samples_from_right_triangle_stay_inside() {
    use rand::SeedableRng;

    let mut keys: SlotMap<VertexKey, ()> = SlotMap::with_key();
    let (a, b, c) = (keys.insert(()), keys.insert(()), keys.insert(()));
    let triangle = Triangle::new(
        [a, b, c],
        [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ],
        0,
    )
    .unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(2024);

    for _ in 0..10_000 {
        let p = triangle.sample_interior_point(&mut rng).unwrap();
        assert!(0.0 < p.x && 0.0 < p.y && p.x + p.y < 10.0, "{p} escaped");
    }
}

#[test]
fn subdivision_point_lies_inside_its_parent() {
    for seed in 0..1_000 {
        let mut dt = ten_by_ten(seed);
        let (key, parent) = dt.largest().unwrap();
        let parent = parent.clone();

        let subdivision = dt.subdivide_triangle(key).unwrap();
        assert!(parent.contains_point(subdivision.point));
        assert_eq!(subdivision.parent.sequence(), parent.sequence());
        assert!(dt.triangle(key).is_none());
    }
}

// =============================================================================
// REFINEMENT
// =============================================================================

#[test]
fn refinement_to_ten_percent_terminates() {
    let dt = ten_by_ten(99);
    let initial_area = dt.total_area();
    let options = RefinementOptionsBuilder::default()
        .cutoff(AreaCutoff::Absolute(0.1 * initial_area))
        .max_iterations(10_000_usize)
        .build()
        .unwrap();

    let mut refiner = Refiner::new(dt, ConstantPayload(0.5), options).unwrap();
    refiner.seed([]).unwrap();
    let report = refiner.run().unwrap();

    assert_eq!(refiner.phase(), RefinementPhase::Done);
    assert!(report.iterations > 0);
    assert!(report.iterations < 1_000);
    let dt = refiner.into_triangulation();
    assert!(dt.triangles().all(|(_, t)| t.area() <= 10.0));
    assert_relative_eq!(dt.total_area(), 100.0, max_relative = 1e-9);
    dt.validate().unwrap();
}

#[test]
fn refinement_with_interpolation_and_normalization() {
    let bounds = BoundingBox::from_size(200.0, 100.0).unwrap();
    let seeds = [
        Point::new(50.0, 25.0),
        Point::new(150.0, 75.0),
        Point::new(100.0, 50.0),
        Point::new(30.0, 80.0),
    ];

    struct Perturbed(DistanceInterpolation);

    impl PayloadAssigner for Perturbed {
        fn seed_value(&mut self, point: Point) -> f64 {
            point.x / 200.0
        }

        fn subdivision_value(&mut self, context: &SubdivisionContext) -> f64 {
            self.0.subdivision_value(context) + 0.01 * context.relative_area()
        }
    }

    let (mut dt, report) = refine(
        bounds,
        seeds,
        Perturbed(DistanceInterpolation::default()),
        TriangulationOptionsBuilder::default().seed(5).build().unwrap(),
        RefinementOptionsBuilder::default()
            .cutoff(AreaCutoff::FractionOfBounds(0.005))
            .progress_interval(50_usize)
            .build()
            .unwrap(),
    )
    .unwrap();

    assert_eq!(report.seed_points, seeds.len());
    assert_eq!(report.seed_triangles, 2 + 2 * seeds.len());
    assert_relative_eq!(report.base_area, 20_000.0 / 10.0);
    assert!(dt.triangles().all(|(_, t)| t.area() <= report.cutoff));
    dt.is_valid().unwrap();

    let (min, max) = normalize_values(&mut dt).unwrap();
    assert!(min < max);
    for (_, v) in dt.vertices() {
        assert!((0.0..=1.0).contains(&v.value()));
    }
    for (key, _) in dt.triangles() {
        let mean = dt.mean_value(key).unwrap();
        assert!((0.0..=1.0).contains(&mean));
    }
}

#[test]
fn seeded_refinement_is_reproducible() {
    let run = || {
        let (dt, _) = refine(
            BoundingBox::from_size(50.0, 50.0).unwrap(),
            [Point::new(10.0, 20.0), Point::new(35.0, 15.0)],
            DistanceInterpolation::default(),
            TriangulationOptionsBuilder::default().seed(1234).build().unwrap(),
            RefinementOptionsBuilder::default()
                .cutoff(AreaCutoff::FractionOfBounds(0.01))
                .build()
                .unwrap(),
        )
        .unwrap();
        dt.snapshot()
    };
    assert_eq!(run(), run());
}

#[test]
fn refinement_of_small_domains_completes() {
    use rand::{Rng, SeedableRng};

    for size in [0.1, 1e-4] {
        let mut rng = rand::rngs::StdRng::seed_from_u64(50);
        let seeds: Vec<Point> = (0..50)
            .map(|_| {
                Point::new(
                    rng.random_range(0.01 * size..0.99 * size),
                    rng.random_range(0.01 * size..0.99 * size),
                )
            })
            .collect();

        let (dt, report) = refine(
            BoundingBox::from_size(size, size).unwrap(),
            seeds,
            DistanceInterpolation::default(),
            TriangulationOptionsBuilder::default().seed(3).build().unwrap(),
            RefinementOptions::default(),
        )
        .unwrap();

        assert_eq!(report.seed_points, 50);
        assert!(dt.triangles().all(|(_, t)| t.area() <= report.cutoff));
        assert_relative_eq!(dt.total_area(), size * size, max_relative = 1e-9);
        dt.is_valid().unwrap();
    }
}
