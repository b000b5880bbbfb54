use rand::Rng;

use workspace_engine::{
    BoxClassifier, Classification, ClassifyConfig, ExtentTag, Grid, Interval, KrawczykOperator,
    RunOptions, Scheme, Side, Traversal, WorkspaceMapper, presets, traverse,
};

fn iv(lo: f64, hi: f64) -> Interval {
    Interval::new(lo, hi).expect("valid interval")
}

fn two_rpr_classifier(operator: &KrawczykOperator, scheme: Scheme) -> BoxClassifier<'_> {
    let mechanism = presets::two_rpr();
    BoxClassifier::new(operator, scheme, ClassifyConfig::from_mechanism(&mechanism))
        .expect("valid configuration")
}

#[test]
fn two_rpr_terminal_cells_end_to_end() {
    let operator = KrawczykOperator::synthesize(&presets::two_rpr()).expect("synthesizable");
    let classifier = two_rpr_classifier(&operator, Scheme::Classical);

    // Beyond the rods' maximum length on both anchors.
    assert_eq!(
        classifier.classify(&[iv(20.0, 21.0), iv(20.0, 21.0)]),
        Classification::Outside
    );
    // Both rod lengths stay well within [3, 15] over the whole cell.
    assert_eq!(
        classifier.classify(&[iv(9.0, 10.0), iv(1.0, 2.0)]),
        Classification::Inside
    );
    // Straddles the first rod's maximum length.
    assert_eq!(
        classifier.classify(&[iv(14.9, 15.1), iv(0.0, 1.0)]),
        Classification::Border
    );
    // Close to the second anchor: the second rod would be shorter than its
    // minimum, found by refinement rather than the first evaluation.
    assert_eq!(
        classifier.classify(&[iv(5.0, 6.0), iv(0.0, 1.0)]),
        Classification::Outside
    );
}

#[test]
fn schemes_agree_on_certified_cells() {
    let operator = KrawczykOperator::synthesize(&presets::two_rpr()).expect("synthesizable");
    let classical = two_rpr_classifier(&operator, Scheme::Classical);
    let variants = [Scheme::BoundaryEnhanced, Scheme::Bicentered, Scheme::Unified];

    let cells = [
        [iv(9.0, 10.0), iv(1.0, 2.0)],
        [iv(4.0, 5.0), iv(4.0, 5.0)],
        [iv(14.9, 15.1), iv(0.0, 1.0)],
        [iv(5.0, 6.0), iv(0.0, 1.0)],
        [iv(20.0, 21.0), iv(20.0, 21.0)],
    ];

    for cell in &cells {
        let reference = classical.classify(cell);
        for scheme in variants {
            let variant = two_rpr_classifier(&operator, scheme);
            let result = variant.classify(cell);
            match reference {
                // A certified answer may weaken to Border but never flip.
                Classification::Inside => assert_ne!(
                    result,
                    Classification::Outside,
                    "{} contradicted inside cell",
                    scheme.name()
                ),
                Classification::Outside => assert_ne!(
                    result,
                    Classification::Inside,
                    "{} contradicted outside cell",
                    scheme.name()
                ),
                Classification::Border => {}
            }
        }
    }
}

#[test]
fn subdivision_agrees_with_uniform_scan() {
    let mechanism = presets::two_rpr();
    let operator = KrawczykOperator::synthesize(&mechanism).expect("synthesizable");
    let classifier = two_rpr_classifier(&operator, Scheme::Classical);
    let (lo, hi) = mechanism.grid_span();
    let grid = Grid::uniform(lo, hi, 10).expect("valid grid");

    let subdivided = traverse::subdivide(&grid, &classifier);
    assert!(!subdivided.area.is_empty());

    // Every cell the subdivision certifies must at least survive the
    // full-domain outside test of the uniform classifier, and every cell
    // the uniform classifier certifies must be covered by the subdivision:
    // restricting the configuration box only sharpens the contraction.
    let xleft = subdivided.area.extents(ExtentTag {
        axis: 0,
        side: Side::Lower,
    });
    let yleft = subdivided.area.extents(ExtentTag {
        axis: 1,
        side: Side::Lower,
    });
    for cell in grid.cells() {
        let recorded = xleft
            .iter()
            .zip(yleft)
            .any(|(&x, &y)| (x - cell[0].lo()).abs() < 1e-12 && (y - cell[1].lo()).abs() < 1e-12);
        match classifier.classify(&cell) {
            Classification::Outside => assert!(
                !recorded,
                "subdivision certified a provably outside cell at ({}, {})",
                cell[0].lo(),
                cell[1].lo()
            ),
            Classification::Inside => assert!(
                recorded,
                "subdivision missed a certified inside cell at ({}, {})",
                cell[0].lo(),
                cell[1].lo()
            ),
            Classification::Border => {}
        }
    }
}

#[test]
fn outside_cells_contain_no_reachable_point() {
    let mechanism = presets::two_rpr();
    let operator = KrawczykOperator::synthesize(&mechanism).expect("synthesizable");
    let classifier = two_rpr_classifier(&operator, Scheme::Classical);
    let (lo, hi) = mechanism.grid_span();
    let grid = Grid::uniform(lo, hi, 10).expect("valid grid");
    let d = 6.0;

    let mut rng = rand::rng();
    let mut checked = 0usize;
    for cell in grid.cells() {
        if classifier.classify(&cell) != Classification::Outside {
            continue;
        }
        checked += 1;
        for _ in 0..200 {
            let x = rng.random_range(cell[0].lo()..=cell[0].hi());
            let y = rng.random_range(cell[1].lo()..=cell[1].hi());
            let rod1 = x.hypot(y);
            let rod2 = (x - d).hypot(y);
            let reachable = (3.0..=15.0).contains(&rod1) && (3.0..=15.0).contains(&rod2);
            assert!(!reachable, "outside cell contains reachable point ({x}, {y})");
        }
    }
    assert!(checked > 0, "scan found no outside cells to sample");
}

#[test]
fn mapper_reports_consistent_buckets_across_traversals() {
    let mapper = WorkspaceMapper::new(presets::two_rpr()).expect("synthesizable");
    let uniform = mapper
        .run(&RunOptions {
            resolution: 10,
            ..RunOptions::default()
        })
        .expect("uniform run");
    let subdivided = mapper
        .run(&RunOptions {
            resolution: 10,
            traversal: Traversal::Subdivision,
            ..RunOptions::default()
        })
        .expect("subdivision run");

    assert!(!uniform.area.is_empty());
    assert!(!subdivided.area.is_empty());
    let total = 10 * 10;
    assert!(uniform.area.len() + uniform.border.len() <= total);
    assert!(subdivided.area.len() + subdivided.border.len() <= total);
}

#[test]
fn dextar_maps_with_unified_scheme() {
    let mapper = WorkspaceMapper::new(presets::dextar()).expect("synthesizable");
    let outcome = mapper
        .run(&RunOptions {
            resolution: 5,
            scheme: Scheme::Unified,
            ..RunOptions::default()
        })
        .expect("run succeeds");
    // Four angular unknowns rarely certify at this coarse resolution, but
    // the buckets must stay within the grid.
    assert!(outcome.area.len() + outcome.border.len() <= 25);
}

#[test]
fn report_serializes_named_extent_lanes() {
    let mapper = WorkspaceMapper::new(presets::two_rpr()).expect("synthesizable");
    let outcome = mapper
        .run(&RunOptions {
            resolution: 6,
            ..RunOptions::default()
        })
        .expect("run succeeds");
    let json = serde_json::to_value(&outcome).expect("serializable");
    assert!(json["area"]["xleft"].is_array());
    assert!(json["border"]["yright"].is_array());
}
