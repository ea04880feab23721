use crate::*;

use mural_core::config::{MuralConfig, PlannerStrategy};
use mural_core::{Codec, CodecError, CostModel, Drawing, PolygonSides};
use mural_services::{
    plan_chunk_size, PlanError, Planner, QueueError, SubmissionKind, SubmissionQueue,
};

/// Rectangle, 9-point path, triangle under a roomy ceiling.
#[test]
fn three_mixed_objects_fit_one_replace_chunk() {
    let objects = vec![rect(0), path(9), polygon(3)];
    let model = CostModel::default();
    let ceiling = model.batch_cost(&objects) + 1_000;

    assert_eq!(plan_chunk_size(&objects, ceiling, &model).unwrap(), (3, 1));

    let queue = SubmissionQueue::new(
        target(1),
        &objects,
        Codec::new(),
        &Planner::new(model, ceiling),
        SubmissionKind::Replace,
    )
    .unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.chunks()[0].kind(), SubmissionKind::Replace);
    assert_eq!(queue.chunks()[0].objects().len(), 3);
}

#[test]
fn list_under_ceiling_is_not_split() {
    let objects: Vec<_> = (0..250).map(rect).collect();
    let (size, count) = plan_chunk_size(&objects, 500_000, &CostModel::default()).unwrap();
    assert_eq!((size, count), (250, 1));
}

#[test]
fn nine_points_spill_three_into_overflow() {
    let record = Codec::new().encode(&path(9)).unwrap();
    assert_eq!(record.point_count(), 9);
    assert_eq!(record.overflow.len(), 12);
    assert_eq!(record.overflow_points(), 3);
}

#[test]
fn drawing_json_survives_encode_and_decode() {
    let json = r##"{
        "polygonSides": 5,
        "objects": [
            { "shape": "rectangle", "color": "#ff8800", "strokeWeight": 2, "points": [[0, 0], [40, 30]] },
            { "shape": 5, "color": 255, "points": [[1, -1], [2, -2], [3, -3], [4, -4], [5, -5], [6, -6], [7, -7]] },
            { "shape": "polygon", "color": "0x00ff00", "stroke_weight": 1,
              "points": [[0, 0], [10, 0], [12, 8], [5, 14], [-2, 8]] }
        ]
    }"##;
    let drawing = Drawing::from_json(json).unwrap();
    assert_eq!(drawing.polygon_sides, Some(PolygonSides::Five));

    let codec = drawing.codec();
    let records = codec.encode_many(&drawing.objects).unwrap();
    let decoded: Vec<_> = records.iter().map(|r| codec.decode(r).unwrap()).collect();
    assert_eq!(decoded, drawing.objects);
}

#[test]
fn polygon_must_match_assigned_sides() {
    let codec = Codec::with_polygon_sides(PolygonSides::Six);
    let err = SubmissionQueue::new(
        target(2),
        &[rect(0), polygon(3)],
        codec,
        &rect_planner(10),
        SubmissionKind::Replace,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        QueueError::Codec(CodecError::PointCount { actual: 3, .. })
    ));
}

#[test]
fn empty_drawing_is_refused() {
    let err = SubmissionQueue::new(
        target(3),
        &[],
        Codec::new(),
        &rect_planner(10),
        SubmissionKind::Replace,
    )
    .unwrap_err();
    assert_eq!(err, QueueError::Plan(PlanError::EmptyDrawing));
}

#[test]
fn oversized_object_names_its_index() {
    let objects = vec![rect(0), rect(1), path(2_000)];
    let err = Planner::new(CostModel::default(), 60_000).plan(&objects).unwrap_err();
    assert!(matches!(err, PlanError::ObjectExceedsCeiling { index: 2, ceiling: 60_000, .. }));
}

#[test]
fn packing_beats_naive_encoding() {
    let objects = mixed(30);
    let savings = CostModel::default().comparative_savings(&objects);
    assert!(savings.packed < savings.naive);
    assert_eq!(savings.absolute, savings.naive as i64 - savings.packed as i64);
    assert!(savings.percent > 0.0 && savings.percent < 100.0);
}

#[test]
fn config_file_drives_planner() {
    let config = MuralConfig::from_toml(
        r#"
        [gas]
        ceiling = 46400

        [planner]
        strategy = "adaptive"
        "#,
    )
    .unwrap();
    let planner = Planner::new(config.cost, config.gas.ceiling).with_strategy(config.planner.strategy);
    assert_eq!(planner.strategy(), PlannerStrategy::Adaptive);

    let objects: Vec<_> = (0..12).map(rect).collect();
    let plan = planner.plan(&objects).unwrap();
    assert_eq!(plan.chunk_size, 5);
    assert_eq!(plan.chunk_count, 3);
    assert!(planner.audit(&objects, &plan).is_empty());
}

#[test]
fn adaptive_strategy_absorbs_expensive_tail() {
    let mut objects: Vec<_> = (0..20).map(rect).collect();
    objects.extend((0..10).map(|_| path(30)));
    let uniform = rect_planner(20);
    let adaptive = rect_planner(20).with_strategy(PlannerStrategy::Adaptive);

    let plan = uniform.plan(&objects).unwrap();
    assert_eq!(plan.chunk_size, 20);
    assert!(!uniform.audit(&objects, &plan).is_empty());

    let plan = adaptive.plan(&objects).unwrap();
    assert!(adaptive.audit(&objects, &plan).is_empty());
    let covered: usize = plan.bounds().iter().map(|r| r.len()).sum();
    assert_eq!(covered, objects.len());
}
