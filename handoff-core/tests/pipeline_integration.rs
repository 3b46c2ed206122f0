// Integration tests for the producer/consumer pipeline.
// Each case runs a full pipeline on real threads and checks the destination.

use handoff_core::config::PipelineConfig;
use handoff_core::pipeline::{Pipeline, PipelineError};
use proptest::prelude::*;
use std::sync::mpsc;
use std::time::Duration;

struct TestCase {
    name: &'static str,
    source: Vec<i64>,
    capacity: usize,
    square: bool,
    expected: Vec<i64>,
}

fn run_case(case: &TestCase) -> Result<Vec<i64>, PipelineError> {
    let pipeline = Pipeline::new(case.source.clone(), PipelineConfig { capacity: case.capacity });
    if case.square {
        pipeline.run_with(|x| x * x)
    } else {
        pipeline.run()
    }
}

#[test]
fn test_pipeline_scenarios_table_driven() {
    let test_cases = vec![
        TestCase {
            name: "squares of 0..9",
            source: (0..10).collect(),
            capacity: 5,
            square: true,
            expected: vec![0, 1, 4, 9, 16, 25, 36, 49, 64, 81],
        },
        TestCase {
            name: "empty source, identity",
            source: vec![],
            capacity: 5,
            square: false,
            expected: vec![],
        },
        TestCase {
            name: "capacity 3, fifty items, identity",
            source: (0..50).collect(),
            capacity: 3,
            square: false,
            expected: (0..50).collect(),
        },
        TestCase {
            name: "capacity 1, squares",
            source: (0..50).collect(),
            capacity: 1,
            square: true,
            expected: (0..50).map(|x| x * x).collect(),
        },
        TestCase {
            name: "capacity larger than source",
            source: vec![3, 1, 2],
            capacity: 100,
            square: false,
            expected: vec![3, 1, 2],
        },
    ];

    for case in &test_cases {
        let result = run_case(case).unwrap_or_else(|e| panic!("[{}] pipeline failed: {e}", case.name));
        assert_eq!(result, case.expected, "[{}] unexpected destination", case.name);
    }
}

#[test]
fn test_small_capacity_finishes_within_timeout() {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let source: Vec<u64> = (0..5_000).collect();
        let _ = tx.send(Pipeline::new(source, PipelineConfig { capacity: 3 }).run());
    });
    let result = rx
        .recv_timeout(Duration::from_secs(30))
        .expect("pipeline should not deadlock")
        .expect("pipeline should succeed");
    assert_eq!(result.len(), 5_000);
    assert!(result.iter().copied().eq(0..5_000));
}

#[test]
fn test_transform_can_change_item_type() {
    let result = Pipeline::new(vec![1, 22, 333], PipelineConfig::default())
        .run_with(|x: u32| x.to_string())
        .unwrap();
    assert_eq!(result, vec!["1", "22", "333"]);
}

#[test]
fn test_lazy_source_is_consumed_in_order() {
    let source = (0..20).filter(|x| x % 3 == 0);
    let result = Pipeline::new(source, PipelineConfig { capacity: 2 }).run().unwrap();
    assert_eq!(result, vec![0, 3, 6, 9, 12, 15, 18]);
}

proptest! {
    #[test]
    fn destination_is_mapped_source_in_order(
        source in prop::collection::vec(any::<i32>(), 0..200),
        capacity in 1usize..16,
    ) {
        let expected: Vec<i64> = source.iter().map(|&x| i64::from(x) * 2).collect();
        let result = Pipeline::new(source, PipelineConfig { capacity })
            .run_with(|x| i64::from(x) * 2)
            .unwrap();
        prop_assert_eq!(result, expected);
    }

    #[test]
    fn result_is_independent_of_capacity(
        source in prop::collection::vec(any::<u16>(), 1..100),
        small in 1usize..4,
    ) {
        let roomy = source.len() + 1;
        let a = Pipeline::new(source.clone(), PipelineConfig { capacity: small }).run().unwrap();
        let b = Pipeline::new(source, PipelineConfig { capacity: roomy }).run().unwrap();
        prop_assert_eq!(a, b);
    }
}
