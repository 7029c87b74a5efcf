// tests/sampler.rs
use robot_snapshots::sampler::{evenly_spaced, percentile_centers};
use robot_snapshots::{LogEntry, OutputLabel, SampleError, SampleMode, SampleSpec, select};

fn log_of(len: usize) -> Vec<LogEntry> {
    (0..len)
        .map(|i| LogEntry {
            iteration: i,
            rule_seq: vec![0],
            result: i as f64,
        })
        .collect()
}

fn iterations(labels: &[OutputLabel]) -> Vec<usize> {
    labels
        .iter()
        .map(|label| match label {
            OutputLabel::Iteration(i) | OutputLabel::Sorted(i) => *i,
            OutputLabel::Terrain(_) => usize::MAX,
        })
        .collect()
}

#[test]
fn test_windows_around_checkpoints() {
    let log = log_of(2500);
    let spec = SampleSpec::with_defaults(SampleMode::Iterations, "FlatTerrainTask");
    let picked = select(&log, &spec).unwrap();

    let labels: Vec<OutputLabel> = picked.iter().map(|s| s.label.clone()).collect();
    let rows = iterations(&labels);

    let mut expected: Vec<usize> = (0..10).collect();
    expected.extend(990..1010);
    expected.extend(1990..2010);
    expected.extend(2490..2500);
    assert_eq!(rows, expected);
    assert_eq!(picked[0].label.file_name(), "iteration_00000.png");
}

#[test]
fn test_windows_on_short_log_are_clamped() {
    let log = log_of(5);
    let spec = SampleSpec::Iterations {
        stride: 1000,
        offset: 10,
    };
    let picked = select(&log, &spec).unwrap();
    // Checkpoints 0 and 5 both cover the whole log; each row is picked once.
    let labels: Vec<OutputLabel> = picked.iter().map(|s| s.label.clone()).collect();
    assert_eq!(iterations(&labels), vec![0, 1, 2, 3, 4]);
    assert!(picked.iter().all(|s| s.entry.is_some()));
}

#[test]
fn test_overlapping_windows_pick_each_row_once() {
    let log = log_of(1005);
    let spec = SampleSpec::with_defaults(SampleMode::Iterations, "FlatTerrainTask");
    let picked = select(&log, &spec).unwrap();

    let labels: Vec<OutputLabel> = picked.iter().map(|s| s.label.clone()).collect();
    let mut expected: Vec<usize> = (0..10).collect();
    expected.extend(990..1005);
    assert_eq!(iterations(&labels), expected);
}

#[test]
fn test_percentile_windows_pick_each_position_once() {
    let log = log_of(101);
    let spec = SampleSpec::with_defaults(SampleMode::Percentiles, "FlatTerrainTask");
    let picked = select(&log, &spec).unwrap();

    // Windows of 10 either side of every tenth position cover the log once.
    let labels: Vec<OutputLabel> = picked.iter().map(|s| s.label.clone()).collect();
    assert_eq!(iterations(&labels), (0..101).collect::<Vec<_>>());
}

#[test]
fn test_block_top_returns_highest_scores_descending() {
    // 7919 is coprime to 1000, so the scores are a shuffle of 0..1000.
    let mut log = log_of(1000);
    for entry in &mut log {
        entry.result = ((entry.iteration * 7919) % 1000) as f64;
    }
    let spec = SampleSpec::with_defaults(SampleMode::IterationsTop, "FlatTerrainTask");
    let picked = select(&log, &spec).unwrap();

    let scores: Vec<f64> = picked.iter().map(|s| s.entry.unwrap().result).collect();
    let expected: Vec<f64> = (990..1000).rev().map(f64::from).collect();
    assert_eq!(scores, expected);
}

#[test]
fn test_block_top_is_stable_and_uses_iteration_labels() {
    let mut log = log_of(6);
    for (entry, score) in log.iter_mut().zip([1.0, 3.0, 3.0, f64::NAN, 2.0, 5.0]) {
        entry.result = score;
        entry.iteration += 100;
    }
    let spec = SampleSpec::IterationsTop {
        block_size: 3,
        count: 2,
    };
    let picked = select(&log, &spec).unwrap();
    let labels: Vec<OutputLabel> = picked.iter().map(|s| s.label.clone()).collect();

    // Block one: ties keep log order. Block two: NaN ranks last.
    assert_eq!(iterations(&labels), vec![101, 102, 105, 104]);
}

#[test]
fn test_percentile_centers_for_hundred_and_one_entries() {
    let centers = percentile_centers(&evenly_spaced(11), 101);
    assert_eq!(centers, (0..=100).step_by(10).collect::<Vec<_>>());
}

#[test]
fn test_percentiles_label_sorted_positions() {
    // Scores descend, so sorted position p holds iteration 100 - p.
    let mut log = log_of(101);
    for entry in &mut log {
        entry.result = -(entry.iteration as f64);
    }
    let spec = SampleSpec::Percentiles {
        percentiles: vec![0.5],
        offset: 1,
    };
    let picked = select(&log, &spec).unwrap();

    assert_eq!(
        picked.iter().map(|s| s.label.clone()).collect::<Vec<_>>(),
        vec![OutputLabel::Sorted(49), OutputLabel::Sorted(50)]
    );
    assert_eq!(picked[0].entry.map(|e| e.iteration), Some(51));
    assert_eq!(picked[1].label.file_name(), "sorted_00050.png");
}

#[test]
fn test_terrain_mode_needs_no_log() {
    let spec = SampleSpec::parse("terrain", "GapTerrainTask").unwrap();
    let picked = select(&[], &spec).unwrap();

    assert_eq!(picked.len(), 1);
    assert!(picked[0].entry.is_none());
    assert_eq!(picked[0].label.file_name(), "terrain_GapTerrainTask.png");
}

#[test]
fn test_empty_log_fails_outside_terrain_mode() {
    for mode in ["iterations", "iterations_top", "percentiles"] {
        let spec = SampleSpec::parse(mode, "FlatTerrainTask").unwrap();
        assert_eq!(select(&[], &spec), Err(SampleError::EmptyLog));
    }
}

#[test]
fn test_unknown_mode_is_rejected() {
    assert_eq!(
        SampleSpec::parse("best", "FlatTerrainTask"),
        Err(SampleError::UnknownSampleMode("best".into()))
    );
    assert_eq!(
        "iterations_top".parse::<SampleMode>(),
        Ok(SampleMode::IterationsTop)
    );
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let log = log_of(3);
    let zero_stride = SampleSpec::Iterations {
        stride: 0,
        offset: 1,
    };
    assert!(matches!(
        select(&log, &zero_stride),
        Err(SampleError::InvalidSpec(_))
    ));

    let out_of_range = SampleSpec::Percentiles {
        percentiles: vec![1.5],
        offset: 1,
    };
    assert!(matches!(
        select(&log, &out_of_range),
        Err(SampleError::InvalidSpec(_))
    ));
}
