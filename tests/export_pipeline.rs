// tests/export_pipeline.rs
use image::{Rgba, RgbaImage};
use robot_snapshots::task::FlatTerrainTask;
use robot_snapshots::world::World;
use robot_snapshots::{
    BuildError, CameraParams, CancelToken, EntryError, ExportPipeline, Grammar, LogEntry, OutputLabel,
    RenderError, RenderSettings, Renderer, SampleSpec, SubgraphRewriter,
};
use std::fs;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn grammar() -> Grammar {
    Grammar::load(concat!(env!("CARGO_MANIFEST_DIR"), "/grammars/quadruped.json")).unwrap()
}

fn log(sequences: &[&[i64]]) -> Vec<LogEntry> {
    sequences
        .iter()
        .enumerate()
        .map(|(i, seq)| LogEntry {
            iteration: i,
            rule_seq: seq.to_vec(),
            result: i as f64,
        })
        .collect()
}

fn every_row() -> SampleSpec {
    SampleSpec::Iterations {
        stride: 2,
        offset: 1,
    }
}

/// Paints the first (bottom) row red and everything else blue.
struct Stripe;

impl Renderer for Stripe {
    fn render(&mut self, _world: &World, _camera: &CameraParams) -> Result<RgbaImage, RenderError> {
        let mut frame = RgbaImage::from_pixel(4, 3, BLUE);
        for x in 0..4 {
            frame.put_pixel(x, 0, RED);
        }
        Ok(frame)
    }
}

struct Broken;

impl Renderer for Broken {
    fn render(&mut self, _world: &World, _camera: &CameraParams) -> Result<RgbaImage, RenderError> {
        Err(RenderError::InvalidCamera("no context".into()))
    }
}

fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_writes_one_image_per_selection() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("snapshots");

    let pipeline = ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task);
    let report = pipeline
        .run_with(
            &log(&[&[0], &[0, 1, 2], &[0, 3, 4, 4, 6, 6, 2], &[0]]),
            &every_row(),
            &out,
            || Stripe,
        )
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.written.len(), 4);
    assert_eq!(
        file_names(&out),
        vec![
            "iteration_00000.png",
            "iteration_00001.png",
            "iteration_00002.png",
            "iteration_00003.png",
        ]
    );
}

#[test]
fn test_saved_images_are_top_down() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();

    let pipeline = ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task);
    pipeline
        .run_with(&log(&[&[0], &[0]]), &every_row(), dir.path(), || Stripe)
        .unwrap();

    let saved = image::open(dir.path().join("iteration_00000.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(*saved.get_pixel(0, 2), RED);
    assert_eq!(*saved.get_pixel(0, 0), BLUE);
}

#[test]
fn test_failed_entries_are_recorded_and_skipped() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();

    // Row 1 uses a rule index the grammar does not have; row 2 leaves legs unexpanded.
    let entries = log(&[&[0], &[0, 42], &[0, 3], &[0, 1, 2]]);
    let pipeline = ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task);
    let report = pipeline
        .run_with(&entries, &every_row(), dir.path(), || Stripe)
        .unwrap();

    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].label, OutputLabel::Iteration(1));
    assert!(matches!(report.failures[0].error, EntryError::Build(_)));
    assert_eq!(
        file_names(dir.path()),
        vec!["iteration_00000.png", "iteration_00003.png"]
    );
}

#[test]
fn test_negative_rule_index_fails_only_its_entry() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();

    let entries = log(&[&[0, 1, 2], &[3, -1], &[0], &[0, 7]]);
    let pipeline = ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task);
    let report = pipeline
        .run_with(&entries, &every_row(), dir.path(), || Stripe)
        .unwrap();

    assert_eq!(report.written.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].label, OutputLabel::Iteration(1));
    assert!(matches!(
        report.failures[0].error,
        EntryError::Build(BuildError::InvalidRuleIndex { index: -1, .. })
    ));
}

#[test]
fn test_render_errors_do_not_abort_the_batch() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();

    let pipeline = ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task);
    let report = pipeline
        .run_with(&log(&[&[0], &[0]]), &every_row(), dir.path(), || Broken)
        .unwrap();

    assert!(report.written.is_empty());
    assert_eq!(report.failures.len(), 2);
    assert!(
        report
            .failures
            .iter()
            .all(|f| matches!(f.error, EntryError::Render(_)))
    );
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn test_cancelled_run_writes_nothing() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let pipeline =
        ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task).with_cancel(cancel);
    let report = pipeline
        .run_with(&log(&[&[0], &[0], &[0], &[0]]), &every_row(), dir.path(), || Stripe)
        .unwrap();

    assert_eq!(report.cancelled, 4);
    assert!(!report.is_complete());
    assert!(file_names(dir.path()).is_empty());
}

/// Cancels its token on the first render, like a Ctrl-C arriving mid-entry.
struct CancelOnRender(CancelToken);

impl Renderer for CancelOnRender {
    fn render(&mut self, world: &World, camera: &CameraParams) -> Result<RgbaImage, RenderError> {
        self.0.cancel();
        Stripe.render(world, camera)
    }
}

#[test]
fn test_cancel_mid_run_finishes_current_entry() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();

    let cancel = CancelToken::new();
    let pipeline =
        ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task).with_cancel(cancel.clone());
    let report = pipeline
        .run_with(&log(&[&[0], &[0], &[0], &[0]]), &every_row(), dir.path(), || {
            CancelOnRender(cancel.clone())
        })
        .unwrap();

    assert_eq!(report.written.len(), 1);
    assert_eq!(report.cancelled, 3);
    assert_eq!(file_names(dir.path()), vec!["iteration_00000.png"]);
}

#[test]
fn test_parallel_jobs_write_the_same_files() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();

    let entries = log(&[&[0], &[0, 1, 2], &[0, 1, 7], &[0], &[0, 1, 1, 2], &[0, 7]]);
    let pipeline = ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task).with_jobs(3);
    let report = pipeline
        .run_with(&entries, &every_row(), dir.path(), || Stripe)
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.written.len(), 6);
    assert_eq!(file_names(dir.path()).len(), 6);
}

#[test]
fn test_terrain_mode_with_software_renderer() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();

    let pipeline = ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task).with_settings(
        RenderSettings {
            width: 32,
            height: 24,
            ..Default::default()
        },
    );
    let spec = SampleSpec::parse("terrain", "FlatTerrainTask").unwrap();
    let report = pipeline.run(&[], &spec, dir.path()).unwrap();

    assert_eq!(report.written, vec![dir.path().join("terrain_FlatTerrainTask.png")]);
    let saved = image::open(&report.written[0]).unwrap();
    assert_eq!((saved.width(), saved.height()), (32, 24));
}

#[test]
fn test_empty_log_is_fatal() {
    let grammar = grammar();
    let task = FlatTerrainTask;
    let dir = tempfile::tempdir().unwrap();

    let pipeline = ExportPipeline::new(&grammar, SubgraphRewriter::new(), &task);
    assert!(pipeline.run(&[], &every_row(), dir.path()).is_err());
}
