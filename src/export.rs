//! The batch export pipeline: sample, build, stage, frame, render, write.

use crate::blueprint::RobotBlueprint;
use crate::camera::frame_scene;
use crate::config::RenderSettings;
use crate::error::{EntryError, ExportError};
use crate::grammar::Grammar;
use crate::log::LogEntry;
use crate::phenotype::PhenotypeBuilder;
use crate::render::{Renderer, SoftwareRenderer};
use crate::rewrite::GraphRewriter;
use crate::sampler::{OutputLabel, SampleSpec, Selection, select};
use crate::task::Task;
use crate::world::{placement_rotation, presimulate};
use image::{ImageFormat, RgbaImage, imageops};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Requests early termination of a running export.
///
/// The entry in progress is finished; entries not yet started are skipped.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A selected entry that could not be exported.
#[derive(Debug)]
pub struct EntryFailure {
    pub label: OutputLabel,
    pub error: EntryError,
}

/// Outcome of a batch export.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Images written, in completion order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<EntryFailure>,
    /// Selections skipped because the run was cancelled.
    pub cancelled: usize,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.cancelled == 0
    }
}

enum Outcome {
    Written(PathBuf),
    Failed(EntryFailure),
    Cancelled,
}

/// Renders the robots of a search log into a directory of images.
pub struct ExportPipeline<'a, R> {
    builder: PhenotypeBuilder<'a, R>,
    task: &'a dyn Task,
    settings: RenderSettings,
    jobs: usize,
    cancel: CancelToken,
}

impl<'a, R: GraphRewriter + Sync> ExportPipeline<'a, R> {
    pub fn new(grammar: &'a Grammar, rewriter: R, task: &'a dyn Task) -> Self {
        Self {
            builder: PhenotypeBuilder::new(grammar, rewriter),
            task,
            settings: RenderSettings::default(),
            jobs: 1,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Number of entries processed concurrently; 0 and 1 both mean sequential.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Exports with the built-in [`SoftwareRenderer`].
    pub fn run(
        &self,
        log: &[LogEntry],
        spec: &SampleSpec,
        out_dir: &Path,
    ) -> Result<ExportReport, ExportError> {
        self.run_with(log, spec, out_dir, || {
            SoftwareRenderer::new(self.settings.clone())
        })
    }

    /// Exports with renderers created by `make_renderer`, one per worker.
    #[tracing::instrument(skip_all, fields(mode = %spec.mode(), out_dir = %out_dir.display()))]
    pub fn run_with<F, Rn>(
        &self,
        log: &[LogEntry],
        spec: &SampleSpec,
        out_dir: &Path,
        make_renderer: F,
    ) -> Result<ExportReport, ExportError>
    where
        F: Fn() -> Rn + Sync,
        Rn: Renderer,
    {
        let selections = select(log, spec)?;
        std::fs::create_dir_all(out_dir).map_err(|source| ExportError::OutputDir {
            path: out_dir.to_path_buf(),
            source,
        })?;
        info!(selected = selections.len(), jobs = self.jobs, "exporting snapshots");

        let outcomes: Vec<Outcome> = if self.jobs <= 1 {
            let mut renderer = make_renderer();
            selections
                .iter()
                .map(|selection| self.process(&mut renderer, selection, out_dir))
                .collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()?;
            pool.install(|| {
                selections
                    .par_iter()
                    .map_init(&make_renderer, |renderer, selection| {
                        self.process(renderer, selection, out_dir)
                    })
                    .collect()
            })
        };

        let mut report = ExportReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Written(path) => report.written.push(path),
                Outcome::Failed(failure) => {
                    warn!(label = %failure.label, error = %failure.error, "skipped entry");
                    report.failures.push(failure);
                }
                Outcome::Cancelled => report.cancelled += 1,
            }
        }
        info!(
            written = report.written.len(),
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "export finished"
        );
        Ok(report)
    }

    fn process<Rn: Renderer>(
        &self,
        renderer: &mut Rn,
        selection: &Selection<'_>,
        out_dir: &Path,
    ) -> Outcome {
        if self.cancel.is_cancelled() {
            return Outcome::Cancelled;
        }
        match self.export_entry(renderer, selection, out_dir) {
            Ok(path) => Outcome::Written(path),
            Err(error) => Outcome::Failed(EntryFailure {
                label: selection.label.clone(),
                error,
            }),
        }
    }

    /// Builds, stages, frames, renders and writes one selection.
    fn export_entry<Rn: Renderer>(
        &self,
        renderer: &mut Rn,
        selection: &Selection<'_>,
        out_dir: &Path,
    ) -> Result<PathBuf, EntryError> {
        let robot = selection
            .entry
            .map(|entry| self.builder.build(&entry.rule_seq))
            .transpose()?;

        let image = self.render_robot(renderer, robot)?;
        let path = out_dir.join(selection.label.file_name());
        write_png(&path, &image)?;
        debug!(label = %selection.label, path = %path.display(), "wrote snapshot");
        Ok(path)
    }

    /// Stages the task world with `robot` (if any), frames it and renders a
    /// top-down oriented image.
    pub fn render_robot<Rn: Renderer>(
        &self,
        renderer: &mut Rn,
        robot: Option<RobotBlueprint>,
    ) -> Result<RgbaImage, EntryError> {
        let mut world = self.task.make_world();
        let pose = match robot {
            Some(robot) => {
                let init = presimulate(&robot);
                let index = world.add_robot(robot, init, placement_rotation());
                world.step();
                world.robot_pose(index)
            }
            None => None,
        };
        let camera = frame_scene(pose.as_ref());
        let frame = renderer.render(&world, &camera)?;
        Ok(imageops::flip_vertical(&frame))
    }
}

/// Writes `image` as a PNG next to `path` and renames it into place, so a
/// failed write never leaves a partial file under the final name.
fn write_png(path: &Path, image: &RgbaImage) -> Result<(), EntryError> {
    let tmp = path.with_extension("png.tmp");
    let fail = |message: String| EntryError::Write {
        path: path.to_path_buf(),
        message,
    };
    if let Err(e) = image.save_with_format(&tmp, ImageFormat::Png) {
        let _ = std::fs::remove_file(&tmp);
        return Err(fail(e.to_string()));
    }
    std::fs::rename(&tmp, path).map_err(|e| fail(e.to_string()))
}
