//! Choosing which log entries to render.
//!
//! A search log can hold hundreds of thousands of designs. [`select`] turns a
//! [`SampleSpec`] into the ordered list of entries to render, each with the
//! [`OutputLabel`] its image is saved under.

use crate::error::SampleError;
use crate::log::LogEntry;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Default spacing of checkpoints and size of top-k blocks.
pub const DEFAULT_STRIDE: usize = 1000;
/// Default half-width of the window around each checkpoint.
pub const DEFAULT_OFFSET: usize = 10;
/// Default number of entries kept per block.
pub const DEFAULT_TOP_COUNT: usize = 10;
/// Default number of evenly spaced percentiles.
pub const DEFAULT_PERCENTILE_COUNT: usize = 11;

/// The four sampling modes, as named on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleMode {
    Iterations,
    IterationsTop,
    Percentiles,
    Terrain,
}

impl SampleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iterations => "iterations",
            Self::IterationsTop => "iterations_top",
            Self::Percentiles => "percentiles",
            Self::Terrain => "terrain",
        }
    }
}

impl FromStr for SampleMode {
    type Err = SampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iterations" => Ok(Self::Iterations),
            "iterations_top" => Ok(Self::IterationsTop),
            "percentiles" => Ok(Self::Percentiles),
            "terrain" => Ok(Self::Terrain),
            other => Err(SampleError::UnknownSampleMode(other.to_string())),
        }
    }
}

impl fmt::Display for SampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sampling mode together with its parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleSpec {
    /// Windows of `±offset` rows around every multiple of `stride`.
    Iterations { stride: usize, offset: usize },
    /// The `count` best entries of each block of `block_size` rows.
    IterationsTop { block_size: usize, count: usize },
    /// Windows of `±offset` positions around score percentiles.
    Percentiles { percentiles: Vec<f64>, offset: usize },
    /// The task's terrain with no robot.
    Terrain { task: String },
}

impl SampleSpec {
    /// `mode` with its default parameters. `task` names the terrain
    /// image in terrain mode.
    pub fn with_defaults(mode: SampleMode, task: &str) -> Self {
        match mode {
            SampleMode::Iterations => Self::Iterations {
                stride: DEFAULT_STRIDE,
                offset: DEFAULT_OFFSET,
            },
            SampleMode::IterationsTop => Self::IterationsTop {
                block_size: DEFAULT_STRIDE,
                count: DEFAULT_TOP_COUNT,
            },
            SampleMode::Percentiles => Self::Percentiles {
                percentiles: evenly_spaced(DEFAULT_PERCENTILE_COUNT),
                offset: DEFAULT_OFFSET,
            },
            SampleMode::Terrain => Self::Terrain {
                task: task.to_string(),
            },
        }
    }

    /// Parses a mode name and returns its default spec.
    pub fn parse(mode: &str, task: &str) -> Result<Self, SampleError> {
        Ok(Self::with_defaults(mode.parse()?, task))
    }

    pub fn mode(&self) -> SampleMode {
        match self {
            Self::Iterations { .. } => SampleMode::Iterations,
            Self::IterationsTop { .. } => SampleMode::IterationsTop,
            Self::Percentiles { .. } => SampleMode::Percentiles,
            Self::Terrain { .. } => SampleMode::Terrain,
        }
    }

    fn validate(&self) -> Result<(), SampleError> {
        match self {
            Self::Iterations { stride: 0, .. } => {
                Err(SampleError::InvalidSpec("stride must be positive".into()))
            }
            Self::IterationsTop { block_size: 0, .. } => {
                Err(SampleError::InvalidSpec("block size must be positive".into()))
            }
            Self::IterationsTop { count: 0, .. } => {
                Err(SampleError::InvalidSpec("count must be positive".into()))
            }
            Self::Percentiles { percentiles, .. } => {
                match percentiles.iter().find(|p| !(0.0..=1.0).contains(*p)) {
                    Some(p) => Err(SampleError::InvalidSpec(format!(
                        "percentile {p} is outside [0, 1]"
                    ))),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

/// `count` evenly spaced values from 0.0 to 1.0 inclusive.
pub fn evenly_spaced(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

/// The name an exported image is saved under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OutputLabel {
    /// Labelled by iteration (row index or logged iteration number).
    Iteration(usize),
    /// Labelled by position in score order.
    Sorted(usize),
    /// Terrain-only image for the named task.
    Terrain(String),
}

impl OutputLabel {
    pub fn file_name(&self) -> String {
        match self {
            Self::Iteration(i) => format!("iteration_{i:05}.png"),
            Self::Sorted(i) => format!("sorted_{i:05}.png"),
            Self::Terrain(task) => format!("terrain_{task}.png"),
        }
    }
}

impl fmt::Display for OutputLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iteration(i) => write!(f, "iteration {i}"),
            Self::Sorted(i) => write!(f, "sorted {i}"),
            Self::Terrain(task) => write!(f, "terrain {task}"),
        }
    }
}

/// One entry chosen for rendering. `entry` is `None` for the terrain-only shot.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection<'a> {
    pub entry: Option<&'a LogEntry>,
    pub label: OutputLabel,
}

/// Picks the entries of `log` described by `spec`, in rendering order. No
/// entry is picked twice.
pub fn select<'a>(
    log: &'a [LogEntry],
    spec: &SampleSpec,
) -> Result<Vec<Selection<'a>>, SampleError> {
    spec.validate()?;
    if let SampleSpec::Terrain { task } = spec {
        return Ok(vec![Selection {
            entry: None,
            label: OutputLabel::Terrain(task.clone()),
        }]);
    }
    if log.is_empty() {
        return Err(SampleError::EmptyLog);
    }

    let selections = match spec {
        SampleSpec::Iterations { stride, offset } => windowed(log, *stride, *offset),
        SampleSpec::IterationsTop { block_size, count } => block_top(log, *block_size, *count),
        SampleSpec::Percentiles {
            percentiles,
            offset,
        } => percentile_windows(log, percentiles, *offset),
        SampleSpec::Terrain { .. } => Vec::new(),
    };
    Ok(selections)
}

/// Half-open row range of the window around `center`, clamped to `[0, len)`.
fn window(center: usize, offset: usize, len: usize) -> std::ops::Range<usize> {
    center.saturating_sub(offset)..center.saturating_add(offset).min(len)
}

/// Positions covered by the windows around `centers`, in window order. A
/// position shared by overlapping windows is kept the first time only.
fn window_positions(centers: &[usize], offset: usize, len: usize) -> Vec<usize> {
    let mut seen = vec![false; len];
    centers
        .iter()
        .flat_map(|&center| window(center, offset, len))
        .filter(|&pos| !std::mem::replace(&mut seen[pos], true))
        .collect()
}

fn windowed(log: &[LogEntry], stride: usize, offset: usize) -> Vec<Selection<'_>> {
    let len = log.len();
    let mut checkpoints: Vec<usize> = (0..=len).step_by(stride).collect();
    if checkpoints.last() != Some(&len) {
        checkpoints.push(len);
    }

    window_positions(&checkpoints, offset, len)
        .into_iter()
        .map(|row| Selection {
            entry: Some(&log[row]),
            label: OutputLabel::Iteration(row),
        })
        .collect()
}

/// Score order with NaN below every number.
fn by_score(a: &LogEntry, b: &LogEntry) -> Ordering {
    match (a.result.is_nan(), b.result.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.result.total_cmp(&b.result),
    }
}

fn block_top(log: &[LogEntry], block_size: usize, count: usize) -> Vec<Selection<'_>> {
    let mut out = Vec::new();
    for block in log.chunks(block_size) {
        let mut ranked: Vec<&LogEntry> = block.iter().collect();
        // sort_by is stable: equal scores keep their log order.
        ranked.sort_by(|a, b| by_score(b, a));
        out.extend(ranked.into_iter().take(count).map(|entry| Selection {
            entry: Some(entry),
            label: OutputLabel::Iteration(entry.iteration),
        }));
    }
    out
}

fn percentile_windows<'a>(
    log: &'a [LogEntry],
    percentiles: &[f64],
    offset: usize,
) -> Vec<Selection<'a>> {
    let mut sorted: Vec<&LogEntry> = log.iter().collect();
    sorted.sort_by(|a, b| by_score(a, b));

    let centers = percentile_centers(percentiles, sorted.len());
    window_positions(&centers, offset, sorted.len())
        .into_iter()
        .map(|pos| Selection {
            entry: Some(sorted[pos]),
            label: OutputLabel::Sorted(pos),
        })
        .collect()
}

/// Centre positions used by percentile sampling for a log of `len` entries.
pub fn percentile_centers(percentiles: &[f64], len: usize) -> Vec<usize> {
    let last = len.saturating_sub(1) as f64;
    percentiles
        .iter()
        .map(|p| (p * last).round_ties_even() as usize)
        .collect()
}
