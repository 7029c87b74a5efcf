//! Error types for loading, building, sampling, rendering and exporting.
//!
//! Load-time errors ([`LoadError`], [`SampleError`]) abort a run before any image is
//! written. Per-entry errors ([`BuildError`], [`RenderError`], wrapped by [`EntryError`])
//! are recorded by the export pipeline and the batch carries on.

use std::path::PathBuf;

/// A grammar file, search log, task name or config file could not be loaded.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("i/o error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("grammar error: {0}")]
    Grammar(String),

    #[error("log error at row {row}: {message}")]
    Log { row: usize, message: String },

    #[error("unknown task '{0}'")]
    UnknownTask(String),

    #[error("config error: {0}")]
    Config(String),
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn grammar(msg: impl Into<String>) -> Self {
        Self::Grammar(msg.into())
    }

    pub fn log(row: usize, msg: impl Into<String>) -> Self {
        Self::Log {
            row,
            message: msg.into(),
        }
    }
}

/// Turning a rule sequence into a robot failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("invalid rule index {index} at position {position} (grammar has {rule_count} rules)")]
    InvalidRuleIndex {
        index: i64,
        position: usize,
        rule_count: usize,
    },

    #[error("normalization error: {0}")]
    Normalization(String),
}

impl BuildError {
    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Normalization(msg.into())
    }
}

/// The sampling request cannot be satisfied.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("search log is empty")]
    EmptyLog,

    #[error("unknown sample mode '{0}' (expected iterations, iterations_top, percentiles or terrain)")]
    UnknownSampleMode(String),

    #[error("invalid sample spec: {0}")]
    InvalidSpec(String),
}

/// The renderer could not produce a frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid camera: {0}")]
    InvalidCamera(String),
}

/// One selected log entry could not be exported.
#[derive(thiserror::Error, Debug)]
pub enum EntryError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("failed to write '{path}': {message}")]
    Write { path: PathBuf, message: String },
}

/// A batch export aborted before producing output.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("failed to create output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            LoadError::grammar("x")
                .to_string()
                .contains("grammar error:")
        );
        assert!(LoadError::log(3, "x").to_string().contains("row 3"));
        assert!(
            BuildError::normalization("x")
                .to_string()
                .contains("normalization error:")
        );
        assert!(
            SampleError::UnknownSampleMode("foo".into())
                .to_string()
                .contains("'foo'")
        );
    }

    #[test]
    fn entry_error_wraps_build_error() {
        let err: EntryError = BuildError::InvalidRuleIndex {
            index: 9,
            position: 2,
            rule_count: 4,
        }
        .into();
        assert!(err.to_string().contains("invalid rule index 9"));
    }

    #[test]
    fn io_error_preserves_source() {
        let err = LoadError::io("grammar.json", std::io::Error::other("boom"));
        assert!(err.to_string().contains("boom"));
        assert!(err.to_string().contains("grammar.json"));
    }
}
