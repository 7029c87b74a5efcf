//! # robot-snapshots
//!
//! Renders still images of robots designed by a graph grammar.
//!
//! A design search logs each candidate as a *genotype*: the sequence of rule
//! indices that were applied to the grammar's seed graph. This crate replays
//! such sequences into robot graphs, lowers them through a turtle program into
//! `RobotBlueprint`s, stands the robots in a task's terrain, frames a camera on
//! them and writes PNG snapshots for the log entries picked by a sampling mode.
//!
//! The stages are usable on their own:
//!
//! * [`PhenotypeBuilder`] turns a rule sequence into a blueprint.
//! * [`frame_scene`] picks a camera for a settled robot.
//! * [`select`] chooses log entries to render.
//! * [`ExportPipeline`] drives all of it over a whole log.

#![forbid(unsafe_code)]

pub mod blueprint;
pub mod camera;
pub mod config;
pub mod error;
pub mod export;
pub mod grammar;
pub mod graph;
pub mod interpreter;
pub mod log;
pub mod mesh;
pub mod normalize;
pub mod phenotype;
pub mod render;
pub mod rewrite;
pub mod sampler;
pub mod task;
pub mod turtle;
pub mod world;

pub use blueprint::*;
pub use camera::{CameraParams, frame_scene};
pub use config::RenderSettings;
pub use error::{BuildError, EntryError, ExportError, LoadError, RenderError, SampleError};
pub use export::{CancelToken, EntryFailure, ExportPipeline, ExportReport};
pub use grammar::{Grammar, Rule};
pub use graph::{Graph, LinkShape};
pub use interpreter::*;
pub use log::{LogEntry, load_log};
pub use phenotype::PhenotypeBuilder;
pub use render::{Renderer, SoftwareRenderer};
pub use rewrite::{GraphRewriter, Match, SubgraphRewriter};
pub use sampler::{OutputLabel, SampleMode, SampleSpec, Selection, select};
pub use task::{Task, task_by_name};
pub use turtle::*;
pub use world::{Aabb, RobotPose, World};
