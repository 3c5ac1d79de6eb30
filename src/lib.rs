//! Manual facial landmark annotation.
//!
//! A person drags a face rectangle and clicks 68 landmarks per image; each
//! completed image becomes one CSV-like row (see [`output`]).

pub mod batch;
pub mod config;
pub mod error;
pub mod landmarks;
pub mod output;
pub mod session;
pub mod viewer;

pub use batch::{Batch, Source, Summary};
pub use config::Config;
pub use error::{Error, Result};
pub use landmarks::{LandmarkIndex, LandmarkSet, Point, Rect, Slot, LANDMARK_COUNT};
pub use output::LandmarkWriter;
pub use session::{Input, Outcome, Session, Target, Transition};
