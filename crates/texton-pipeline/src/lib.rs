//! End-to-end orchestrator (C16): wires the filterbank, orientation energy,
//! contour localization, K-means texture clustering, texture-scale
//! estimation, probability-of-texture gate, texton/color histogram images,
//! dual lattice, and sparse sampling pattern into one pipeline run.

mod error;
mod input;
mod params;
mod pipeline;

pub use error::{Error, Result};
pub use input::InputImage;
pub use params::Params;
pub use pipeline::{run, PipelineOutput};
