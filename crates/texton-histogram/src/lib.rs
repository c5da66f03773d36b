//! Rank-generic soft histograms, the per-pixel texton and color histogram
//! images (C13/C14), and the self-describing binary file format they're
//! serialized to.

mod color_histo;
mod histogram;
mod histogram_image;
mod io;
mod texton_histo;

pub use color_histo::compute_color_histogram;
pub use histogram::{Axis, Histogram, Patch, PatchCache};
pub use histogram_image::HistogramImage;
pub use io::{read_histogram_image, write_histogram_image};
pub use texton_histo::compute_texton_histogram;
