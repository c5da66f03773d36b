//! Rectangular typed image storage with an explicit region of interest (ROI),
//! used as the universal interchange type across the perceptual texton/color
//! histogram pipeline.
//!
//! [`Image`] owns its buffer and carries an ROI rectangle; [`reflect_to_roi`]
//! fills the complement of the ROI by mirroring ROI content so that every
//! radius-bounded stage downstream (convolution, adaptive-disc accumulation)
//! can read outside the ROI without bounds checks.
//!
//! [`reflect_to_roi`]: Image::reflect_to_roi

mod error;
mod float_ops;
mod image;
mod roi;
mod sequence;

pub use error::*;
pub use float_ops::NEG_INF_SENTINEL;
pub use image::Image;
pub use roi::Roi;
pub use sequence::ImageSequence;
