//! Orientation energy (C5), parabolic orientation fit with sub-pixel contour
//! localization (C6), and the per-pixel scale combiner (C7).

mod combine;
mod contour;
mod energy;
mod parabola;

pub use combine::{combine_scales, CombinedContour};
pub use contour::{localize_scale, suppress_low_energy, ScaleContour};
pub use energy::{orientation_energy, EnergyMode};
pub use parabola::{eval3, fit3, vertex3, Quadratic};
