//! Texture-scale estimation (C10): per-texton-label Delaunay triangulation,
//! clamped median neighbor distance, max-merge across labels, and a spatial
//! median filter for stability.

mod median;
mod scale;

pub use median::median_filter;
pub use scale::compute_texture_scale;
