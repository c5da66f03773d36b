//! Dual-lattice intervening-contour map (C15): for every 4-neighbor cell
//! edge, the strongest contour-crossing probability among the sub-pixel
//! edgelets that cross it.

mod geometry;
mod lattice;

pub use lattice::{compute_dual_lattice, DualLattice};
