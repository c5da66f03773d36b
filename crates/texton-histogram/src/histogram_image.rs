use crate::histogram::{Axis, Histogram};

/// An image whose element type is a [`Histogram`]: one histogram per pixel,
/// each lazily owned by its pixel cell.
#[derive(Debug, Clone)]
pub struct HistogramImage {
    width: usize,
    height: usize,
    axes: Vec<Axis>,
    cells: Vec<Histogram>,
}

impl HistogramImage {
    pub fn new(width: usize, height: usize, axes: Vec<Axis>) -> Self {
        let cells = (0..width * height).map(|_| Histogram::new(axes.clone())).collect();
        Self { width, height, axes, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn get(&self, x: usize, y: usize) -> &Histogram {
        &self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, histogram: Histogram) {
        self.cells[y * self.width + x] = histogram;
    }
}
