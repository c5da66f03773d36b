use crate::{Error, Result, Roi};

/// A rectangular typed buffer with an explicit region of interest.
///
/// The backing storage always spans the full `width x height` extent; the ROI
/// marks the sub-rectangle that stage code is allowed to read and write freely.
/// Everything outside the ROI is scratch space that [`reflect_to_roi`] can fill
/// so that radius-bounded neighborhoods (convolution kernels, adaptive discs)
/// never have to branch on bounds.
///
/// [`reflect_to_roi`]: Image::reflect_to_roi
#[derive(Debug, Clone)]
pub struct Image<T> {
    width: usize,
    height: usize,
    roi: Roi,
    buf: Vec<T>,
}

impl<T: Default + Clone> Image<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            roi: Roi::full(width, height),
            buf: vec![T::default(); width * height],
        }
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            roi: Roi::full(width, height),
            buf: vec![value; width * height],
        }
    }
}

impl<T> Image<T> {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn roi(&self) -> Roi {
        self.roi
    }

    pub fn set_roi(&mut self, roi: Roi) {
        roi.check(self.width, self.height);
        self.roi = roi;
    }

    #[inline]
    pub fn buf(&self) -> &[T] {
        &self.buf
    }

    #[inline]
    pub fn buf_mut(&mut self) -> &mut [T] {
        &mut self.buf
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.buf[y * self.width + x]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        &mut self.buf[y * self.width + x]
    }

    #[inline]
    pub fn try_get(&self, x: i64, y: i64) -> Option<&T> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(&self.buf[y as usize * self.width + x as usize])
    }

    /// Iterate `(x, y, &value)` over the ROI in row-major order.
    pub fn iter_roi(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        self.roi
            .iter_pixels()
            .map(move |(x, y)| (x, y, &self.buf[y * self.width + x]))
    }

    pub fn for_each_roi_mut(&mut self, mut f: impl FnMut(usize, usize, &mut T)) {
        let roi = self.roi;
        let width = self.width;
        for y in roi.start_y..roi.end_y {
            for x in roi.start_x..roi.end_x {
                f(x, y, &mut self.buf[y * width + x]);
            }
        }
    }
}

impl<T: Copy> Image<T> {
    pub fn copy_from_buffer(&mut self, src: &[T]) -> Result<()> {
        let expected = self.roi.len();
        if src.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: src.len(),
            });
        }
        let roi = self.roi;
        let width = self.width;
        for (i, (x, y)) in roi.iter_pixels().enumerate() {
            self.buf[y * width + x] = src[i];
        }
        Ok(())
    }

    pub fn copy_to_buffer(&self, dest: &mut [T]) -> Result<()> {
        let expected = self.roi.len();
        if dest.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: dest.len(),
            });
        }
        for (i, (_, _, v)) in self.iter_roi().enumerate() {
            dest[i] = *v;
        }
        Ok(())
    }

    /// Fill the complement of the ROI by mirroring ROI contents across each edge,
    /// and across the four diagonal corners. `margin` bounds how far outside the
    /// ROI on each side gets filled (it may exceed the image extent; out-of-range
    /// destinations are skipped, since a stage only needs as much margin as its
    /// largest kernel half-width).
    pub fn reflect_to_roi(&mut self, margin: usize)
    where
        T: Default,
    {
        let roi = self.roi;
        if roi.is_empty() {
            tracing::trace!("reflect_to_roi called on an empty ROI, skipping");
            return;
        }
        let width = self.width;
        let height = self.height;

        let reflect_axis = |p: i64, lo: usize, hi: usize| -> usize {
            // Mirror across `lo` (inclusive) and `hi` (exclusive) repeatedly; one
            // reflection suffices in practice since margin never approaches the
            // ROI's own width, but we loop defensively for tiny ROIs.
            let lo = lo as i64;
            let hi = hi as i64;
            let mut p = p;
            if hi <= lo {
                return lo.max(0) as usize;
            }
            loop {
                if p < lo {
                    p = 2 * lo - p - 1;
                } else if p >= hi {
                    p = 2 * hi - p - 1;
                } else {
                    break;
                }
            }
            p as usize
        };

        let y0 = roi.start_y.saturating_sub(margin);
        let y1 = (roi.end_y + margin).min(height);
        let x0 = roi.start_x.saturating_sub(margin);
        let x1 = (roi.end_x + margin).min(width);

        for y in y0..y1 {
            for x in x0..x1 {
                if roi.contains(x, y) {
                    continue;
                }
                let sx = reflect_axis(x as i64, roi.start_x, roi.end_x);
                let sy = reflect_axis(y as i64, roi.start_y, roi.end_y);
                let value = self.buf[sy * width + sx];
                self.buf[y * width + x] = value;
            }
        }
    }

    /// Copy this image's ROI into `dest` at ROI-relative offset `(left, top)`.
    pub fn extract(&self, dest: &mut Image<T>, left: i64, top: i64)
    where
        T: Default,
    {
        let src_roi = self.roi;
        for (sy_idx, sy) in (src_roi.start_y..src_roi.end_y).enumerate() {
            let dy = top + sy_idx as i64;
            if dy < 0 || dy as usize >= dest.height {
                continue;
            }
            for (sx_idx, sx) in (src_roi.start_x..src_roi.end_x).enumerate() {
                let dx = left + sx_idx as i64;
                if dx < 0 || dx as usize >= dest.width {
                    continue;
                }
                *dest.get_mut(dx as usize, dy as usize) = *self.get(sx, sy);
            }
        }
    }

    /// Place `src` into this image's ROI at offset `(left, top)`, filling any
    /// pixel of the ROI that `src` does not cover with `fill`.
    pub fn pad(&mut self, src: &Image<T>, left: i64, top: i64, fill: T) {
        let dest_roi = self.roi;
        for y in dest_roi.start_y..dest_roi.end_y {
            let sy = y as i64 - top;
            for x in dest_roi.start_x..dest_roi.end_x {
                let sx = x as i64 - left;
                let value = if sx >= 0
                    && sy >= 0
                    && (sx as usize) < src.width
                    && (sy as usize) < src.height
                {
                    *src.get(sx as usize, sy as usize)
                } else {
                    fill
                };
                *self.get_mut(x, y) = value;
            }
        }
    }

    pub fn nonzero_count(&self) -> usize
    where
        T: PartialEq + Default,
    {
        let zero = T::default();
        self.iter_roi().filter(|(_, _, v)| **v != zero).count()
    }

    /// Allocate a new image `margin` pixels larger on every side, with this
    /// image's ROI embedded in the middle and the border reflection-filled.
    /// Used ahead of any stage that reads a radius-bounded neighborhood
    /// around every pixel of an ROI-sized map.
    pub fn reflect_padded(&self, margin: usize) -> Image<T>
    where
        T: Default,
    {
        let width = self.width + 2 * margin;
        let height = self.height + 2 * margin;
        let mut out = Image::<T>::new(width, height);
        out.set_roi(Roi::full(width, height));
        out.pad(self, margin as i64, margin as i64, T::default());
        out.set_roi(Roi {
            start_x: margin,
            end_x: margin + self.width,
            start_y: margin,
            end_y: margin + self.height,
        });
        out.reflect_to_roi(margin);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflection_round_trip_is_bit_exact() {
        let mut img = Image::<f32>::new(6, 6);
        img.set_roi(Roi {
            start_x: 1,
            end_x: 5,
            start_y: 1,
            end_y: 5,
        });
        for (x, y, _) in img.iter_roi().map(|(x, y, v)| (x, y, *v)).collect::<Vec<_>>() {
            *img.get_mut(x, y) = (x * 10 + y) as f32;
        }
        let before: Vec<f32> = img.iter_roi().map(|(_, _, v)| *v).collect();
        img.reflect_to_roi(2);
        let after: Vec<f32> = img.iter_roi().map(|(_, _, v)| *v).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn reflect_mirrors_corners() {
        let mut img = Image::<f32>::new(5, 5);
        img.set_roi(Roi {
            start_x: 1,
            end_x: 4,
            start_y: 1,
            end_y: 4,
        });
        for y in 1..4 {
            for x in 1..4 {
                *img.get_mut(x, y) = (x + y * 10) as f32;
            }
        }
        img.reflect_to_roi(1);
        // Top-left corner (0,0) should mirror the diagonal ROI pixel (1,1).
        assert_eq!(*img.get(0, 0), *img.get(1, 1));
        assert_eq!(*img.get(4, 4), *img.get(3, 3));
    }

    #[test]
    fn extract_and_pad_round_trip() {
        let mut src = Image::<f32>::new(3, 3);
        for i in 0..9 {
            src.buf_mut()[i] = i as f32;
        }
        let mut dest = Image::<f32>::new(5, 5);
        src.extract(&mut dest, 1, 1);
        assert_eq!(*dest.get(1, 1), 0.0);
        assert_eq!(*dest.get(3, 3), 8.0);

        let mut back = Image::<f32>::new(3, 3);
        back.pad(&dest, -1, -1, -1.0);
        assert_eq!(*back.get(0, 0), 0.0);
        assert_eq!(*back.get(2, 2), 8.0);
    }
}
