use crate::Image;

/// Sentinel used by [`Image::<f32>::log`] when the shifted value is non-positive.
pub const NEG_INF_SENTINEL: f32 = -1.0e30;

impl Image<f32> {
    pub fn min_max(&self) -> (f32, f32) {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for (_, _, v) in self.iter_roi() {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
        (lo, hi)
    }

    pub fn mean(&self) -> f32 {
        let roi = self.roi();
        if roi.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.iter_roi().map(|(_, _, v)| *v as f64).sum();
        (sum / roi.len() as f64) as f32
    }

    pub fn mean_and_stddev(&self) -> (f32, f32) {
        let roi = self.roi();
        if roi.is_empty() {
            return (0.0, 0.0);
        }
        let n = roi.len() as f64;
        let mean = self.mean() as f64;
        let var: f64 = self
            .iter_roi()
            .map(|(_, _, v)| {
                let d = *v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        (mean as f32, var.sqrt() as f32)
    }

    pub fn sum_abs(&self) -> f32 {
        self.iter_roi().map(|(_, _, v)| v.abs()).sum()
    }

    pub fn l2_norm(&self) -> f32 {
        self.iter_roi().map(|(_, _, v)| v * v).sum::<f32>().sqrt()
    }

    /// Rescale in place so the ROI has zero mean and unit variance. A constant
    /// image (stddev == 0) is left untouched rather than producing NaN/Inf.
    pub fn normalize_to_unit_variance(&mut self) {
        let (mean, stddev) = self.mean_and_stddev();
        if stddev <= 0.0 {
            return;
        }
        self.for_each_roi_mut(|_, _, v| *v = (*v - mean) / stddev);
    }

    /// Linearly rescale the ROI into `[lo, hi]`. A constant image maps every
    /// pixel to the midpoint of the requested range, per spec.
    pub fn rescale_to_range(&mut self, lo: f32, hi: f32) {
        let (cur_lo, cur_hi) = self.min_max();
        let span = cur_hi - cur_lo;
        if span <= 0.0 {
            let mid = 0.5 * (lo + hi);
            self.for_each_roi_mut(|_, _, v| *v = mid);
            return;
        }
        let scale = (hi - lo) / span;
        self.for_each_roi_mut(|_, _, v| *v = lo + (*v - cur_lo) * scale);
    }

    pub fn add_scalar(&mut self, s: f32) {
        self.for_each_roi_mut(|_, _, v| *v += s);
    }

    pub fn mul_scalar(&mut self, s: f32) {
        self.for_each_roi_mut(|_, _, v| *v *= s);
    }

    pub fn negate(&mut self) {
        self.for_each_roi_mut(|_, _, v| *v = -*v);
    }

    pub fn square(&mut self) {
        self.for_each_roi_mut(|_, _, v| *v *= *v);
    }

    pub fn sqrt(&mut self) {
        self.for_each_roi_mut(|_, _, v| *v = v.max(0.0).sqrt());
    }

    /// `log(x + z)`, with non-positive shifted values mapped to a large negative
    /// sentinel instead of `-inf` so downstream arithmetic stays finite.
    pub fn log_shifted(&mut self, z: f32) {
        self.for_each_roi_mut(|_, _, v| {
            let shifted = *v + z;
            *v = if shifted > 0.0 {
                shifted.ln()
            } else {
                NEG_INF_SENTINEL
            };
        });
    }

    pub fn add_image(&mut self, other: &Image<f32>) {
        self.zip_roi_mut(other, |a, b| *a += b);
    }

    pub fn sub_image(&mut self, other: &Image<f32>) {
        self.zip_roi_mut(other, |a, b| *a -= b);
    }

    pub fn mul_image(&mut self, other: &Image<f32>) {
        self.zip_roi_mut(other, |a, b| *a *= b);
    }

    pub fn div_image(&mut self, other: &Image<f32>) {
        self.zip_roi_mut(other, |a, b| *a = if b != 0.0 { *a / b } else { 0.0 });
    }

    /// Logical OR over two images treated as "soft" booleans in `[0, 1]`:
    /// `hard` clamps to `{0, 1}` via `max`; `soft` uses probabilistic OR
    /// `a + b - a*b`.
    pub fn hard_or(&mut self, other: &Image<f32>) {
        self.zip_roi_mut(other, |a, b| *a = a.max(b));
    }

    pub fn soft_or(&mut self, other: &Image<f32>) {
        self.zip_roi_mut(other, |a, b| *a = *a + b - *a * b);
    }

    pub fn hard_and(&mut self, other: &Image<f32>) {
        self.zip_roi_mut(other, |a, b| *a = a.min(b));
    }

    pub fn soft_and(&mut self, other: &Image<f32>) {
        self.zip_roi_mut(other, |a, b| *a *= b);
    }

    fn zip_roi_mut(&mut self, other: &Image<f32>, mut f: impl FnMut(&mut f32, f32)) {
        let roi = self.roi();
        debug_assert_eq!(roi, other.roi(), "ROI mismatch in elementwise image op");
        let width = self.width();
        let other_width = other.width();
        for y in roi.start_y..roi.end_y {
            for x in roi.start_x..roi.end_x {
                let b = other.buf()[y * other_width + x];
                f(&mut self.buf_mut()[y * width + x], b);
            }
        }
    }

    /// Bring every pixel into `[0, half_phase)`: `[0, pi)` when `half_phase` is
    /// true, `[0, 2*pi)` otherwise.
    pub fn fix_theta_range(&mut self, half_phase: bool) {
        let period = if half_phase {
            std::f32::consts::PI
        } else {
            std::f32::consts::TAU
        };
        self.for_each_roi_mut(|_, _, v| {
            let mut t = v.rem_euclid(period);
            if t < 0.0 {
                t += period;
            }
            *v = t;
        });
    }

    /// Convert a byte image to float, either a raw `0..=255` cast or rescaled to
    /// `[0, 1]`.
    pub fn from_byte(src: &Image<u8>, rescale_unit: bool) -> Image<f32> {
        let mut dest = Image::<f32>::new(src.width(), src.height());
        dest.set_roi(src.roi());
        let scale = if rescale_unit { 1.0 / 255.0 } else { 1.0 };
        for (x, y, v) in src.iter_roi().collect::<Vec<_>>() {
            *dest.get_mut(x, y) = *v as f32 * scale;
        }
        dest
    }

    /// Convert to a byte image, clamping to `[0, 255]`. If `rescale_unit`, the
    /// source is first assumed to be in `[0, 1]` and multiplied by 255.
    pub fn to_byte(&self, rescale_unit: bool) -> Image<u8> {
        let mut dest = Image::<u8>::new(self.width(), self.height());
        dest.set_roi(self.roi());
        let scale = if rescale_unit { 255.0 } else { 1.0 };
        for (x, y, v) in self.iter_roi().collect::<Vec<_>>() {
            let scaled = (*v * scale).round().clamp(0.0, 255.0);
            *dest.get_mut(x, y) = scaled as u8;
        }
        dest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Roi;

    #[test]
    fn rescale_constant_image_yields_midpoint() {
        let mut img = Image::<f32>::filled(4, 4, 7.0);
        img.rescale_to_range(-1.0, 1.0);
        for (_, _, v) in img.iter_roi() {
            assert_eq!(*v, 0.0);
        }
    }

    #[test]
    fn theta_wraps_into_half_phase() {
        let mut img = Image::<f32>::filled(2, 2, 3.5 * std::f32::consts::PI);
        img.fix_theta_range(true);
        for (_, _, v) in img.iter_roi() {
            assert!((0.0..std::f32::consts::PI).contains(v));
        }
    }

    #[test]
    fn log_shifted_uses_sentinel_for_nonpositive() {
        let mut img = Image::<f32>::new(2, 2);
        img.set_roi(Roi::full(2, 2));
        *img.get_mut(0, 0) = -5.0;
        img.log_shifted(1.0);
        assert_eq!(*img.get(0, 0), NEG_INF_SENTINEL);
    }
}
