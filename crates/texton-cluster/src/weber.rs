use texton_grid::Image;

/// `ε` added to `L` in the denominator so constant-zero pixels don't divide
/// by zero.
const WEBER_EPS: f32 = 1.0e-6;

/// Weber-law response normalization (C8). For each pixel, `L = sqrt(sum of
/// squares across the stack)`; every channel is rescaled by
/// `ln(1 + L/w) / (L + eps)`. Operates on the stack in place.
pub fn weber_normalize(stack: &mut [Image<f32>], weber_const: f32) {
    if stack.is_empty() {
        return;
    }
    let roi = stack[0].roi();
    for y in roi.start_y..roi.end_y {
        for x in roi.start_x..roi.end_x {
            let l_sq: f32 = stack.iter().map(|img| img.get(x, y).powi(2)).sum();
            let l = l_sq.sqrt();
            let factor = (1.0 + l / weber_const).ln() / (l + WEBER_EPS);
            for img in stack.iter_mut() {
                let v = img.get_mut(x, y);
                *v *= factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_grid::Roi;

    #[test]
    fn zero_stack_stays_zero() {
        let roi = Roi::full(3, 3);
        let mut a = Image::<f32>::new(3, 3);
        let mut b = Image::<f32>::new(3, 3);
        a.set_roi(roi);
        b.set_roi(roi);
        let mut stack = [a.clone(), b.clone()];
        weber_normalize(&mut stack, 0.01);
        for img in &stack {
            for (_, _, v) in img.iter_roi() {
                assert_eq!(*v, 0.0);
            }
        }
        let _ = (&mut a, &mut b);
    }

    #[test]
    fn normalization_preserves_sign() {
        let roi = Roi::full(1, 1);
        let mut a = Image::<f32>::new(1, 1);
        let mut b = Image::<f32>::new(1, 1);
        a.set_roi(roi);
        b.set_roi(roi);
        *a.get_mut(0, 0) = 3.0;
        *b.get_mut(0, 0) = -4.0;
        let mut stack = [a, b];
        weber_normalize(&mut stack, 0.01);
        assert!(*stack[0].get(0, 0) > 0.0);
        assert!(*stack[1].get(0, 0) < 0.0);
    }
}
