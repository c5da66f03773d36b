use rustfft::{num_complex::Complex32, FftPlanner};

/// In-place analytic-signal construction: zero-pad `signal` to the next power
/// of two, double the positive-frequency bins, zero the negative-frequency
/// bins, inverse-transform, and replace `signal` with the imaginary part of
/// the first `signal.len()` samples. Used only during kernel synthesis to
/// build the Hilbert-odd companion of a Gaussian-derivative profile.
pub fn hilbert_inplace(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let fft_len = len.next_power_of_two();

    let mut buf: Vec<Complex32> = signal
        .iter()
        .map(|&v| Complex32::new(v, 0.0))
        .chain(std::iter::repeat(Complex32::new(0.0, 0.0)).take(fft_len - len))
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    let fwd = planner.plan_fft_forward(fft_len);
    fwd.process(&mut buf);

    let half = fft_len / 2;
    // Bin 0 (DC) and, for even `fft_len`, the Nyquist bin stay untouched.
    // Bins `1..half` are doubled; bins `half+1..fft_len` are zeroed.
    for bin in buf.iter_mut().take(half).skip(1) {
        *bin *= 2.0;
    }
    for bin in buf.iter_mut().skip(half + 1) {
        *bin = Complex32::new(0.0, 0.0);
    }

    let inv = planner.plan_fft_inverse(fft_len);
    inv.process(&mut buf);

    let norm = 1.0 / fft_len as f32;
    for (dst, src) in signal.iter_mut().zip(buf.iter()) {
        *dst = src.im * norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hilbert_of_zero_is_zero() {
        let mut v = vec![0.0f32; 16];
        hilbert_inplace(&mut v);
        for x in v {
            assert!(x.abs() < 1e-5);
        }
    }

    #[test]
    fn hilbert_preserves_length() {
        let mut v = vec![1.0f32, 2.0, 3.0, 4.0, 5.0];
        hilbert_inplace(&mut v);
        assert_eq!(v.len(), 5);
    }

    #[test]
    fn hilbert_of_odd_symmetric_profile_is_roughly_odd() {
        // A Gaussian first-derivative-like profile is odd about the center;
        // its Hilbert transform should also be (approximately) odd.
        let n = 32usize;
        let mut v: Vec<f32> = (0..n)
            .map(|i| {
                let x = i as f32 - (n as f32 - 1.0) / 2.0;
                -x * (-x * x / 8.0).exp()
            })
            .collect();
        hilbert_inplace(&mut v);
        let mid = (n - 1) as f32 / 2.0;
        let sample_at = |v: &[f32], x: f32| -> f32 {
            let idx = (x + mid).round() as usize;
            v[idx.min(v.len() - 1)]
        };
        let a = sample_at(&v, 5.0);
        let b = sample_at(&v, -5.0);
        assert!((a + b).abs() < 0.5, "expected near-odd symmetry, got {a} and {b}");
    }
}
