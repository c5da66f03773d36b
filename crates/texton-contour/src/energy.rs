use rayon::prelude::*;
use texton_grid::{Image, ImageSequence};
use texton_kernel::Filterbank;

/// How per-channel orientation energy is combined across the (L, a, b)
/// filter banks. Default is L-channel-only, matching the reference pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyMode {
    #[default]
    LuminanceOnly,
    SumChannels,
    MaxChannels,
}

/// Per-`(scale, orientation)` orientation energy `E = even^2 + odd^2`, one
/// channel's responses only.
fn energy_single_channel(responses: &[Image<f32>], fb: &Filterbank) -> ImageSequence<f32> {
    let n_scales = fb.config.n_gauss_scales;
    let n_orientations = fb.config.n_gauss_orientations;
    let width = responses[0].width();
    let height = responses[0].height();

    let frames: Vec<Image<f32>> = (0..n_scales * n_orientations)
        .into_par_iter()
        .map(|flat| {
            let scale = flat / n_orientations;
            let orientation = flat % n_orientations;
            let even_idx = fb.even_index(scale, orientation);
            let even = &responses[even_idx];
            let odd = &responses[even_idx + 1];
            let mut out = Image::<f32>::new(width, height);
            out.set_roi(even.roi());
            for (x, y, ev) in even.iter_roi().collect::<Vec<_>>() {
                let ov = odd.get(x, y);
                *out.get_mut(x, y) = ev * ev + ov * ov;
            }
            out
        })
        .collect();

    let mut seq = ImageSequence::with_capacity(frames.len());
    for f in frames {
        seq.push(f);
    }
    seq
}

/// Compute orientation energy from the L-channel filterbank responses, and
/// optionally the a/b channel responses when `mode` requires them.
pub fn orientation_energy(
    fb: &Filterbank,
    l_responses: &[Image<f32>],
    ab_responses: Option<(&[Image<f32>], &[Image<f32>])>,
    mode: EnergyMode,
) -> ImageSequence<f32> {
    let l_energy = energy_single_channel(l_responses, fb);

    match mode {
        EnergyMode::LuminanceOnly => {
            tracing::debug!("orientation energy: L channel only");
            l_energy
        }
        EnergyMode::SumChannels | EnergyMode::MaxChannels => {
            let (a_resp, b_resp) = ab_responses.expect("a/b responses required for this energy mode");
            let a_energy = energy_single_channel(a_resp, fb);
            let b_energy = energy_single_channel(b_resp, fb);
            let mut combined = ImageSequence::with_capacity(l_energy.len());
            for i in 0..l_energy.len() {
                let l = l_energy.get(i);
                let a = a_energy.get(i);
                let b = b_energy.get(i);
                let mut out = Image::<f32>::new(l.width(), l.height());
                out.set_roi(l.roi());
                for (x, y, lv) in l.iter_roi().collect::<Vec<_>>() {
                    let av = a.get(x, y);
                    let bv = b.get(x, y);
                    *out.get_mut(x, y) = match mode {
                        EnergyMode::SumChannels => lv + av + bv,
                        EnergyMode::MaxChannels => lv.max(*av).max(*bv),
                        EnergyMode::LuminanceOnly => unreachable!(),
                    };
                }
                combined.push(out);
            }
            tracing::debug!(?mode, "orientation energy: combined across L/a/b channels");
            combined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_kernel::FilterbankConfig;

    #[test]
    fn energy_of_zero_responses_is_zero() {
        let config = FilterbankConfig {
            n_gauss_scales: 1,
            n_gauss_orientations: 2,
            n_dog_scales: 0,
            ..Default::default()
        };
        let fb = Filterbank::build(config);
        let responses: Vec<Image<f32>> = (0..4).map(|_| Image::<f32>::new(4, 4)).collect();
        let energy = orientation_energy(&fb, &responses, None, EnergyMode::LuminanceOnly);
        assert_eq!(energy.len(), 2);
        for (_, _, v) in energy.get(0).iter_roi() {
            assert_eq!(*v, 0.0);
        }
    }
}
