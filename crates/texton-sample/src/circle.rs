use texton_grid::Image;

/// Offsets `(dx, dy)` on the digital circumference of integer radius
/// `radius`: every point whose rounded Euclidean distance from the origin
/// equals `radius`. Radius 0 is just the center point.
pub fn circumference_offsets(radius: i64) -> Vec<(i64, i64)> {
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            if dist.round() as i64 == radius {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// A filled disc of `radius`: an odd-side byte image, 255 inside, 0 outside.
pub fn filled_disc_mask(radius: usize) -> Image<u8> {
    let side = 2 * radius + 1;
    let mut img = Image::<u8>::new(side, side);
    let center = radius as i64;
    for y in 0..side {
        for x in 0..side {
            let dx = x as i64 - center;
            let dy = y as i64 - center;
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            if dist.round() as i64 <= radius as i64 {
                *img.get_mut(x, y) = 255;
            }
        }
    }
    img
}

/// Pre-rasterized disc masks for every integer radius in `[r_min, r_max]`,
/// indexed by `radius - r_min`.
pub fn circle_masks(r_min: usize, r_max: usize) -> Vec<Image<u8>> {
    (r_min..=r_max).map(filled_disc_mask).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_mask_has_odd_side_and_center_on() {
        let mask = filled_disc_mask(3);
        assert_eq!(mask.width(), 7);
        assert_eq!(mask.height(), 7);
        assert_eq!(*mask.get(3, 3), 255);
    }

    #[test]
    fn disc_mask_corner_is_outside() {
        let mask = filled_disc_mask(3);
        assert_eq!(*mask.get(0, 0), 0);
    }

    #[test]
    fn circumference_radius_zero_is_just_center() {
        let offsets = circumference_offsets(0);
        assert_eq!(offsets, vec![(0, 0)]);
    }
}
