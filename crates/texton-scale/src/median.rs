use texton_grid::Image;

/// Spatial median filter over a square `(2*radius+1)`-side window, clipped at
/// the image border rather than reflected. Ties (an even window count) are
/// resolved by averaging the two middle values.
pub fn median_filter(input: &Image<f32>, radius: usize) -> Image<f32> {
    let width = input.width();
    let height = input.height();
    let roi = input.roi();
    let mut out = input.clone();
    let radius = radius as i64;

    let mut neighbors: Vec<f32> = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
    for y in roi.start_y..roi.end_y {
        for x in roi.start_x..roi.end_x {
            neighbors.clear();
            for dy in -radius..=radius {
                let yy = y as i64 + dy;
                if yy < 0 || yy as usize >= height {
                    continue;
                }
                for dx in -radius..=radius {
                    let xx = x as i64 + dx;
                    if xx < 0 || xx as usize >= width {
                        continue;
                    }
                    neighbors.push(*input.get(xx as usize, yy as usize));
                }
            }
            neighbors.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let n = neighbors.len();
            let mid = n / 2;
            let mut value = neighbors[mid];
            if n % 2 == 0 {
                value = (value + neighbors[mid - 1]) * 0.5;
            }
            *out.get_mut(x, y) = value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use texton_grid::Roi;

    #[test]
    fn median_of_constant_image_is_unchanged() {
        let mut img = Image::<f32>::filled(5, 5, 3.0);
        img.set_roi(Roi::full(5, 5));
        let out = median_filter(&img, 2);
        for (_, _, v) in out.iter_roi() {
            assert_eq!(*v, 3.0);
        }
    }

    #[test]
    fn median_removes_single_pixel_spike() {
        let mut img = Image::<f32>::filled(5, 5, 0.0);
        img.set_roi(Roi::full(5, 5));
        *img.get_mut(2, 2) = 100.0;
        let out = median_filter(&img, 1);
        assert_eq!(*out.get(2, 2), 0.0);
    }
}
