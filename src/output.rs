use std::path::Path;

use texton_grid::Image;

use crate::error::Result;

fn normalize_to_u8(values: &[f32]) -> Vec<u8> {
    let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    let span = (hi - lo).max(1e-6);
    values.iter().map(|&v| (((v - lo) / span) * 255.0).round().clamp(0.0, 255.0) as u8).collect()
}

/// Writes a float map as an 8-bit grayscale PNG, rescaled so its observed
/// min/max land on 0/255.
pub fn save_float_map_png(image: &Image<f32>, path: &Path) -> Result<()> {
    let width = image.width();
    let height = image.height();
    let mut values = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            values[y * width + x] = *image.get(x, y);
        }
    }
    let buf = normalize_to_u8(&values);
    let img = image::GrayImage::from_raw(width as u32, height as u32, buf).expect("buffer length matches width * height");
    img.save(path)?;
    Ok(())
}

/// Writes an integer label map as an 8-bit grayscale PNG, rescaled by the
/// observed label range so distinct labels are visually distinguishable.
pub fn save_label_map_png(image: &Image<i32>, path: &Path) -> Result<()> {
    let width = image.width();
    let height = image.height();
    let mut values = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            values[y * width + x] = *image.get(x, y) as f32;
        }
    }
    let buf = normalize_to_u8(&values);
    let img = image::GrayImage::from_raw(width as u32, height as u32, buf).expect("buffer length matches width * height");
    img.save(path)?;
    Ok(())
}

/// Writes a byte mask image (0/255-valued) as-is.
pub fn save_mask_png(image: &Image<u8>, path: &Path) -> Result<()> {
    let width = image.width();
    let height = image.height();
    let mut buf = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            buf[y * width + x] = *image.get(x, y);
        }
    }
    let img = image::GrayImage::from_raw(width as u32, height as u32, buf).expect("buffer length matches width * height");
    img.save(path)?;
    Ok(())
}
