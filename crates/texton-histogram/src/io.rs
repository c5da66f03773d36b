use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

use crate::histogram::Axis;
use crate::histogram_image::HistogramImage;

/// Writes the self-describing binary histogram format: an ASCII header line
/// of `width height n_bins_x n_bins_y n_bins_z`, a second line of the six
/// per-axis `min max` floats (`0 0` for an axis that isn't present), then
/// `height` rows of `width * n_bins_x * max(n_bins_y,1) * max(n_bins_z,1)`
/// little-endian `f32` values in row-major pixel order.
pub fn write_histogram_image<W: Write>(writer: W, image: &HistogramImage) -> io::Result<()> {
    let mut w = BufWriter::new(writer);
    let axes = image.axes();
    let dims: Vec<usize> = (0..3).map(|i| axes.get(i).map(|a| a.n_bins).unwrap_or(0)).collect();
    writeln!(w, "{} {} {} {} {}", image.width(), image.height(), dims[0], dims[1], dims[2])?;

    let mut ranges = Vec::with_capacity(6);
    for i in 0..3 {
        match axes.get(i) {
            Some(a) => {
                ranges.push(a.min);
                ranges.push(a.max);
            }
            None => {
                ranges.push(0.0);
                ranges.push(0.0);
            }
        }
    }
    writeln!(w, "{} {} {} {} {} {}", ranges[0], ranges[1], ranges[2], ranges[3], ranges[4], ranges[5])?;

    for y in 0..image.height() {
        for x in 0..image.width() {
            for &value in image.get(x, y).bins() {
                w.write_all(&value.to_le_bytes())?;
            }
        }
    }
    w.flush()
}

/// Reads back the format written by [`write_histogram_image`].
pub fn read_histogram_image<R: Read>(reader: R) -> io::Result<HistogramImage> {
    let mut r = BufReader::new(reader);

    let mut dims_line = String::new();
    r.read_line(&mut dims_line)?;
    let dims: Vec<usize> = dims_line
        .split_whitespace()
        .map(|tok| tok.parse().map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "malformed dimension header")))
        .collect::<Result<_, _>>()?;
    if dims.len() != 5 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "expected 5 dimension fields"));
    }
    let (width, height, n_bins_x, n_bins_y, n_bins_z) = (dims[0], dims[1], dims[2], dims[3], dims[4]);

    let mut range_line = String::new();
    r.read_line(&mut range_line)?;
    let ranges: Vec<f32> = range_line
        .split_whitespace()
        .map(|tok| tok.parse().map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "malformed range header")))
        .collect::<Result<_, _>>()?;
    if ranges.len() != 6 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "expected 6 range fields"));
    }

    let mut axes = Vec::new();
    for (i, &n_bins) in [n_bins_x, n_bins_y, n_bins_z].iter().enumerate() {
        if n_bins > 0 {
            axes.push(Axis {
                n_bins,
                min: ranges[2 * i],
                max: ranges[2 * i + 1],
            });
        }
    }
    if axes.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "histogram must have at least one axis"));
    }

    let cell_len: usize = axes.iter().map(|a| a.n_bins).product();
    let mut out = HistogramImage::new(width, height, axes);
    let mut buf = [0u8; 4];
    for y in 0..height {
        for x in 0..width {
            let mut cell = out.get(x, y).clone();
            for flat in 0..cell_len {
                r.read_exact(&mut buf)?;
                cell.increment_flat(flat, f32::from_le_bytes(buf));
            }
            out.set(x, y, cell);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Histogram;

    #[test]
    fn round_trips_a_small_histogram_image() {
        let axes = vec![Axis { n_bins: 4, min: 0.0, max: 4.0 }];
        let mut image = HistogramImage::new(2, 2, axes.clone());
        let mut h = Histogram::new(axes);
        h.accumulate(&[1.5], 1.0);
        image.set(0, 0, h);

        let mut buf = Vec::new();
        write_histogram_image(&mut buf, &image).unwrap();
        let back = read_histogram_image(&buf[..]).unwrap();

        assert_eq!(back.width(), 2);
        assert_eq!(back.height(), 2);
        assert_eq!(back.get(0, 0).bins(), image.get(0, 0).bins());
    }

    #[test]
    fn rejects_truncated_header() {
        let bad = b"not a valid header\n";
        assert!(read_histogram_image(&bad[..]).is_err());
    }
}
