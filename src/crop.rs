use crate::raster::{stride_for, RawRaster};

/// Empty pixel lines and columns cut from each edge of a raster.
///
/// A raster without any ink yields the blank state: `right == -1` and
/// `bottom == -1`, with `top` and `left` set to the full height and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropMargins {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl CropMargins {
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            top: height as i32,
            bottom: -1,
            left: width as i32,
            right: -1,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.right == -1
    }
}

/// Crops all background-only lines and columns from the edges of `raster`.
///
/// A pixel is ink when its bit differs from `background`. Returns the
/// margins that were removed and a new, tightly packed raster; a raster
/// without ink returns [`CropMargins::blank`] and an empty raster.
pub fn autocrop(raster: &RawRaster, background: bool) -> (CropMargins, RawRaster) {
    let width = raster.width();
    let height = raster.height();
    let is_ink = |x: usize, y: usize| raster.pixel(x, y) != background;
    let column_has_ink = |x: usize| (0..height).any(|y| is_ink(x, y));
    let row_has_ink = |y: usize| (0..width).any(|x| is_ink(x, y));

    let left = (0..width).position(column_has_ink).unwrap_or(width);
    if left == width {
        return (CropMargins::blank(width, height), RawRaster::default());
    }
    let top = (0..height).position(row_has_ink).unwrap_or(height);
    let right = (0..width).rev().position(column_has_ink).unwrap_or(width);
    let bottom = (0..height).rev().position(row_has_ink).unwrap_or(height);

    let new_width = width - left - right;
    let new_height = height - top - bottom;
    let new_stride = stride_for(new_width);

    let mut data = Vec::with_capacity(new_stride * new_height);
    for y in top..top + new_height {
        let mut line = shift_row_left(raster.row(y), left);
        line.truncate(new_stride);
        if let Some(last) = line.last_mut() {
            *last &= tail_mask(new_width);
        }
        data.extend_from_slice(&line);
    }

    let margins = CropMargins {
        top: top as i32,
        bottom: bottom as i32,
        left: left as i32,
        right: right as i32,
    };
    let cropped = RawRaster::from_parts(new_width, new_height, data);
    (margins, cropped)
}

/// Shifts a packed MSB-first row left by `count` bits. Bits leaving a byte
/// carry into the LSB end of the byte before it; zeros enter from the right.
pub(crate) fn shift_row_left(row: &[u8], count: usize) -> Vec<u8> {
    let byte_shift = count / 8;
    let bit_shift = (count % 8) as u32;
    (0..row.len())
        .map(|i| {
            let hi = row.get(i + byte_shift).copied().unwrap_or(0);
            if bit_shift == 0 {
                return hi;
            }
            let lo = row.get(i + byte_shift + 1).copied().unwrap_or(0);
            (hi << bit_shift) | (lo >> (8 - bit_shift))
        })
        .collect()
}

/// Mask keeping the pixel bits of the last byte of a `width` pixel row.
fn tail_mask(width: usize) -> u8 {
    match width % 8 {
        0 => 0xFF,
        used => 0xFF << (8 - used),
    }
}

impl RawRaster {
    /// Crops using the usual convention that set bits are ink.
    pub fn autocrop(&self) -> (CropMargins, RawRaster) {
        autocrop(self, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn art(lines: &[&str]) -> RawRaster {
        let rows: Vec<Vec<bool>> = lines
            .iter()
            .map(|l| l.chars().map(|c| c == '*').collect())
            .collect();
        RawRaster::from_rows(&rows)
    }

    #[test]
    fn test_crop_margins_add_up() {
        let raster = art(&[
            "..........",
            "...**.....",
            "...*.*....",
            "...**.....",
            "..........",
            "..........",
        ]);
        let (m, cropped) = raster.autocrop();
        assert_eq!(m, CropMargins { top: 1, bottom: 2, left: 3, right: 4 });
        assert_eq!(cropped.width(), 3);
        assert_eq!(cropped.height(), 3);
        assert_eq!(m.left + m.right + cropped.width() as i32, 10);
        assert_eq!(m.top + m.bottom + cropped.height() as i32, 6);
        assert_eq!(cropped.to_string(), "**.\n*.*\n**.\n");
    }

    #[test]
    fn test_crop_is_idempotent() {
        let raster = art(&["*...*", ".*.*.", "..*.."]);
        let (m, cropped) = raster.autocrop();
        assert_eq!(m, CropMargins::default());
        assert_eq!(cropped, raster);

        let (m2, again) = cropped.autocrop();
        assert_eq!(m2, CropMargins::default());
        assert_eq!(again, cropped);
    }

    #[test]
    fn test_blank_raster_yields_sentinel() {
        for (w, h) in [(1, 1), (8, 16), (13, 3), (0, 0), (5, 0)] {
            let (m, cropped) = RawRaster::blank(w, h).autocrop();
            assert!(m.is_blank(), "{w}x{h}");
            assert_eq!(m.right, -1);
            assert_eq!(m.bottom, -1);
            assert_eq!(m.left, w as i32);
            assert_eq!(m.top, h as i32);
            assert!(cropped.is_empty());
        }
    }

    #[test]
    fn test_crop_across_byte_boundary() {
        // 20 pixels wide, ink at columns 6..=13 spanning three source bytes
        let raster = RawRaster::from_fn(20, 2, |x, y| (6..=13).contains(&x) && (y == 0 || x == 13));
        let (m, cropped) = raster.autocrop();
        assert_eq!((m.left, m.right), (6, 6));
        assert_eq!(cropped.width(), 8);
        assert_eq!(cropped.data(), &[0xFF, 0x01]);
    }

    #[test]
    fn test_padding_bits_do_not_leak() {
        // width 5, padding bits of the row byte are garbage
        let raster = RawRaster::new(5, 1, vec![0b0100_0111]).unwrap();
        let (m, cropped) = raster.autocrop();
        assert_eq!((m.left, m.right), (1, 3));
        assert_eq!(cropped.width(), 1);
        assert_eq!(cropped.data(), &[0x80]);
    }

    #[test]
    fn test_inverted_background() {
        let raster = RawRaster::from_fn(4, 4, |x, y| !(x == 2 && y == 1));
        let (m, cropped) = autocrop(&raster, true);
        assert_eq!(m, CropMargins { top: 1, bottom: 2, left: 2, right: 1 });
        assert_eq!((cropped.width(), cropped.height()), (1, 1));
        assert_eq!(cropped.data(), &[0x00]);
    }

    #[test]
    fn test_shift_row_left_ripples_carry() {
        assert_eq!(shift_row_left(&[0b0000_0001, 0b1000_0000], 1), vec![0b0000_0011, 0]);
        assert_eq!(shift_row_left(&[0x0F, 0xF0, 0xAA], 4), vec![0xFF, 0x0A, 0xA0]);
        assert_eq!(shift_row_left(&[0x00, 0x3C, 0x81], 10), vec![0xF2, 0x04, 0x00]);
        assert_eq!(shift_row_left(&[0x12, 0x34], 0), vec![0x12, 0x34]);
    }
}
