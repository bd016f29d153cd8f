//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions for a width-constrained resize.
///
/// The width is always `target_width`, whether that shrinks or enlarges the
/// source. The height follows the source aspect ratio, rounded, and never
/// drops below one pixel.
///
/// # Examples
/// ```
/// # use folio_assets::imaging::width_constrained_dimensions;
/// // 4000x3000 landscape at 320 wide → 320x240
/// assert_eq!(width_constrained_dimensions((4000, 3000), 320), (320, 240));
///
/// // Small sources are scaled up
/// assert_eq!(width_constrained_dimensions((100, 50), 400), (400, 200));
/// ```
pub fn width_constrained_dimensions(original: (u32, u32), target_width: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return (target_width, orig_h.max(1));
    }
    let height = (orig_h as f64 * target_width as f64 / orig_w as f64).round() as u32;
    (target_width, height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_downscale() {
        assert_eq!(width_constrained_dimensions((2000, 1500), 1000), (1000, 750));
    }

    #[test]
    fn portrait_downscale() {
        // Width is the constraint even when height is the longer edge
        assert_eq!(width_constrained_dimensions((1500, 2000), 96), (96, 128));
    }

    #[test]
    fn upscale_when_source_is_narrower() {
        assert_eq!(width_constrained_dimensions((640, 480), 2560), (2560, 1920));
    }

    #[test]
    fn rounds_height() {
        // 333 * 96 / 1000 = 31.968
        assert_eq!(width_constrained_dimensions((1000, 333), 96), (96, 32));
    }

    #[test]
    fn extreme_panorama_keeps_one_pixel() {
        assert_eq!(width_constrained_dimensions((10000, 10), 96), (96, 1));
    }

    #[test]
    fn degenerate_zero_width_source() {
        assert_eq!(width_constrained_dimensions((0, 10), 96), (96, 10));
    }
}
