//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Constrain dimensions to a maximum width, preserving aspect ratio.
///
/// Images already at or below `max_width` are returned unchanged: the
/// pipeline never upscales. The height is rounded to the nearest pixel and
/// never drops below 1, so extreme panoramas still produce a valid image.
///
/// # Examples
/// ```
/// # use artfolio::imaging::constrain_to_width;
/// // 3000x2000 capped at 2048 → 2048x1365
/// assert_eq!(constrain_to_width((3000, 2000), 2048), (2048, 1365));
///
/// // Narrower than the cap: untouched
/// assert_eq!(constrain_to_width((500, 500), 2048), (500, 500));
/// ```
pub fn constrain_to_width(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if max_width == 0 || src_w <= max_width {
        return source;
    }

    let ratio = max_width as f64 / src_w as f64;
    let height = (src_h as f64 * ratio).round().max(1.0) as u32;
    (max_width, height)
}

/// Whether `target` differs from `source`, i.e. a resample is needed.
pub fn needs_resize(source: (u32, u32), target: (u32, u32)) -> bool {
    source != target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_capped_to_max_width() {
        // 3000x2000 → 2048 wide, 2000 * 2048/3000 = 1365.33 → 1365
        assert_eq!(constrain_to_width((3000, 2000), 2048), (2048, 1365));
    }

    #[test]
    fn thumbnail_from_capped_main() {
        // 2048x1365 → 600 wide, 1365 * 600/2048 = 399.9 → 400
        assert_eq!(constrain_to_width((2048, 1365), 600), (600, 400));
    }

    #[test]
    fn portrait_capped_by_width_only() {
        // Height may exceed the width cap; only width is constrained
        assert_eq!(constrain_to_width((3000, 6000), 2048), (2048, 4096));
    }

    #[test]
    fn narrower_image_never_upscaled() {
        assert_eq!(constrain_to_width((500, 500), 2048), (500, 500));
        assert_eq!(constrain_to_width((500, 500), 600), (500, 500));
    }

    #[test]
    fn exact_width_is_unchanged() {
        assert_eq!(constrain_to_width((2048, 1000), 2048), (2048, 1000));
    }

    #[test]
    fn extreme_panorama_keeps_one_pixel_height() {
        assert_eq!(constrain_to_width((10000, 1), 600), (600, 1));
    }

    #[test]
    fn zero_cap_is_treated_as_no_cap() {
        assert_eq!(constrain_to_width((800, 600), 0), (800, 600));
    }

    #[test]
    fn aspect_ratio_preserved_within_rounding() {
        for &(w, h) in &[(4000, 3000), (3001, 1999), (2500, 1), (9999, 7777)] {
            let (nw, nh) = constrain_to_width((w, h), 1024);
            assert_eq!(nw, 1024);
            let expected = h as f64 * 1024.0 / w as f64;
            assert!(
                (nh as f64 - expected).abs() <= 1.0,
                "{w}x{h} → {nw}x{nh}, expected height ≈ {expected}"
            );
        }
    }

    #[test]
    fn needs_resize_detects_change() {
        assert!(needs_resize((3000, 2000), (2048, 1365)));
        assert!(!needs_resize((500, 500), (500, 500)));
    }
}
