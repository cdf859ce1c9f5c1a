//! Pure dimension math. No I/O, no pixels.

/// Default ceiling on the pixel count of a single variant.
pub const DEFAULT_MAX_VARIANT_PIXELS: u64 = 100_000_000;

/// Pixel count of a `width × height` raster, without overflow.
pub fn pixel_count(width: u32, height: u32) -> u64 {
    width as u64 * height as u64
}

/// Check a resize target before any buffer is allocated.
///
/// Returns a human-readable reason when the target is rejected.
pub fn check_resize_target(width: u32, height: u32, max_pixels: u64) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err(format!("target {width}x{height} has a zero dimension"));
    }
    let pixels = pixel_count(width, height);
    if pixels > max_pixels {
        return Err(format!(
            "target {width}x{height} is {pixels} pixels, limit is {max_pixels}"
        ));
    }
    Ok(())
}
