use crate::perception::types::ScreenSize;

/// Converts a fractional screen position (0.0–1.0 of width/height) to device
/// pixels, truncating toward zero.
///
/// Values outside 0.0–1.0 are passed through and land off-screen.
pub fn normalize(x: f64, y: f64, screen: ScreenSize) -> (i32, i32) {
    let px = (x * screen.width as f64) as i32;
    let py = (y * screen.height as f64) as i32;
    (px, py)
}

/// Evenly spaced points from `from` (exclusive) to `to` (inclusive).
pub fn interpolate(from: (i32, i32), to: (i32, i32), steps: u32) -> Vec<(i32, i32)> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let x = from.0 as f64 + (to.0 - from.0) as f64 * t;
            let y = from.1 as f64 + (to.1 - from.1) as f64 * t;
            (x.round() as i32, y.round() as i32)
        })
        .collect()
}
