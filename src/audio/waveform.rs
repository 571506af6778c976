//! Waveform path geometry for the visualizer.
//!
//! Pure sample-to-pixel math, kept free of egui types so it can be tested
//! directly.  The UI polls [`Analyser::byte_time_domain`] each frame and
//! hands the bytes to [`path`], which produces the polyline the painter
//! strokes.
//!
//! [`Analyser::byte_time_domain`]: crate::audio::Analyser::byte_time_domain

/// A point in canvas-local coordinates (origin top-left, y grows downward).
pub type Point = (f32, f32);

/// Build a smoothed waveform polyline spanning `width` × `height`.
///
/// Byte samples are normalized by 128 and centered at half the height, so a
/// flat 128 buffer yields the horizontal center line.  Consecutive samples
/// are joined by quadratic segments through their midpoints (control point =
/// previous sample) and flattened to two line segments each, which rounds
/// off the jagged sample-to-sample steps.
///
/// Buffers shorter than 2 samples, or a degenerate canvas, yield an empty
/// path — the per-point x spacing `width / (len − 1)` is undefined below
/// that.
pub fn path(bytes: &[u8], width: f32, height: f32) -> Vec<Point> {
    if bytes.len() < 2 || width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }

    let slice_width = width / (bytes.len() - 1) as f32;
    let to_y = |byte: u8| (byte as f32 / 128.0) * (height / 2.0);

    // Two flattening steps per sample, plus the endpoints.
    let mut points = Vec::with_capacity(bytes.len() * 2 + 1);

    let mut prev: Point = (0.0, to_y(bytes[0]));
    points.push(prev);

    for (i, &byte) in bytes.iter().enumerate().skip(1) {
        let sample: Point = (i as f32 * slice_width, to_y(byte));
        let mid: Point = midpoint(prev, sample);

        // Quadratic from the current path end, controlled by the previous
        // sample, ending at the midpoint — flattened to two line segments.
        let from: Point = points[points.len() - 1];
        points.push(quad_at_half(from, prev, mid));
        points.push(mid);
        prev = sample;
    }

    // Close the trace at the final sample so the curve spans the full width.
    points.push(prev);
    points
}

fn midpoint(a: Point, b: Point) -> Point {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Quadratic Bézier `B(0.5)` for start `p0`, control `p1`, end `p2`.
fn quad_at_half(p0: Point, p1: Point, p2: Point) -> Point {
    (
        0.25 * p0.0 + 0.5 * p1.0 + 0.25 * p2.0,
        0.25 * p0.1 + 0.5 * p1.1 + 0.25 * p2.1,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn fewer_than_two_samples_yields_empty_path() {
        assert!(path(&[], 100.0, 50.0).is_empty());
        assert!(path(&[128], 100.0, 50.0).is_empty());
    }

    #[test]
    fn degenerate_canvas_yields_empty_path() {
        assert!(path(&[128, 128], 0.0, 50.0).is_empty());
        assert!(path(&[128, 128], 100.0, -1.0).is_empty());
    }

    #[test]
    fn flat_buffer_draws_the_center_line() {
        let pts = path(&[128; 32], 320.0, 100.0);
        assert!(!pts.is_empty());
        for &(_, y) in &pts {
            assert!((y - 50.0).abs() < EPS, "y off center: {y}");
        }
    }

    #[test]
    fn path_spans_the_full_width() {
        let pts = path(&[128, 200, 60, 128], 300.0, 100.0);
        let first = pts.first().copied().unwrap();
        let last = pts.last().copied().unwrap();
        assert!((first.0 - 0.0).abs() < EPS);
        assert!((last.0 - 300.0).abs() < EPS);
    }

    #[test]
    fn x_coordinates_never_decrease() {
        let bytes: Vec<u8> = (0..64).map(|i| 100 + (i % 56) as u8).collect();
        let pts = path(&bytes, 640.0, 80.0);
        for pair in pts.windows(2) {
            assert!(
                pair[1].0 >= pair[0].0 - EPS,
                "x went backwards: {:?} -> {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn full_scale_bytes_map_to_canvas_extremes() {
        // byte 0 → y 0 (top), byte 255 → just under full height
        let pts = path(&[0, 0], 10.0, 100.0);
        assert!((pts[0].1 - 0.0).abs() < EPS);

        let pts = path(&[255, 255], 10.0, 100.0);
        let expected = (255.0 / 128.0) * 50.0;
        assert!((pts[0].1 - expected).abs() < EPS);
    }

    #[test]
    fn midpoint_smoothing_stays_between_neighbor_levels() {
        // A single step from low to high: every interior point must sit
        // inside the [low, high] band — no overshoot from the smoothing.
        let pts = path(&[64, 64, 192, 192], 300.0, 100.0);
        let lo = (64.0 / 128.0) * 50.0;
        let hi = (192.0 / 128.0) * 50.0;
        for &(_, y) in &pts {
            assert!(y >= lo - EPS && y <= hi + EPS, "overshoot: {y}");
        }
    }
}
