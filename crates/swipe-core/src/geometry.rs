//! Polyline helpers shared by the template recognizer and the trace tools.

use crate::types::Point;

pub fn path_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

pub fn centroid(path: &[Point]) -> Point {
    if path.is_empty() {
        return Point::default();
    }
    let n = path.len() as f64;
    Point::new(
        path.iter().map(|p| p.x).sum::<f64>() / n,
        path.iter().map(|p| p.y).sum::<f64>() / n,
    )
}

/// Resample a path to `n` points spaced evenly along its arc length.
///
/// Degenerate input (a single point or a zero-length path) yields `n` copies of
/// the first point, so every output has exactly `n` entries when `path` is non-empty.
pub fn resample_path(path: &[Point], n: usize) -> Vec<Point> {
    let Some(&first) = path.first() else {
        return vec![];
    };
    if n == 0 {
        return vec![];
    }
    if path.len() < 2 || n == 1 {
        return vec![first; n];
    }

    let total_len = path_length(path);
    if total_len < 1e-9 {
        return vec![first; n];
    }

    let interval = total_len / (n - 1) as f64;
    let mut resampled = Vec::with_capacity(n);
    resampled.push(first);
    let mut accumulated = 0.0;

    for j in 1..path.len() {
        let a = path[j - 1];
        let b = path[j];
        let seg_len = a.distance_to(&b);
        if seg_len < 1e-12 {
            continue;
        }

        while resampled.len() < n && accumulated + seg_len >= interval * resampled.len() as f64 {
            let target = interval * resampled.len() as f64;
            let t = ((target - accumulated) / seg_len).clamp(0.0, 1.0);
            resampled.push(Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)));
        }
        accumulated += seg_len;
    }

    let last = path[path.len() - 1];
    while resampled.len() < n {
        resampled.push(last);
    }
    if let Some(tail) = resampled.last_mut() {
        *tail = last;
    }
    resampled
}

/// Translate the centroid to the origin and scale so the farthest point sits on
/// the unit circle.
pub fn normalize_shape(path: &[Point]) -> Vec<Point> {
    if path.is_empty() {
        return vec![];
    }

    let c = centroid(path);
    let centered: Vec<Point> = path.iter().map(|p| Point::new(p.x - c.x, p.y - c.y)).collect();

    let max_radius = centered
        .iter()
        .map(|p| (p.x * p.x + p.y * p.y).sqrt())
        .fold(0.0_f64, f64::max);

    if max_radius < 1e-9 {
        return centered;
    }

    centered
        .iter()
        .map(|p| Point::new(p.x / max_radius, p.y / max_radius))
        .collect()
}

/// Mean point-to-point distance between two equally sampled paths.
/// Returns `None` when the lengths differ or either path is empty.
pub fn mean_pointwise_distance(a: &[Point], b: &[Point]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let sum: f64 = a.iter().zip(b).map(|(p, q)| p.distance_to(q)).sum();
    Some(sum / a.len() as f64)
}

/// Number of direction changes sharper than `min_angle_deg`, measuring the
/// heading over `window` samples on each side. Adjacent turning samples count
/// as one turn.
pub fn count_turns(path: &[Point], window: usize, min_angle_deg: f64) -> usize {
    let w = window.max(1);
    if path.len() < 2 * w + 1 {
        return 0;
    }
    let min_angle = min_angle_deg.to_radians();
    let mut turns = 0;
    let mut in_turn = false;

    for i in w..path.len() - w {
        let (a, b, c) = (path[i - w], path[i], path[i + w]);
        let (v1x, v1y) = (b.x - a.x, b.y - a.y);
        let (v2x, v2y) = (c.x - b.x, c.y - b.y);
        let n1 = v1x.hypot(v1y);
        let n2 = v2x.hypot(v2y);
        let turning = n1 > 1e-9
            && n2 > 1e-9
            && ((v1x * v2x + v1y * v2y) / (n1 * n2)).clamp(-1.0, 1.0).acos() > min_angle;
        if turning && !in_turn {
            turns += 1;
        }
        in_turn = turning;
    }
    turns
}

/// Insert points along each segment so that consecutive points are at most
/// `step` apart.
pub fn interpolate_path(path: &[Point], step: f64) -> Vec<Point> {
    if path.len() < 2 || step <= 0.0 {
        return path.to_vec();
    }
    let mut out = Vec::with_capacity(path.len());
    out.push(path[0]);
    for w in path.windows(2) {
        let (p1, p2) = (w[0], w[1]);
        let dist = p1.distance_to(&p2);
        if dist > step {
            let n_steps = (dist / step) as usize;
            for j in 1..=n_steps {
                let t = j as f64 / (n_steps + 1) as f64;
                out.push(Point::new(p1.x + t * (p2.x - p1.x), p1.y + t * (p2.y - p1.y)));
            }
        }
        out.push(p2);
    }
    out
}
