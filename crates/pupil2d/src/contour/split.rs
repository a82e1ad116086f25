use imageproc::point::Point;

/// Interior vertices turning by more than this (degrees) end a segment.
pub const SPLIT_ANGLE_DEG: f64 = 80.0;

/// Pieces with fewer points are dropped after splitting.
pub const MIN_SEGMENT_POINTS: usize = 4;

fn turn_at(prev: Point<i32>, at: Point<i32>, next: Point<i32>) -> Option<(f64, i64)> {
    let (ux, uy) = ((at.x - prev.x) as i64, (at.y - prev.y) as i64);
    let (vx, vy) = ((next.x - at.x) as i64, (next.y - at.y) as i64);
    if (ux == 0 && uy == 0) || (vx == 0 && vy == 0) {
        return None;
    }
    let cross = ux * vy - uy * vx;
    let dot = ux * vx + uy * vy;
    let angle = (cross.abs() as f64).atan2(dot as f64).to_degrees();
    Some((angle, cross.signum()))
}

/// Split a simplified polyline where it turns sharply or changes its
/// turning direction.
///
/// The vertex at a split ends one piece and starts the next. Pieces shorter
/// than `min_points` are discarded; the rest are appended to `out` in
/// polyline order.
pub fn split_polyline(
    poly: &[Point<i32>],
    split_angle_deg: f64,
    min_points: usize,
    out: &mut Vec<Vec<Point<i32>>>,
) {
    let mut emit = |piece: &[Point<i32>]| {
        if piece.len() >= min_points {
            out.push(piece.to_vec());
        }
    };
    if poly.len() < 3 {
        emit(poly);
        return;
    }

    let mut start = 0usize;
    let mut turning_sign = 0i64;
    for i in 1..poly.len() - 1 {
        let Some((angle, sign)) = turn_at(poly[i - 1], poly[i], poly[i + 1]) else {
            continue;
        };
        let sharp = angle > split_angle_deg;
        let inflection = sign != 0 && turning_sign != 0 && sign != turning_sign;
        if sharp || inflection {
            emit(&poly[start..=i]);
            start = i;
            turning_sign = 0;
        } else if sign != 0 {
            turning_sign = sign;
        }
    }
    emit(&poly[start..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point<i32>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn split(poly: &[Point<i32>]) -> Vec<Vec<Point<i32>>> {
        let mut out = Vec::new();
        split_polyline(poly, SPLIT_ANGLE_DEG, MIN_SEGMENT_POINTS, &mut out);
        out
    }

    #[test]
    fn smooth_convex_arc_stays_whole() {
        // Regular polygon vertices turn by 30 degrees each
        let poly: Vec<Point<i32>> = (0..8)
            .map(|i| {
                let t = (i as f64 * 30.0).to_radians();
                Point::new((100.0 * t.cos()).round() as i32, (100.0 * t.sin()).round() as i32)
            })
            .collect();
        let pieces = split(&poly);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0], poly);
    }

    #[test]
    fn sharp_corner_splits_and_shares_vertex() {
        // Straight run, then a 90 degree corner at (30, 0)
        let poly = pts(&[(0, 0), (10, 1), (20, 1), (30, 0), (30, 10), (29, 20), (27, 30)]);
        let pieces = split(&poly);
        assert_eq!(pieces.len(), 2);
        assert_eq!(*pieces[0].last().unwrap(), Point::new(30, 0));
        assert_eq!(pieces[1][0], Point::new(30, 0));
        assert_eq!(pieces[0].len() + pieces[1].len(), poly.len() + 1);
    }

    #[test]
    fn inflection_splits_s_curve() {
        // Bends one way twice, then the other way twice
        let poly = pts(&[(0, 0), (10, 0), (20, 2), (30, 6), (40, 8), (50, 8), (60, 6)]);
        let pieces = split(&poly);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0], pts(&[(0, 0), (10, 0), (20, 2), (30, 6)]));
        assert_eq!(pieces[1], pts(&[(30, 6), (40, 8), (50, 8), (60, 6)]));
    }

    #[test]
    fn short_pieces_are_dropped() {
        // Reversal after two points leaves a stub
        let poly = pts(&[(0, 0), (10, 0), (0, 1), (-10, 3), (-20, 7), (-30, 13)]);
        let pieces = split(&poly);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0][0], Point::new(10, 0));
        assert!(split(&pts(&[(0, 0), (5, 5), (9, 9)])).is_empty());
    }
}
