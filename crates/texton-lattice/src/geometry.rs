pub type Point = (f32, f32);

fn cross(o: Point, a: Point, b: Point) -> f32 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn on_segment(p: Point, q: Point, r: Point) -> bool {
    r.0 >= p.0.min(q.0) - 1e-6 && r.0 <= p.0.max(q.0) + 1e-6 && r.1 >= p.1.min(q.1) - 1e-6 && r.1 <= p.1.max(q.1) + 1e-6
}

/// Whether segment `p1-p2` crosses segment `q1-q2`, counting a touching
/// endpoint as a crossing.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0)) {
        return true;
    }

    if d1 == 0.0 && on_segment(q1, q2, p1) {
        return true;
    }
    if d2 == 0.0 && on_segment(q1, q2, p2) {
        return true;
    }
    if d3 == 0.0 && on_segment(p1, p2, q1) {
        return true;
    }
    if d4 == 0.0 && on_segment(p1, p2, q2) {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect((0.0, 0.0), (2.0, 2.0), (0.0, 2.0), (2.0, 0.0)));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(!segments_intersect((0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)));
    }

    #[test]
    fn touching_endpoint_counts_as_intersection() {
        assert!(segments_intersect((0.0, 0.0), (1.0, 1.0), (1.0, 1.0), (2.0, 0.0)));
    }
}
