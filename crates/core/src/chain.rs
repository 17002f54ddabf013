//! Joining per-cell segments into polylines.
//!
//! Neighbouring cells compute their shared edge crossing with identical
//! inputs, so matching endpoints compare equal bit for bit. Segments are
//! indexed by endpoint and walked in both directions from each unvisited
//! segment.

use std::collections::HashMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::contour::Segment;

/// An ordered chain of points. `closed` chains end where they began; the
/// first point is not repeated at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<DVec2>,
    pub closed: bool,
}

impl Polyline {
    /// Sum of the lengths of its edges, including the closing edge.
    pub fn length(&self) -> f64 {
        let open: f64 = self.points.windows(2).map(|w| w[0].distance(w[1])).sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) => open + last.distance(*first),
            _ => open,
        }
    }
}

type Key = (u64, u64);

fn key(p: DVec2) -> Key {
    // +0.0 and -0.0 are the same point.
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

/// Chains segments that share endpoints into polylines.
///
/// Zero-length segments are dropped. Output order follows the first
/// unvisited segment of each chain in input order.
pub fn chain_segments(segments: &[Segment]) -> Vec<Polyline> {
    let segments: Vec<&Segment> = segments.iter().filter(|s| key(s.start) != key(s.end)).collect();

    let mut by_point: HashMap<Key, Vec<usize>> = HashMap::with_capacity(segments.len() * 2);
    for (idx, seg) in segments.iter().enumerate() {
        by_point.entry(key(seg.start)).or_default().push(idx);
        by_point.entry(key(seg.end)).or_default().push(idx);
    }

    let mut used = vec![false; segments.len()];
    let mut polylines = Vec::new();

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let start = segments[first].start;
        let mut forward = vec![start, segments[first].end];
        extend(&mut forward, &segments, &by_point, &mut used);

        let closed = forward.len() > 2 && key(forward[forward.len() - 1]) == key(start);
        if closed {
            forward.pop();
            polylines.push(Polyline {
                points: forward,
                closed: true,
            });
            continue;
        }

        let mut backward = vec![start];
        extend(&mut backward, &segments, &by_point, &mut used);
        backward.reverse();
        backward.pop();
        backward.extend(forward);
        polylines.push(Polyline {
            points: backward,
            closed: false,
        });
    }
    polylines
}

/// Follows unused segments from the last point of `chain` until none remain
/// or the chain returns to its first point.
fn extend(
    chain: &mut Vec<DVec2>,
    segments: &[&Segment],
    by_point: &HashMap<Key, Vec<usize>>,
    used: &mut [bool],
) {
    let origin = key(chain[0]);
    loop {
        let Some(&tip) = chain.last() else { return };
        let tip_key = key(tip);
        if chain.len() > 2 && tip_key == origin {
            return;
        }
        let next = by_point
            .get(&tip_key)
            .and_then(|ids| ids.iter().copied().find(|&i| !used[i]));
        let Some(idx) = next else { return };
        used[idx] = true;
        let seg = segments[idx];
        let other = if key(seg.start) == tip_key { seg.end } else { seg.start };
        chain.push(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment {
        Segment::new(DVec2::new(ax, ay), DVec2::new(bx, by))
    }

    #[test]
    fn empty_input_gives_no_polylines() {
        assert!(chain_segments(&[]).is_empty());
    }

    #[test]
    fn single_segment_is_open_polyline() {
        let lines = chain_segments(&[seg(0.0, 0.0, 1.0, 0.0)]);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].closed);
        assert_eq!(lines[0].points.len(), 2);
    }

    #[test]
    fn square_closes() {
        let lines = chain_segments(&[
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 1.0, 1.0, 0.0),
            seg(1.0, 1.0, 0.0, 1.0),
            seg(0.0, 1.0, 0.0, 0.0),
        ]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].closed);
        assert_eq!(lines[0].points.len(), 4);
        assert!((lines[0].length() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn open_chain_is_joined_from_the_middle() {
        // Starts on the middle segment; both directions must be followed.
        let lines = chain_segments(&[
            seg(1.0, 0.0, 2.0, 0.0),
            seg(0.0, 0.0, 1.0, 0.0),
            seg(2.0, 0.0, 3.0, 0.0),
        ]);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].closed);
        let xs: Vec<f64> = lines[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
        assert!((lines[0].length() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn disjoint_segments_stay_apart() {
        let lines = chain_segments(&[seg(0.0, 0.0, 1.0, 0.0), seg(5.0, 5.0, 6.0, 5.0)]);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn zero_length_segments_are_dropped() {
        let lines = chain_segments(&[seg(2.0, 2.0, 2.0, 2.0)]);
        assert!(lines.is_empty());
    }

    #[test]
    fn negative_zero_matches_positive_zero() {
        let lines = chain_segments(&[seg(-0.0, 0.0, 1.0, 0.0), seg(1.0, 0.0, 0.0, 0.0)]);
        assert_eq!(lines.len(), 1);
    }
}
