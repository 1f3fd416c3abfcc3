#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure predicate deciding whether two path segments cross.
//!
//! Longitude is treated as the X axis and latitude as the Y axis. Segments
//! that merely share an endpoint never cross, while an endpoint resting on the
//! interior of the other segment (a T-junction) always does. Every equality
//! test uses [`COORDINATE_TOLERANCE`] because coordinates arrive as
//! floating-point degrees.

use std::cmp::Ordering;

use claimfield_core::Position;

/// Largest difference in degrees still treated as the same coordinate.
pub const COORDINATE_TOLERANCE: f64 = 1e-7;

/// Straight segment between two positions.
///
/// Endpoints are stored west to east (south to north on ties) so that the
/// predicate does not depend on the order in which they were supplied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    start: Position,
    end: Position,
}

impl Segment {
    /// Creates a segment joining `a` and `b`.
    #[must_use]
    pub fn new(a: Position, b: Position) -> Self {
        let ordering = a
            .longitude
            .total_cmp(&b.longitude)
            .then_with(|| a.latitude.total_cmp(&b.latitude));
        if ordering == Ordering::Greater {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    /// Western endpoint.
    #[must_use]
    pub const fn start(&self) -> Position {
        self.start
    }

    /// Eastern endpoint.
    #[must_use]
    pub const fn end(&self) -> Position {
        self.end
    }

    /// Reports whether the two segments cross.
    #[must_use]
    pub fn crosses(&self, other: &Segment) -> bool {
        if self.shares_endpoint_with(other) {
            return false;
        }

        match (self.is_vertical(), other.is_vertical()) {
            (true, true) => false,
            (true, false) => vertical_crossed_by(self, other),
            (false, true) => vertical_crossed_by(other, self),
            (false, false) => sloped_cross(self, other),
        }
    }

    fn shares_endpoint_with(&self, other: &Segment) -> bool {
        [self.start, self.end].iter().any(|mine| {
            [other.start, other.end]
                .iter()
                .any(|theirs| same_position(*mine, *theirs))
        })
    }

    fn is_vertical(&self) -> bool {
        same(self.start.longitude, self.end.longitude)
    }

    fn slope(&self) -> f64 {
        (self.end.latitude - self.start.latitude) / (self.end.longitude - self.start.longitude)
    }

    fn intercept(&self, slope: f64) -> f64 {
        self.start.latitude - slope * self.start.longitude
    }

    fn spans_longitude(&self, longitude: f64) -> bool {
        longitude > self.start.longitude && longitude < self.end.longitude
    }

    fn touches_longitude(&self, longitude: f64) -> bool {
        longitude > self.start.longitude - COORDINATE_TOLERANCE
            && longitude < self.end.longitude + COORDINATE_TOLERANCE
    }

    fn has_endpoint_longitude(&self, longitude: f64) -> bool {
        same(longitude, self.start.longitude) || same(longitude, self.end.longitude)
    }
}

/// Reports whether segment `a1`–`a2` crosses segment `b1`–`b2`.
#[must_use]
pub fn segments_cross(a1: Position, a2: Position, b1: Position, b2: Position) -> bool {
    Segment::new(a1, a2).crosses(&Segment::new(b1, b2))
}

/// Reports whether `segment` crosses any segment of `network`.
pub fn crosses_any<I>(segment: &Segment, network: I) -> bool
where
    I: IntoIterator<Item = Segment>,
{
    network.into_iter().any(|other| segment.crosses(&other))
}

fn vertical_crossed_by(vertical: &Segment, line: &Segment) -> bool {
    let longitude = vertical.start.longitude;
    if line.end.longitude < longitude || line.start.longitude > longitude {
        return false;
    }

    let slope = line.slope();
    let latitude = slope * (longitude - line.start.longitude) + line.start.latitude;
    if same(latitude, vertical.start.latitude) || same(latitude, vertical.end.latitude) {
        return true;
    }

    let low = vertical.start.latitude.min(vertical.end.latitude);
    let high = vertical.start.latitude.max(vertical.end.latitude);
    latitude > low && latitude < high
}

fn sloped_cross(first: &Segment, second: &Segment) -> bool {
    let first_slope = first.slope();
    let second_slope = second.slope();
    if same(first_slope, second_slope) {
        return false;
    }

    let first_intercept = first.intercept(first_slope);
    let second_intercept = second.intercept(second_slope);
    let longitude = -(first_intercept - second_intercept) / (first_slope - second_slope);

    // An endpoint resting on the other segment.
    if (first.has_endpoint_longitude(longitude) || second.has_endpoint_longitude(longitude))
        && first.touches_longitude(longitude)
        && second.touches_longitude(longitude)
    {
        return true;
    }

    first.spans_longitude(longitude) && second.spans_longitude(longitude)
}

fn same(a: f64, b: f64) -> bool {
    (a - b).abs() < COORDINATE_TOLERANCE
}

fn same_position(a: Position, b: Position) -> bool {
    same(a.latitude, b.latitude) && same(a.longitude, b.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_endpoints_are_ordered_west_to_east() {
        let east = Position::new(1.0, 2.0);
        let west = Position::new(5.0, -1.0);
        let segment = Segment::new(east, west);
        assert_eq!(segment.start(), west);
        assert_eq!(segment.end(), east);
    }

    #[test]
    fn vertical_ordering_breaks_ties_by_latitude() {
        let north = Position::new(3.0, 1.0);
        let south = Position::new(-3.0, 1.0);
        assert_eq!(Segment::new(north, south).start(), south);
    }

    #[test]
    fn crosses_any_stops_on_first_crossing_segment() {
        let probe = Segment::new(Position::new(0.0, 0.0), Position::new(2.0, 2.0));
        let network = vec![
            Segment::new(Position::new(10.0, 10.0), Position::new(11.0, 11.0)),
            Segment::new(Position::new(0.0, 2.0), Position::new(2.0, 0.0)),
        ];
        assert!(crosses_any(&probe, network.iter().copied()));
        assert!(!crosses_any(&probe, network.into_iter().take(1)));
    }
}
