use crate::types::{Point, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nearness {
    Near,
    Far,
}

/// Where a player stands relative to both points this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Proximity {
    pub point_a: Nearness,
    pub point_b: Nearness,
}

impl Proximity {
    pub fn of(&self, point: Point) -> Nearness {
        match point {
            Point::PointA => self.point_a,
            Point::PointB => self.point_b,
        }
    }

    pub fn is_near(&self, point: Point) -> bool {
        self.of(point) == Nearness::Near
    }

    pub fn near_both(&self) -> bool {
        self.point_a == Nearness::Near && self.point_b == Nearness::Near
    }

    pub fn near_neither(&self) -> bool {
        self.point_a == Nearness::Far && self.point_b == Nearness::Far
    }
}

fn nearness(distance: f32, threshold: f32) -> Nearness {
    if distance < threshold {
        Nearness::Near
    } else {
        Nearness::Far
    }
}

pub fn classify(position: Vec3, point_a: Vec3, point_b: Vec3, threshold: f32) -> Proximity {
    Proximity {
        point_a: nearness(position.distance(point_a), threshold),
        point_b: nearness(position.distance(point_b), threshold),
    }
}
