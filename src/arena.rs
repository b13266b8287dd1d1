use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::ROOM_SPACING;
use crate::error::ConfigurationError;
use crate::types::{CapturePointSite, RoomKind, Vec3, ZoneType};

#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    pub id: String,
    pub zone: ZoneType,
    pub kind: RoomKind,
    pub row: i32,
    pub col: i32,
    pub position: Vec3,
}

impl Room {
    pub fn site(&self) -> CapturePointSite {
        CapturePointSite {
            position: self.position,
            zone: self.id.clone(),
        }
    }

    /// Whether `position` lies strictly inside this room's square footprint.
    pub fn contains(&self, position: Vec3) -> bool {
        let half = ROOM_SPACING / 2.0;
        (position.x - self.position.x).abs() < half
            && (position.z - self.position.z).abs() < half
            && (position.y - self.position.y).abs() < half
    }
}

#[derive(Clone, Debug)]
pub struct Facility {
    pub side: i32,
    pub rooms: Vec<Room>,
}

impl Facility {
    pub fn room_at(&self, position: Vec3) -> Option<&Room> {
        self.rooms.iter().find(|room| room.contains(position))
    }

    pub fn rooms_in(&self, zone: ZoneType) -> impl Iterator<Item = &Room> {
        self.rooms.iter().filter(move |room| room.zone == zone)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaptureRooms {
    pub point_a: Room,
    pub point_b: Room,
}

pub fn zone_kinds(zone: ZoneType) -> &'static [RoomKind] {
    match zone {
        ZoneType::LightContainment => &[
            RoomKind::Airlock,
            RoomKind::Cafe,
            RoomKind::Crossing,
            RoomKind::Curve,
            RoomKind::Plants,
            RoomKind::Straight,
            RoomKind::Toilets,
            RoomKind::TCross,
        ],
        ZoneType::HeavyContainment => &[
            RoomKind::Armory,
            RoomKind::Crossing,
            RoomKind::Curve,
            RoomKind::Hid,
            RoomKind::Straight,
            RoomKind::TCross,
        ],
        ZoneType::Entrance => &[
            RoomKind::Cafeteria,
            RoomKind::Conference,
            RoomKind::Crossing,
            RoomKind::Curve,
            RoomKind::Straight,
            RoomKind::TCross,
        ],
    }
}

/// Room kinds a capture point may be placed in. Entrance has none.
pub fn capture_point_kinds(zone: ZoneType) -> &'static [RoomKind] {
    match zone {
        ZoneType::LightContainment => &[
            RoomKind::Crossing,
            RoomKind::Curve,
            RoomKind::Straight,
            RoomKind::TCross,
            RoomKind::Plants,
            RoomKind::Toilets,
        ],
        ZoneType::HeavyContainment => &[
            RoomKind::Crossing,
            RoomKind::Armory,
            RoomKind::Curve,
            RoomKind::Hid,
            RoomKind::Straight,
            RoomKind::TCross,
        ],
        ZoneType::Entrance => &[],
    }
}

pub fn spawn_room_kinds(zone: ZoneType) -> &'static [RoomKind] {
    match zone {
        ZoneType::LightContainment => &[
            RoomKind::Airlock,
            RoomKind::Cafe,
            RoomKind::Crossing,
            RoomKind::Curve,
            RoomKind::Plants,
            RoomKind::Straight,
            RoomKind::Toilets,
            RoomKind::TCross,
        ],
        ZoneType::HeavyContainment => &[
            RoomKind::Crossing,
            RoomKind::Curve,
            RoomKind::Hid,
            RoomKind::Straight,
            RoomKind::TCross,
        ],
        ZoneType::Entrance => &[
            RoomKind::Conference,
            RoomKind::Cafeteria,
            RoomKind::Curve,
            RoomKind::Straight,
            RoomKind::TCross,
            RoomKind::Crossing,
        ],
    }
}

fn zone_floor(zone: ZoneType) -> f32 {
    match zone {
        ZoneType::LightContainment => 0.0,
        ZoneType::HeavyContainment => -1_000.0,
        ZoneType::Entrance => 1_000.0,
    }
}

/// Lays out a `side`×`side` grid of rooms for every zone, one floor per zone.
pub fn generate_facility(seed: u64, side: i32) -> Facility {
    let mut rng = StdRng::seed_from_u64(seed);
    let side = side.max(1);
    let mut rooms = Vec::new();
    for zone in [
        ZoneType::LightContainment,
        ZoneType::HeavyContainment,
        ZoneType::Entrance,
    ] {
        let kinds = zone_kinds(zone);
        for row in 0..side {
            for col in 0..side {
                let kind = kinds[rng.random_range(0..kinds.len())];
                rooms.push(Room {
                    id: format!("{}_{}_{}", zone.prefix(), row, col),
                    zone,
                    kind,
                    row,
                    col,
                    position: Vec3::new(
                        col as f32 * ROOM_SPACING,
                        zone_floor(zone),
                        row as f32 * ROOM_SPACING,
                    ),
                });
            }
        }
    }
    Facility { side, rooms }
}

/// Picks the two eligible rooms of `zone` farthest apart. On equal distances
/// the first pair found wins.
pub fn select_capture_rooms(
    rooms: &[Room],
    zone: ZoneType,
) -> Result<CaptureRooms, ConfigurationError> {
    let kinds = capture_point_kinds(zone);
    if kinds.is_empty() {
        return Err(ConfigurationError::UnsupportedZone { zone });
    }
    let candidates: Vec<&Room> = rooms
        .iter()
        .filter(|room| room.zone == zone && kinds.contains(&room.kind))
        .collect();

    let mut best: Option<(usize, usize)> = None;
    let mut max_distance = 0.0f32;
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let distance = candidates[i].position.distance(candidates[j].position);
            if distance > max_distance {
                max_distance = distance;
                best = Some((i, j));
            }
        }
    }

    let Some((a, b)) = best else {
        return Err(ConfigurationError::NotEnoughRooms {
            zone,
            found: candidates.len(),
        });
    };
    Ok(CaptureRooms {
        point_a: candidates[a].clone(),
        point_b: candidates[b].clone(),
    })
}

/// Spawn rooms of `zone`, never one holding a capture point.
pub fn spawn_rooms<'a>(rooms: &'a [Room], zone: ZoneType, capture: &CaptureRooms) -> Vec<&'a Room> {
    let kinds = spawn_room_kinds(zone);
    rooms
        .iter()
        .filter(|room| room.zone == zone && kinds.contains(&room.kind))
        .filter(|room| room.id != capture.point_a.id && room.id != capture.point_b.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, kind: RoomKind, x: f32, z: f32) -> Room {
        Room {
            id: id.to_string(),
            zone: ZoneType::LightContainment,
            kind,
            row: 0,
            col: 0,
            position: Vec3::new(x, 0.0, z),
        }
    }

    #[test]
    fn farthest_eligible_pair_is_selected() {
        let rooms = vec![
            room("near", RoomKind::Curve, 0.0, 0.0),
            room("mid", RoomKind::Straight, 30.0, 0.0),
            room("far_airlock", RoomKind::Airlock, 200.0, 0.0),
            room("far", RoomKind::Plants, 90.0, 40.0),
        ];
        let selected = select_capture_rooms(&rooms, ZoneType::LightContainment)
            .expect("eligible rooms exist");
        assert_eq!(selected.point_a.id, "near");
        assert_eq!(selected.point_b.id, "far");
    }

    #[test]
    fn ties_keep_the_first_pair() {
        let rooms = vec![
            room("a", RoomKind::Curve, 0.0, 0.0),
            room("b", RoomKind::Toilets, 10.0, 0.0),
            room("c", RoomKind::TCross, 0.0, 10.0),
            room("d", RoomKind::Crossing, 10.0, 10.0),
        ];
        let selected = select_capture_rooms(&rooms, ZoneType::LightContainment)
            .expect("eligible rooms exist");
        assert_eq!(selected.point_a.id, "a");
        assert_eq!(selected.point_b.id, "d");
    }

    #[test]
    fn entrance_zone_has_no_capture_rooms() {
        let facility = generate_facility(3, 4);
        assert_eq!(
            select_capture_rooms(&facility.rooms, ZoneType::Entrance),
            Err(ConfigurationError::UnsupportedZone {
                zone: ZoneType::Entrance
            })
        );
    }

    #[test]
    fn single_candidate_is_not_enough() {
        let rooms = vec![
            room("only", RoomKind::Curve, 0.0, 0.0),
            room("cafe", RoomKind::Cafe, 50.0, 0.0),
        ];
        assert_eq!(
            select_capture_rooms(&rooms, ZoneType::LightContainment),
            Err(ConfigurationError::NotEnoughRooms {
                zone: ZoneType::LightContainment,
                found: 1
            })
        );
    }

    #[test]
    fn spawn_rooms_exclude_capture_rooms() {
        let facility = generate_facility(11, 4);
        let capture = select_capture_rooms(&facility.rooms, ZoneType::LightContainment)
            .expect("4x4 light zone has capture rooms");
        let spawns = spawn_rooms(&facility.rooms, ZoneType::LightContainment, &capture);
        assert!(!spawns.is_empty());
        assert!(spawns
            .iter()
            .all(|room| room.id != capture.point_a.id && room.id != capture.point_b.id));
        assert!(spawns
            .iter()
            .all(|room| room.zone == ZoneType::LightContainment));
    }

    #[test]
    fn room_lookup_matches_footprint() {
        let facility = generate_facility(5, 3);
        let target = facility
            .rooms
            .iter()
            .find(|room| room.id == "lcz_1_2")
            .expect("room exists");
        let inside = Vec3::new(target.position.x + 3.0, 1.0, target.position.z - 3.0);
        assert_eq!(facility.room_at(inside).map(|room| room.id.as_str()), Some("lcz_1_2"));

        let boundary = Vec3::new(target.position.x + ROOM_SPACING / 2.0, 0.0, target.position.z);
        assert_eq!(facility.room_at(boundary), None);
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let first = generate_facility(42, 4);
        let second = generate_facility(42, 4);
        assert_eq!(first.rooms, second.rooms);
        assert_eq!(first.rooms_in(ZoneType::HeavyContainment).count(), 16);
    }
}
