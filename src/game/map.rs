//! Static map geometry: walls, spawn points and the playable square

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Slack added around every wall for collision tests
pub const WALL_MARGIN: f32 = 0.5;

/// Axis-aligned wall rectangle, centered on (x, z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
}

impl Wall {
    pub fn new(x: f32, z: f32, width: f32, depth: f32) -> Self {
        Self { x, z, width, depth }
    }

    /// Point test against the half extents grown by `margin`
    pub fn contains(&self, x: f32, z: f32, margin: f32) -> bool {
        (x - self.x).abs() < self.width / 2.0 + margin
            && (z - self.z).abs() < self.depth / 2.0 + margin
    }

    /// Distance from a point to the rectangle edge (0 inside)
    pub fn distance_to(&self, x: f32, z: f32) -> f32 {
        let dx = ((x - self.x).abs() - self.width / 2.0).max(0.0);
        let dz = ((z - self.z).abs() - self.depth / 2.0).max(0.0);
        (dx * dx + dz * dz).sqrt()
    }
}

/// Named spawn location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub z: f32,
}

/// Immutable map data, loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapGeometry {
    /// The map spans [-half_size, half_size] on both axes
    pub half_size: f32,
    pub walls: Vec<Wall>,
    pub spawn_points: Vec<SpawnPoint>,
}

/// Map loading errors
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Failed to read map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse map file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid map: {0}")]
    Invalid(String),
}

impl MapGeometry {
    /// Load a map from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, MapError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, MapError> {
        let map: MapGeometry = serde_json::from_str(raw)?;
        map.validate()?;
        Ok(map)
    }

    fn validate(&self) -> Result<(), MapError> {
        if !(self.half_size > 0.0) {
            return Err(MapError::Invalid(format!(
                "half_size must be positive, got {}",
                self.half_size
            )));
        }
        if let Some(wall) = self
            .walls
            .iter()
            .find(|w| !(w.width > 0.0 && w.depth > 0.0))
        {
            return Err(MapError::Invalid(format!(
                "wall at ({}, {}) has non-positive extents",
                wall.x, wall.z
            )));
        }
        Ok(())
    }

    /// Built-in arena used when no map file is configured
    pub fn default_arena() -> Self {
        let walls = vec![
            // Center cross
            Wall::new(0.0, 12.0, 10.0, 1.0),
            Wall::new(0.0, -12.0, 10.0, 1.0),
            Wall::new(12.0, 0.0, 1.0, 10.0),
            Wall::new(-12.0, 0.0, 1.0, 10.0),
            // Mid-ring cover
            Wall::new(30.0, 30.0, 6.0, 6.0),
            Wall::new(-30.0, 30.0, 6.0, 6.0),
            Wall::new(30.0, -30.0, 6.0, 6.0),
            Wall::new(-30.0, -30.0, 6.0, 6.0),
            Wall::new(0.0, 45.0, 16.0, 2.0),
            Wall::new(0.0, -45.0, 16.0, 2.0),
            Wall::new(45.0, 0.0, 2.0, 16.0),
            Wall::new(-45.0, 0.0, 2.0, 16.0),
            // Outer ruins
            Wall::new(65.0, 65.0, 12.0, 2.0),
            Wall::new(-65.0, -65.0, 12.0, 2.0),
            Wall::new(65.0, -65.0, 2.0, 12.0),
            Wall::new(-65.0, 65.0, 2.0, 12.0),
        ];

        let spawn_points = [
            ("north", 0.0, 25.0),
            ("south", 0.0, -25.0),
            ("east", 25.0, 0.0),
            ("west", -25.0, 0.0),
            ("north_east", 40.0, 40.0),
            ("north_west", -40.0, 40.0),
            ("south_east", 40.0, -40.0),
            ("south_west", -40.0, -40.0),
        ]
        .into_iter()
        .map(|(name, x, z)| SpawnPoint {
            name: name.to_string(),
            x,
            z,
        })
        .collect();

        Self {
            half_size: 100.0,
            walls,
            spawn_points,
        }
    }

    /// Is the point inside any wall (margin included)?
    pub fn is_inside_any_wall(&self, x: f32, z: f32) -> bool {
        self.walls.iter().any(|w| w.contains(x, z, WALL_MARGIN))
    }

    /// Does a circle of `radius` overlap any wall?
    pub fn circle_hits_wall(&self, x: f32, z: f32, radius: f32) -> bool {
        self.nearest_obstruction(x, z)
            .is_some_and(|(_, distance)| distance < radius + WALL_MARGIN)
    }

    /// Closest wall and the distance from the point to its edge
    pub fn nearest_obstruction(&self, x: f32, z: f32) -> Option<(&Wall, f32)> {
        self.walls
            .iter()
            .map(|w| (w, w.distance_to(x, z)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn is_out_of_bounds(&self, x: f32, z: f32) -> bool {
        x.abs() > self.half_size || z.abs() > self.half_size
    }

    /// Spawn points whose circle of `clearance` overlaps a wall
    pub fn blocked_spawns(&self, clearance: f32) -> Vec<&SpawnPoint> {
        self.spawn_points
            .iter()
            .filter(|s| self.circle_hits_wall(s.x, s.z, clearance))
            .collect()
    }

    /// Pick a spawn point at random; the map center when the map has none
    pub fn random_spawn<R: Rng>(&self, rng: &mut R) -> (f32, f32) {
        if self.spawn_points.is_empty() {
            return (0.0, 0.0);
        }
        let spawn = &self.spawn_points[rng.gen_range(0..self.spawn_points.len())];
        (spawn.x, spawn.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn wall_containment_uses_margin() {
        let map = MapGeometry {
            half_size: 50.0,
            walls: vec![Wall::new(10.0, 0.0, 2.0, 4.0)],
            spawn_points: vec![],
        };

        assert!(map.is_inside_any_wall(10.0, 0.0));
        // Half width 1.0 + margin 0.5
        assert!(map.is_inside_any_wall(11.4, 0.0));
        assert!(!map.is_inside_any_wall(11.6, 0.0));
        assert!(map.is_inside_any_wall(10.0, -2.4));
        assert!(!map.is_inside_any_wall(10.0, -2.6));
    }

    #[test]
    fn nearest_obstruction_picks_closest_edge() {
        let map = MapGeometry {
            half_size: 50.0,
            walls: vec![Wall::new(10.0, 0.0, 2.0, 2.0), Wall::new(-4.0, 0.0, 2.0, 2.0)],
            spawn_points: vec![],
        };

        let (wall, distance) = map.nearest_obstruction(0.0, 0.0).unwrap();
        assert_eq!(wall.x, -4.0);
        assert!((distance - 3.0).abs() < 1e-5);
        assert!(map.circle_hits_wall(-2.0, 0.0, 1.0));
        assert!(!map.circle_hits_wall(0.0, 0.0, 1.0));
    }

    #[test]
    fn bounds_are_symmetric() {
        let map = MapGeometry::default_arena();
        assert!(!map.is_out_of_bounds(99.9, -99.9));
        assert!(map.is_out_of_bounds(100.1, 0.0));
        assert!(map.is_out_of_bounds(0.0, -100.1));
    }

    #[test]
    fn default_spawns_are_clear_of_walls() {
        let map = MapGeometry::default_arena();
        for spawn in &map.spawn_points {
            assert!(
                !map.is_inside_any_wall(spawn.x, spawn.z),
                "spawn {} is inside a wall",
                spawn.name
            );
        }

        assert!(map.blocked_spawns(1.0).is_empty());

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let (x, z) = map.random_spawn(&mut rng);
        assert!(map.spawn_points.iter().any(|s| s.x == x && s.z == z));
    }

    #[test]
    fn loads_and_validates_json() {
        let map = MapGeometry::from_json_str(
            r#"{"half_size": 40, "walls": [{"x": 1, "z": 2, "width": 3, "depth": 4}],
                "spawn_points": [{"x": 5, "z": 6}]}"#,
        )
        .unwrap();
        assert_eq!(map.walls.len(), 1);
        assert_eq!(map.spawn_points[0].name, "");

        let err = MapGeometry::from_json_str(
            r#"{"half_size": 40, "walls": [{"x": 1, "z": 2, "width": 0, "depth": 4}],
                "spawn_points": []}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MapError::Invalid(_)));

        assert!(matches!(
            MapGeometry::from_json_str("not json"),
            Err(MapError::Parse(_))
        ));
    }
}
