//! Distance and integration helpers on the (x, z) ground plane

/// Physics system for positional queries and integration
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Squared distance between two points
    pub fn distance_sq(x1: f32, z1: f32, x2: f32, z2: f32) -> f32 {
        let dx = x2 - x1;
        let dz = z2 - z1;
        dx * dx + dz * dz
    }

    pub fn distance(x1: f32, z1: f32, x2: f32, z2: f32) -> f32 {
        Self::distance_sq(x1, z1, x2, z2).sqrt()
    }

    /// Check if a point is inside a circle (boundary counts as inside)
    pub fn is_in_zone(x: f32, z: f32, center_x: f32, center_z: f32, radius: f32) -> bool {
        Self::distance_sq(x, z, center_x, center_z) <= radius * radius
    }

    /// Strictly-within-radius test used for hit detection
    pub fn within(x1: f32, z1: f32, x2: f32, z2: f32, radius: f32) -> bool {
        Self::distance_sq(x1, z1, x2, z2) < radius * radius
    }

    /// Advance a position by velocity over `dt` seconds
    pub fn integrate(x: f32, z: f32, vx: f32, vz: f32, dt: f32) -> (f32, f32) {
        (x + vx * dt, z + vz * dt)
    }
}
