use glam::Vec3;

/// Sun-style light. `direction` points from the light into the scene.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self {
            direction: direction.normalize(),
            color,
        }
    }

    #[inline]
    pub fn to_light(&self) -> Vec3 {
        -self.direction
    }
}
