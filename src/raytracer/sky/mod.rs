use glam::Vec3;

pub trait Sky: Send + Sync {
    fn sample(&self, direction: Vec3) -> Vec3;
}

/// Vertical blend between a horizon and a zenith colour.
#[derive(Clone, Copy, Debug)]
pub struct GradientSky {
    pub horizon: Vec3,
    pub zenith: Vec3,
}

impl GradientSky {
    pub fn new(horizon: Vec3, zenith: Vec3) -> Self {
        Self { horizon, zenith }
    }

    pub fn solid(color: Vec3) -> Self {
        Self::new(color, color)
    }
}

impl Default for GradientSky {
    fn default() -> Self {
        Self::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.5, 0.7, 1.0))
    }
}

impl Sky for GradientSky {
    fn sample(&self, direction: Vec3) -> Vec3 {
        let t = 0.5 * (direction.normalize_or_zero().y + 1.0);
        self.horizon.lerp(self.zenith, t)
    }
}
