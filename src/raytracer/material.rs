use glam::Vec3;

#[derive(Clone, Copy, Debug)]
pub struct Material {
    pub base_color: Vec3,
    pub emissive: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::splat(0.8),
            emissive: Vec3::ZERO,
        }
    }
}

impl Material {
    pub fn diffuse(color: Vec3) -> Self {
        Self {
            base_color: color,
            ..Default::default()
        }
    }

    pub fn emissive(color: Vec3) -> Self {
        Self {
            base_color: Vec3::ZERO,
            emissive: color,
        }
    }
}
