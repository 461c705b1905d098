use glam::Vec3;

pub const RAY_EPSILON: f32 = 0.001;

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Ray {
            origin,
            direction,
            t_min: RAY_EPSILON,
            t_max: f32::INFINITY,
        }
    }

    pub fn with_t_max(mut self, t_max: f32) -> Self {
        self.t_max = t_max;
        self
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[derive(Clone, Copy, Debug)]
pub struct HitData {
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub material_id: u32,
}
