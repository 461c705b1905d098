use crate::raytracer::ray::{HitData, Ray};
use glam::Vec3;

pub trait Shape: Send + Sync {
    fn hit(&self, ray: &Ray) -> Option<HitData>;

    fn hit_any(&self, ray: &Ray) -> bool {
        self.hit(ray).is_some()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material_id: u32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material_id: u32) -> Self {
        Self {
            center,
            radius,
            material_id,
        }
    }
}

impl Shape for Sphere {
    fn hit(&self, ray: &Ray) -> Option<HitData> {
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let mut t = (-half_b - sqrt_d) / a;
        if t < ray.t_min || t > ray.t_max {
            t = (-half_b + sqrt_d) / a;
            if t < ray.t_min || t > ray.t_max {
                return None;
            }
        }

        let point = ray.at(t);
        let outward = (point - self.center) / self.radius;
        let normal = if outward.dot(ray.direction) > 0.0 {
            -outward
        } else {
            outward
        };

        Some(HitData {
            t,
            point,
            normal,
            material_id: self.material_id,
        })
    }
}

/// Infinite plane through `point` facing `normal`.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
    pub material_id: u32,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3, material_id: u32) -> Self {
        Self {
            point,
            normal: normal.normalize(),
            material_id,
        }
    }
}

impl Shape for Plane {
    fn hit(&self, ray: &Ray) -> Option<HitData> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (self.point - ray.origin).dot(self.normal) / denom;
        if t < ray.t_min || t > ray.t_max {
            return None;
        }
        let normal = if denom > 0.0 { -self.normal } else { self.normal };
        Some(HitData {
            t,
            point: ray.at(t),
            normal,
            material_id: self.material_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_hit_faces_the_ray() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, 0);
        let hit = sphere.hit(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-4);
        assert!(hit.normal.dot(Vec3::Z) > 0.999);
    }

    #[test]
    fn sphere_respects_t_max() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z).with_t_max(3.0);
        assert!(!sphere.hit_any(&ray));
    }

    #[test]
    fn plane_parallel_ray_misses() {
        let plane = Plane::new(Vec3::ZERO, Vec3::Y, 0);
        assert!(plane.hit(&Ray::new(Vec3::Y, Vec3::X)).is_none());
        let hit = plane.hit(&Ray::new(Vec3::Y, Vec3::NEG_Y)).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);
    }
}
