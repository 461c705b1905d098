use super::sampling::{clamp_radiance, cosine_direction};
use super::Tracer;
use crate::raytracer::ray::{Ray, RAY_EPSILON};
use crate::raytracer::rng::Rng;
use crate::raytracer::sampler::CameraSample;
use crate::raytracer::scene::SceneAccess;
use glam::Vec3;
use std::f32::consts::FRAC_1_PI;

/// Single-bounce shading: emission, shadowed sun, and one sky-visibility probe.
pub struct DirectLighting;

impl DirectLighting {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DirectLighting {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for DirectLighting {
    fn trace(&self, scene: &dyn SceneAccess, ray: &Ray, sample: &CameraSample, rng: &mut Rng) -> Vec3 {
        let Some(hit) = scene.hit(ray) else {
            return scene.sample_sky(ray.direction);
        };

        let material = scene.get_material(hit.material_id);
        let origin = hit.point + hit.normal * RAY_EPSILON;
        let mut radiance = material.emissive;

        if let Some(sun) = scene.get_sun() {
            let to_light = sun.to_light();
            let n_dot_l = hit.normal.dot(to_light);
            if n_dot_l > 0.0 && !scene.hit_any(&Ray::new(origin, to_light)) {
                radiance += material.base_color * FRAC_1_PI * sun.color * n_dot_l;
            }
        }

        let (u1, u2) = match sample.dims.as_slice() {
            [u1, u2, ..] => (*u1, *u2),
            _ => (rng.next(), rng.next()),
        };
        let sky_dir = cosine_direction(hit.normal, u1, u2);
        if !scene.hit_any(&Ray::new(origin, sky_dir)) {
            radiance += material.base_color * scene.sample_sky(sky_dir);
        }

        clamp_radiance(radiance)
    }

    fn bake_samples(&self, _scene: &dyn SceneAccess, sample: &mut CameraSample) {
        sample.request_dimensions(2);
    }
}
