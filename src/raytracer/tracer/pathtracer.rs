use super::sampling::{clamp_radiance, cosine_direction};
use super::Tracer;
use crate::raytracer::ray::{Ray, RAY_EPSILON};
use crate::raytracer::rng::Rng;
use crate::raytracer::sampler::CameraSample;
use crate::raytracer::scene::SceneAccess;
use glam::Vec3;
use std::f32::consts::FRAC_1_PI;

/// Diffuse path tracer with sun next-event estimation and russian roulette.
pub struct PathTracer {
    max_depth: u32,
}

impl PathTracer {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    fn russian_roulette(rng: &mut Rng, throughput: &mut Vec3, bounce: u32) -> bool {
        if bounce > 2 {
            let p = throughput.max_element().clamp(0.05, 0.95);
            if rng.next() > p {
                return false;
            }
            *throughput /= p;
        }
        true
    }
}

impl Tracer for PathTracer {
    fn trace(&self, scene: &dyn SceneAccess, ray: &Ray, sample: &CameraSample, rng: &mut Rng) -> Vec3 {
        let mut radiance = Vec3::ZERO;
        let mut throughput = Vec3::ONE;
        let mut ray = *ray;

        for bounce in 0..self.max_depth {
            let Some(hit) = scene.hit(&ray) else {
                radiance += throughput * scene.sample_sky(ray.direction);
                break;
            };

            let material = scene.get_material(hit.material_id);
            radiance += throughput * material.emissive;

            let origin = hit.point + hit.normal * RAY_EPSILON;

            if let Some(sun) = scene.get_sun() {
                let to_light = sun.to_light();
                let n_dot_l = hit.normal.dot(to_light);
                if n_dot_l > 0.0 && !scene.hit_any(&Ray::new(origin, to_light)) {
                    radiance += throughput * material.base_color * FRAC_1_PI * sun.color * n_dot_l;
                }
            }

            // The first bounce reads the sampler's dimensions, deeper ones the worker RNG.
            let dim = (bounce as usize) * 2;
            let (u1, u2) = match sample.dims.get(dim..dim + 2) {
                Some([u1, u2]) => (*u1, *u2),
                _ => (rng.next(), rng.next()),
            };

            // Cosine sampling cancels the lambert cos/pi against the pdf.
            throughput *= material.base_color;
            if !Self::russian_roulette(rng, &mut throughput, bounce) {
                break;
            }

            ray = Ray::new(origin, cosine_direction(hit.normal, u1, u2));
        }

        clamp_radiance(radiance)
    }

    fn bake_samples(&self, _scene: &dyn SceneAccess, sample: &mut CameraSample) {
        sample.request_dimensions(2);
    }
}
