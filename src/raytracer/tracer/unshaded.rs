use super::Tracer;
use crate::raytracer::ray::Ray;
use crate::raytracer::rng::Rng;
use crate::raytracer::sampler::CameraSample;
use crate::raytracer::scene::SceneAccess;
use glam::Vec3;

/// Preview shading: base colour with a headlight term, no secondary rays.
pub struct UnshadedTracer;

impl Tracer for UnshadedTracer {
    fn trace(&self, scene: &dyn SceneAccess, ray: &Ray, _sample: &CameraSample, _rng: &mut Rng) -> Vec3 {
        if let Some(hit) = scene.hit(ray) {
            let material = scene.get_material(hit.material_id);
            let n_dot_l = hit.normal.dot(-ray.direction).max(0.0);
            material.emissive + material.base_color * (0.2 + 0.8 * n_dot_l)
        } else {
            scene.sample_sky(ray.direction) * 0.5
        }
    }
}
