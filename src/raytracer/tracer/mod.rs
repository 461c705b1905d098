mod direct;
mod pathtracer;
pub mod sampling;
mod unshaded;

use crate::raytracer::ray::Ray;
use crate::raytracer::rng::Rng;
use crate::raytracer::sampler::CameraSample;
use crate::raytracer::scene::SceneAccess;
use glam::Vec3;

pub use direct::DirectLighting;
pub use pathtracer::PathTracer;
pub use unshaded::UnshadedTracer;

/// Shading strategy: turns one camera ray into one radiance estimate.
pub trait Tracer: Send + Sync {
    fn trace(&self, scene: &dyn SceneAccess, ray: &Ray, sample: &CameraSample, rng: &mut Rng) -> Vec3;

    /// Reserves the extra sample dimensions this tracer reads from `CameraSample::dims`.
    fn bake_samples(&self, _scene: &dyn SceneAccess, _sample: &mut CameraSample) {}
}
