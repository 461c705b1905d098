use super::{CameraSample, Sampler};
use crate::raytracer::rng::Rng;

pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn get_samples(&self, x: usize, y: usize, _pass: u32, rng: &mut Rng, sample: &mut CameraSample) {
        let offset_x = rng.next();
        let offset_y = rng.next();
        sample.place(x, y, offset_x, offset_y);
        sample.lens_u = rng.next();
        sample.lens_v = rng.next();
        for dim in &mut sample.dims {
            *dim = rng.next();
        }
    }
}
