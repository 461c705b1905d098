mod bluenoise;
mod random;

pub use bluenoise::{BlueNoiseSampler, BlueNoiseTexture};
pub use random::RandomSampler;

use crate::raytracer::rng::Rng;

/// One camera sample: film position plus the extra random dimensions a tracer asked for.
///
/// `x`/`y` are in film space, so pixel `(3, 5)` covers `[3, 4) x [5, 6)`.
#[derive(Clone, Debug, Default)]
pub struct CameraSample {
    pub pix_x: usize,
    pub pix_y: usize,
    pub x: f32,
    pub y: f32,
    pub lens_u: f32,
    pub lens_v: f32,
    pub dims: Vec<f32>,
}

impl CameraSample {
    pub fn with_dimensions(count: usize) -> Self {
        Self {
            dims: vec![0.0; count],
            ..Default::default()
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dims.len()
    }

    /// Reserves at least `count` extra dimensions.
    pub fn request_dimensions(&mut self, count: usize) {
        if self.dims.len() < count {
            self.dims.resize(count, 0.0);
        }
    }

    fn place(&mut self, x: usize, y: usize, offset_x: f32, offset_y: f32) {
        self.pix_x = x;
        self.pix_y = y;
        self.x = x as f32 + offset_x;
        self.y = y as f32 + offset_y;
    }
}

pub trait Sampler: Send + Sync {
    /// Fills `sample` for pixel `(x, y)` during pass `pass`.
    fn get_samples(&self, x: usize, y: usize, pass: u32, rng: &mut Rng, sample: &mut CameraSample);
}
