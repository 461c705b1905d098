use super::{CameraSample, Sampler};
use crate::raytracer::rng::Rng;
use glam::Vec2;

pub const BLUE_NOISE_SIZE: usize = 64;

const PIXEL_SEED: u64 = 12345;
const LENS_SEED: u64 = 67890;

/// Tileable 2-D blue-noise mask built with void-and-cluster ranking.
pub struct BlueNoiseTexture {
    pub size: usize,
    pub samples: Vec<Vec2>,
}

impl BlueNoiseTexture {
    /// Builds a `size x size` mask. Sizes below 2 are raised to 2.
    pub fn generate(size: usize, seed: u64) -> Self {
        let size = size.max(2);
        let values_x = Self::generate_channel(size, seed);
        let values_y = Self::generate_channel(size, seed.wrapping_add(99999));

        let samples = values_x
            .into_iter()
            .zip(values_y)
            .map(|(x, y)| Vec2::new(x, y))
            .collect();

        Self { size, samples }
    }

    fn generate_channel(size: usize, seed: u64) -> Vec<f32> {
        let num_pixels = size * size;
        if num_pixels <= 1 {
            return vec![0.0; num_pixels];
        }

        let mut field = EnergyField::new(size, 1.5);
        let mut rng = Rng::new(seed);
        let mut rank = vec![0usize; num_pixels];

        let initial_count = (num_pixels / 10).max(1);
        let grid_size = (initial_count as f32).sqrt().ceil() as usize;
        let cell_size = (size / grid_size).max(1);

        'seed: for gy in 0..grid_size {
            for gx in 0..grid_size {
                if gy * grid_size + gx >= initial_count {
                    break 'seed;
                }
                let px = (gx * cell_size + (rng.next() * cell_size as f32) as usize).min(size - 1);
                let py = (gy * cell_size + (rng.next() * cell_size as f32) as usize).min(size - 1);
                field.set(py * size + px, true);
            }
        }

        // Thin the seed pattern down to half by repeatedly dropping the tightest cluster.
        let target_initial = initial_count / 2;
        while field.set_count > target_initial {
            let idx = field.tightest_cluster();
            field.set(idx, false);
        }

        // Rank the remaining prototype points from the tightest cluster downwards.
        let mut prototype = field.clone();
        let mut current_rank = prototype.set_count;
        while prototype.set_count > 0 {
            let idx = prototype.tightest_cluster();
            current_rank -= 1;
            rank[idx] = current_rank;
            prototype.set(idx, false);
        }

        // Fill the largest voids in order.
        for r in target_initial..num_pixels {
            let idx = field.largest_void();
            rank[idx] = r;
            field.set(idx, true);
        }

        rank.into_iter()
            .map(|r| r as f32 / (num_pixels - 1) as f32)
            .collect()
    }

    /// Sample for pixel `(x, y)` shifted along the R2 sequence so passes decorrelate.
    #[inline]
    pub fn sample(&self, x: usize, y: usize, pass: u32) -> Vec2 {
        let tx = x % self.size;
        let ty = y % self.size;
        let base = self.samples[ty * self.size + tx];

        const R2_A1: f32 = 0.7548777;
        const R2_A2: f32 = 0.5698403;

        let n = pass as f32;
        let offset_x = (n * R2_A1).fract();
        let offset_y = (n * R2_A2).fract();

        Vec2::new((base.x + offset_x).fract(), (base.y + offset_y).fract())
    }
}

/// Toroidal gaussian energy over a square grid of on/off cells.
#[derive(Clone)]
struct EnergyField {
    size: usize,
    radius: i32,
    kernel: Vec<f32>,
    energy: Vec<f32>,
    is_set: Vec<bool>,
    set_count: usize,
}

impl EnergyField {
    fn new(size: usize, sigma: f32) -> Self {
        let radius = (sigma * 3.0).ceil() as i32;
        let kernel_size = (radius * 2 + 1) as usize;
        let mut kernel = vec![0.0f32; kernel_size * kernel_size];
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d2 = (dx * dx + dy * dy) as f32;
                let kx = (dx + radius) as usize;
                let ky = (dy + radius) as usize;
                kernel[ky * kernel_size + kx] = (-d2 / (2.0 * sigma * sigma)).exp();
            }
        }

        Self {
            size,
            radius,
            kernel,
            energy: vec![0.0; size * size],
            is_set: vec![false; size * size],
            set_count: 0,
        }
    }

    fn set(&mut self, idx: usize, on: bool) {
        if self.is_set[idx] == on {
            return;
        }
        self.is_set[idx] = on;
        if on {
            self.set_count += 1;
        } else {
            self.set_count -= 1;
        }

        let sign = if on { 1.0 } else { -1.0 };
        let size = self.size as i32;
        let px = (idx % self.size) as i32;
        let py = (idx / self.size) as i32;
        let kernel_size = (self.radius * 2 + 1) as usize;

        for dy in -self.radius..=self.radius {
            for dx in -self.radius..=self.radius {
                let nx = (px + dx).rem_euclid(size) as usize;
                let ny = (py + dy).rem_euclid(size) as usize;
                let kx = (dx + self.radius) as usize;
                let ky = (dy + self.radius) as usize;
                self.energy[ny * self.size + nx] += sign * self.kernel[ky * kernel_size + kx];
            }
        }
    }

    fn tightest_cluster(&self) -> usize {
        let mut best = (f32::MIN, 0);
        for (idx, (&e, &s)) in self.energy.iter().zip(&self.is_set).enumerate() {
            if s && e > best.0 {
                best = (e, idx);
            }
        }
        best.1
    }

    fn largest_void(&self) -> usize {
        let mut best = (f32::MAX, 0);
        for (idx, (&e, &s)) in self.energy.iter().zip(&self.is_set).enumerate() {
            if !s && e < best.0 {
                best = (e, idx);
            }
        }
        best.1
    }
}

/// Blue-noise pixel and lens offsets; extra dimensions come from the worker's RNG.
pub struct BlueNoiseSampler {
    pixel: BlueNoiseTexture,
    lens: BlueNoiseTexture,
}

impl BlueNoiseSampler {
    pub fn new() -> Self {
        Self::with_size(BLUE_NOISE_SIZE)
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            pixel: BlueNoiseTexture::generate(size, PIXEL_SEED),
            lens: BlueNoiseTexture::generate(size, LENS_SEED),
        }
    }
}

impl Default for BlueNoiseSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for BlueNoiseSampler {
    fn get_samples(&self, x: usize, y: usize, pass: u32, rng: &mut Rng, sample: &mut CameraSample) {
        let offset = self.pixel.sample(x, y, pass);
        let lens = self.lens.sample(x, y, pass);
        sample.place(x, y, offset.x, offset.y);
        sample.lens_u = lens.x;
        sample.lens_v = lens.y;
        for dim in &mut sample.dims {
            *dim = rng.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_form_a_permutation() {
        let texture = BlueNoiseTexture::generate(16, 42);
        assert_eq!(texture.samples.len(), 256);

        let mut ranks: Vec<usize> = texture
            .samples
            .iter()
            .map(|s| (s.x * 255.0).round() as usize)
            .collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (0..256).collect::<Vec<_>>());
    }

    #[test]
    fn pass_offsets_stay_in_unit_square() {
        let texture = BlueNoiseTexture::generate(8, 1);
        for pass in 0..64 {
            let s = texture.sample(13, 21, pass);
            assert!((0.0..1.0).contains(&s.x));
            assert!((0.0..1.0).contains(&s.y));
        }
    }

    #[test]
    fn sampler_places_sample_in_pixel() {
        let sampler = BlueNoiseSampler::with_size(8);
        let mut rng = Rng::new(3);
        let mut sample = CameraSample::with_dimensions(2);
        sampler.get_samples(1, 2, 5, &mut rng, &mut sample);
        assert!(sample.x >= 1.0 && sample.x < 2.0);
        assert!(sample.y >= 2.0 && sample.y < 3.0);
    }

    #[test]
    fn degenerate_sizes_are_raised_to_two() {
        for size in [0, 1] {
            let texture = BlueNoiseTexture::generate(size, 3);
            assert_eq!(texture.size, 2);
            assert_eq!(texture.samples.len(), 4);
            let sample = texture.sample(5, 7, 3);
            assert!(sample.is_finite());
            assert!((0.0..1.0).contains(&sample.x) && (0.0..1.0).contains(&sample.y));
        }
    }
}
