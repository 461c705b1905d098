/// PCG32 generator. Every render worker owns one; it is never shared.
#[derive(Clone, Debug)]
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self(seed.wrapping_add(0x9E3779B97F4A7C15));
        rng.next_u32();
        rng
    }

    /// Independent stream for one worker of one pass set.
    pub fn for_worker(worker_id: usize, generation: u64) -> Self {
        let seed = (generation << 32) ^ (worker_id as u64).wrapping_mul(0xD1B54A32D192ED03);
        Self::new(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.0;
        self.0 = old
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform in `[0, 1)`.
    pub fn next(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_in_unit_interval() {
        let mut rng = Rng::new(42);
        for _ in 0..10_000 {
            let v = rng.next();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn workers_get_distinct_streams() {
        let mut a = Rng::for_worker(0, 1);
        let mut b = Rng::for_worker(1, 1);
        let sa: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let sb: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(sa, sb);
    }
}
