use glam::Vec3;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// One accumulation cell. Only the worker that owns the pixel's tile writes it during a
/// pass, so a relaxed load/add/store is enough; the pass barrier publishes the result.
#[derive(Default)]
struct AtomicColor([AtomicU32; 3]);

impl AtomicColor {
    #[inline]
    fn load(&self) -> Vec3 {
        Vec3::new(
            f32::from_bits(self.0[0].load(Ordering::Relaxed)),
            f32::from_bits(self.0[1].load(Ordering::Relaxed)),
            f32::from_bits(self.0[2].load(Ordering::Relaxed)),
        )
    }

    #[inline]
    fn add(&self, color: Vec3) {
        let sum = self.load() + color;
        self.0[0].store(sum.x.to_bits(), Ordering::Relaxed);
        self.0[1].store(sum.y.to_bits(), Ordering::Relaxed);
        self.0[2].store(sum.z.to_bits(), Ordering::Relaxed);
    }

    fn reset(&self) {
        for channel in &self.0 {
            channel.store(0f32.to_bits(), Ordering::Relaxed);
        }
    }
}

struct Accumulation {
    width: usize,
    height: usize,
    cells: Vec<AtomicColor>,
}

impl Accumulation {
    fn new(width: usize, height: usize) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        cells.resize_with(width * height, AtomicColor::default);
        Self {
            width,
            height,
            cells,
        }
    }
}

/// Frame buffer shared by all render workers.
///
/// Workers add samples to the accumulation buffer at disjoint pixels. The pass leader
/// calls [`Film::scale_pixels`] once per pass to publish the average into the display
/// buffer, which is the only buffer readers ever see.
pub struct Film {
    accum: RwLock<Accumulation>,
    display: RwLock<Vec<Vec3>>,
    passes: AtomicU32,
}

impl Film {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            accum: RwLock::new(Accumulation::new(width, height)),
            display: RwLock::new(vec![Vec3::ZERO; width * height]),
            passes: AtomicU32::new(0),
        }
    }

    fn accum(&self) -> RwLockReadGuard<'_, Accumulation> {
        self.accum.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn width(&self) -> usize {
        self.accum().width
    }

    pub fn height(&self) -> usize {
        self.accum().height
    }

    pub fn passes(&self) -> u32 {
        self.passes.load(Ordering::Acquire)
    }

    /// Reallocates both buffers. Only called while no worker is running.
    pub fn resize(&self, width: usize, height: usize) {
        let mut accum = self.accum.write().unwrap_or_else(PoisonError::into_inner);
        if accum.width == width && accum.height == height {
            return;
        }
        *accum = Accumulation::new(width, height);
        let mut display = self.display.write().unwrap_or_else(PoisonError::into_inner);
        *display = vec![Vec3::ZERO; width * height];
        self.passes.store(0, Ordering::Release);
    }

    pub fn clear(&self) {
        let accum = self.accum();
        for cell in &accum.cells {
            cell.reset();
        }
        let mut display = self.display.write().unwrap_or_else(PoisonError::into_inner);
        display.fill(Vec3::ZERO);
        self.passes.store(0, Ordering::Release);
    }

    /// Borrows the accumulation buffer for a run of commits, typically one tile.
    pub fn writer(&self) -> FilmWriter<'_> {
        FilmWriter { accum: self.accum() }
    }

    pub fn commit(&self, x: usize, y: usize, color: Vec3) {
        self.writer().commit(x, y, color);
    }

    /// Folds one more pass into the display buffer and returns the new pass count.
    pub fn scale_pixels(&self) -> u32 {
        let passes = self.passes.fetch_add(1, Ordering::AcqRel) + 1;
        let scale = 1.0 / passes as f32;
        let accum = self.accum();
        let mut display = self.display.write().unwrap_or_else(PoisonError::into_inner);
        for (out, cell) in display.iter_mut().zip(&accum.cells) {
            *out = cell.load() * scale;
        }
        passes
    }

    pub fn get(&self, x: usize, y: usize) -> Vec3 {
        let (width, height) = {
            let accum = self.accum();
            (accum.width, accum.height)
        };
        if x >= width || y >= height {
            return Vec3::ZERO;
        }
        let display = self.display.read().unwrap_or_else(PoisonError::into_inner);
        display.get(y * width + x).copied().unwrap_or(Vec3::ZERO)
    }

    /// Copy of the finalized pixels, row-major.
    pub fn snapshot(&self) -> Vec<Vec3> {
        self.display
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub struct FilmWriter<'a> {
    accum: RwLockReadGuard<'a, Accumulation>,
}

impl FilmWriter<'_> {
    #[inline]
    pub fn commit(&self, x: usize, y: usize, color: Vec3) {
        if x >= self.accum.width || y >= self.accum.height {
            return;
        }
        self.accum.cells[y * self.accum.width + x].add(color);
    }
}
