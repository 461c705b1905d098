use super::sync::Synchronizer;
use super::tile::Tile;
use crate::raytracer::camera::Camera;
use crate::raytracer::film::Film;
use crate::raytracer::progress::ProgressMonitor;
use crate::raytracer::rng::Rng;
use crate::raytracer::sampler::{CameraSample, Sampler};
use crate::raytracer::scene::SceneAccess;
use crate::raytracer::tracer::Tracer;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Worker that finalizes each pass and resets the tile cursor.
pub const LEADER: usize = 0;

/// Everything one render shares between its workers.
///
/// A pass set is immutable apart from its pass counter. Reconfiguring the renderer
/// always drains the current set and launches a new one.
pub struct PassSet {
    pub(crate) sync: Arc<Synchronizer>,
    pub(crate) film: Arc<Film>,
    pub(crate) camera: Camera,
    pub(crate) scene: Arc<dyn SceneAccess>,
    pub(crate) tracer: Arc<dyn Tracer>,
    pub(crate) sampler: Arc<dyn Sampler>,
    pub(crate) sample_template: CameraSample,
    pub(crate) monitor: Option<Arc<ProgressMonitor>>,
    pub(crate) total_passes: u32,
    pub(crate) passes_remaining: AtomicU32,
    pub(crate) generation: u64,
}

impl PassSet {
    pub fn passes_remaining(&self) -> u32 {
        self.passes_remaining.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Worker entry point. A panic inside the loop aborts the whole pass set so the
    /// remaining workers leave their barrier waits instead of waiting for this one.
    pub fn run(&self, worker_id: usize) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.render_passes(worker_id)));
        if let Err(payload) = result {
            error!(
                worker_id,
                generation = self.generation,
                reason = panic_message(payload.as_ref()),
                "render worker panicked, aborting render"
            );
            self.sync.abort();
            if let Some(monitor) = &self.monitor {
                monitor.finish();
            }
        }
    }

    fn render_passes(&self, worker_id: usize) {
        let mut rng = Rng::for_worker(worker_id, self.generation);
        let mut sample = self.sample_template.clone();

        loop {
            if self.sync.pre_render_sync(worker_id).is_aborted() {
                return;
            }

            // Read after the barrier: the leader's decrement of the previous pass is
            // visible to everyone, so all workers agree on whether to stop.
            let remaining = self.passes_remaining();
            if remaining == 0 {
                return;
            }
            let pass = self.total_passes - remaining;

            while let Some(tile) = self.sync.next_tile() {
                if !self.render_tile(&tile, pass, &mut rng, &mut sample) {
                    break;
                }
                if let Some(monitor) = &self.monitor {
                    monitor.update_inc();
                }
            }

            if self.sync.post_render_sync(worker_id).is_aborted() {
                return;
            }

            if worker_id == LEADER {
                self.finalize_pass();
            }
        }
    }

    /// Shades every pixel of `tile`. Returns `false` if the render was aborted midway.
    fn render_tile(&self, tile: &Tile, pass: u32, rng: &mut Rng, sample: &mut CameraSample) -> bool {
        let writer = self.film.writer();
        for y in tile.ymin..tile.ymax {
            for x in tile.xmin..tile.xmax {
                if !self.sync.running() {
                    return false;
                }
                self.sampler.get_samples(x, y, pass, rng, sample);
                let ray = self.camera.generate_ray(sample);
                let color = self.tracer.trace(self.scene.as_ref(), &ray, sample, rng);
                writer.commit(x, y, color);
            }
        }
        true
    }

    fn finalize_pass(&self) {
        let passes = self.film.scale_pixels();
        self.sync.reset_tiles();
        let remaining = self.passes_remaining.fetch_sub(1, Ordering::AcqRel) - 1;
        debug!(generation = self.generation, passes, remaining, "pass finalized");

        if remaining == 0 {
            if let Some(monitor) = &self.monitor {
                monitor.finish();
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
