use crate::raytracer::camera::Camera;
use crate::raytracer::config::RendererConfig;
use crate::raytracer::error::RenderResult;
use crate::raytracer::film::Film;
use crate::raytracer::progress::ProgressMonitor;
use crate::raytracer::renderloop::{PassSet, RenderPool, Synchronizer};
use crate::raytracer::sampler::{CameraSample, Sampler};
use crate::raytracer::scene::SceneAccess;
use crate::raytracer::tracer::Tracer;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives progressive renders of one scene on a shared [`RenderPool`].
///
/// Every change that affects what workers read (size, camera, strategies) follows the
/// same sequence: abort and join the running pass set, apply the change while no
/// worker is active, then relaunch if a render was in flight.
pub struct Renderer {
    config: RendererConfig,
    pool: Arc<RenderPool>,
    sync: Arc<Synchronizer>,
    film: Arc<Film>,
    camera: Camera,
    scene: Arc<dyn SceneAccess>,
    tracer: Arc<dyn Tracer>,
    sampler: Arc<dyn Sampler>,
    sample_template: CameraSample,
    monitor: Arc<ProgressMonitor>,
    current: Option<Arc<PassSet>>,
    generation: u64,
}

impl Renderer {
    /// Builds an idle renderer. `config.threads` is not consulted here; the worker
    /// count is whatever `pool` was built with.
    pub fn new(
        config: RendererConfig,
        scene: Arc<dyn SceneAccess>,
        mut camera: Camera,
        pool: Arc<RenderPool>,
        monitor: Arc<ProgressMonitor>,
    ) -> RenderResult<Self> {
        config.validate()?;

        let (width, height) = (config.width, config.height);
        camera.resize(width, height);
        let sync = Arc::new(Synchronizer::new(config.tile_size, pool.thread_count()));
        sync.init(width, height);

        let tracer = config.new_tracer();
        let sampler = config.new_sampler();
        let mut renderer = Self {
            film: Arc::new(Film::new(width, height)),
            config,
            pool,
            sync,
            camera,
            scene,
            tracer,
            sampler,
            sample_template: CameraSample::default(),
            monitor,
            current: None,
            generation: 0,
        };
        renderer.bake_samples();
        Ok(renderer)
    }

    fn bake_samples(&mut self) {
        let mut template = CameraSample::default();
        self.tracer.bake_samples(self.scene.as_ref(), &mut template);
        self.sample_template = template;
    }

    /// Drains any running render, applies `change`, and relaunches if one was running.
    fn restart_with(&mut self, change: impl FnOnce(&mut Self)) {
        let was_running = self.running();
        self.abort();
        change(self);
        if was_running {
            self.new_task();
        }
    }

    /// Applies a new configuration: strategies, sample count, frame size and tile size.
    ///
    /// Validation happens before anything is touched, so a rejected config leaves the
    /// current render running.
    pub fn configure(&mut self, config: RendererConfig) -> RenderResult<()> {
        config.validate()?;
        let tracer = config.new_tracer();
        let sampler = config.new_sampler();

        self.restart_with(|this| {
            let (width, height) = (config.width, config.height);
            if (width, height) != (this.config.width, this.config.height)
                || config.tile_size != this.sync.tile_size()
            {
                this.camera.resize(width, height);
                this.film.resize(width, height);
                this.sync.reconfigure(width, height, config.tile_size);
            }
            this.tracer = tracer;
            this.sampler = sampler;
            this.config = config;
            this.bake_samples();
        });

        info!(
            tracer = %self.config.tracer,
            sampler = %self.config.sampler,
            samples_per_pixel = self.config.samples_per_pixel,
            tile_size = self.config.tile_size,
            "renderer configured"
        );
        Ok(())
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }

        self.restart_with(|this| {
            this.config.width = width;
            this.config.height = height;
            this.camera.resize(width, height);
            this.film.resize(width, height);
            this.sync.init(width, height);
        });
        info!(width, height, tiles = self.sync.tile_count(), "renderer resized");
    }

    /// Replaces the camera, keeping the renderer's frame size.
    pub fn set_camera(&mut self, mut camera: Camera) {
        camera.resize(self.config.width, self.config.height);
        self.restart_with(|this| this.camera = camera);
    }

    /// Installs a shading strategy that is not one of the built-in [`TracerKind`]s.
    ///
    /// [`TracerKind`]: crate::raytracer::config::TracerKind
    pub fn set_tracer(&mut self, tracer: Arc<dyn Tracer>) {
        self.restart_with(|this| {
            this.tracer = tracer;
            this.bake_samples();
        });
    }

    /// Starts a fresh progressive render, aborting any render in flight.
    pub fn new_task(&mut self) {
        self.abort();

        let tiles = self.sync.tile_count();
        let passes = self.config.samples_per_pixel;
        self.monitor.reset(tiles as u64 * passes as u64);
        self.film.clear();
        self.sync.reset_tiles();
        self.sync.resume();
        self.generation += 1;

        let set = Arc::new(PassSet {
            sync: Arc::clone(&self.sync),
            film: Arc::clone(&self.film),
            camera: self.camera.clone(),
            scene: Arc::clone(&self.scene),
            tracer: Arc::clone(&self.tracer),
            sampler: Arc::clone(&self.sampler),
            sample_template: self.sample_template.clone(),
            monitor: Some(Arc::clone(&self.monitor)),
            total_passes: passes,
            passes_remaining: AtomicU32::new(passes),
            generation: self.generation,
        });

        debug!(
            generation = self.generation,
            workers = self.pool.thread_count(),
            tiles,
            passes,
            "launching pass set"
        );
        let worker_set = Arc::clone(&set);
        self.pool.launch(move |worker_id| worker_set.run(worker_id));
        self.current = Some(set);
    }

    /// Stops the current render and joins every worker. Safe to call repeatedly.
    pub fn abort(&mut self) {
        self.sync.abort();
        self.pool.join_all();

        if let Some(set) = self.current.take() {
            let remaining = set.passes_remaining();
            if remaining > 0 {
                warn!(
                    generation = set.generation(),
                    remaining,
                    "render aborted before completion"
                );
                self.monitor.finish();
            }
        }
    }

    /// Blocks until the current render finishes or is aborted.
    pub fn wait(&self) {
        self.pool.join_all();
    }

    pub fn running(&self) -> bool {
        self.sync.running() && self.pool.active_tasks() > 0
    }

    pub fn film(&self) -> &Arc<Film> {
        &self.film
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn monitor(&self) -> &Arc<ProgressMonitor> {
        &self.monitor
    }

    pub fn tile_count(&self) -> usize {
        self.sync.tile_count()
    }

    pub fn worker_count(&self) -> usize {
        self.sync.worker_count()
    }

    /// Passes left in the active pass set; zero when nothing has been launched or the
    /// last render was aborted.
    pub fn passes_remaining(&self) -> u32 {
        self.current.as_ref().map_or(0, |set| set.passes_remaining())
    }

    pub fn render_generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raytracer::config::TracerKind;
    use crate::raytracer::error::{ConfigError, RenderError};
    use crate::raytracer::scene::Scene;
    use crate::raytracer::sky::GradientSky;
    use glam::Vec3;

    fn renderer(config: RendererConfig) -> Renderer {
        let pool = Arc::new(RenderPool::new(Some(2)).unwrap());
        let camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z, 60.0, 1, 1);
        Renderer::new(
            config,
            Arc::new(Scene::new(GradientSky::default())),
            camera,
            pool,
            Arc::new(ProgressMonitor::new()),
        )
        .unwrap()
    }

    fn small_config() -> RendererConfig {
        RendererConfig {
            width: 16,
            height: 16,
            samples_per_pixel: 2,
            tile_size: 8,
            tracer: TracerKind::Unshaded,
            ..Default::default()
        }
    }

    #[test]
    fn new_renderer_is_idle() {
        let renderer = renderer(small_config());
        assert!(!renderer.running());
        assert_eq!(renderer.tile_count(), 4);
        assert_eq!(renderer.worker_count(), 2);
        assert_eq!(renderer.render_generation(), 0);
        assert_eq!(renderer.passes_remaining(), 0);
        assert_eq!((renderer.camera().width(), renderer.camera().height()), (16, 16));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let pool = Arc::new(RenderPool::new(Some(1)).unwrap());
        let config = RendererConfig {
            tile_size: 0,
            ..small_config()
        };
        let result = Renderer::new(
            config,
            Arc::new(Scene::new(GradientSky::default())),
            Camera::new(Vec3::ZERO, Vec3::NEG_Z, 60.0, 1, 1),
            pool,
            Arc::new(ProgressMonitor::new()),
        );
        assert!(matches!(
            result,
            Err(RenderError::Config(ConfigError::InvalidTileSize))
        ));

        let mut renderer = renderer(small_config());
        let err = renderer
            .configure(RendererConfig {
                samples_per_pixel: 0,
                ..small_config()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Config(ConfigError::InvalidSamplesPerPixel)
        ));
        assert_eq!(renderer.config().samples_per_pixel, 2);
    }

    #[test]
    fn configure_retiles_when_tile_size_changes() {
        let mut renderer = renderer(small_config());
        renderer
            .configure(RendererConfig {
                tile_size: 4,
                ..small_config()
            })
            .unwrap();
        assert_eq!(renderer.tile_count(), 16);
        assert!(!renderer.running());
    }

    #[test]
    fn resize_to_same_size_is_a_no_op() {
        let mut renderer = renderer(small_config());
        renderer.new_task();
        renderer.wait();
        let generation = renderer.render_generation();
        renderer.resize(16, 16);
        assert_eq!(renderer.render_generation(), generation);
        assert_eq!(renderer.film().passes(), 2);
    }

    #[test]
    fn abort_is_idempotent() {
        let mut renderer = renderer(small_config());
        renderer.abort();
        renderer.abort();
        renderer.new_task();
        renderer.abort();
        renderer.abort();
        assert!(!renderer.running());
    }
}
