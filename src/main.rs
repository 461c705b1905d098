use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiletrace::raytracer::camera::Camera;
use tiletrace::raytracer::exporter::{Exporter, PngExporter, ToneMap};
use tiletrace::raytracer::light::DirectionalLight;
use tiletrace::raytracer::material::Material;
use tiletrace::raytracer::scene::Scene;
use tiletrace::raytracer::shape::{Plane, Sphere};
use tiletrace::raytracer::sky::GradientSky;
use tiletrace::raytracer::{
    ProgressMonitor, RenderPool, Renderer, RendererConfig, SamplerKind, TracerKind,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const PROGRESS_POLL: Duration = Duration::from_millis(100);

/// Renders the built-in demo scene progressively and writes it as a PNG.
#[derive(Parser, Debug)]
#[command(name = "tiletrace")]
#[command(about = "Tiled multi-pass CPU path tracer")]
struct Args {
    /// JSON renderer config; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Samples per pixel, one per pass
    #[arg(long)]
    spp: Option<u32>,

    #[arg(long)]
    tile_size: Option<usize>,

    /// Render threads (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// unshaded, direct_lighting or path_tracing
    #[arg(long)]
    tracer: Option<TracerKind>,

    /// random or blue_noise
    #[arg(long)]
    sampler: Option<SamplerKind>,

    #[arg(long)]
    max_depth: Option<u32>,

    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    #[arg(long, default_value_t = 1.0)]
    exposure: f32,

    /// none, aces, reinhard or agx
    #[arg(long, default_value = "aces")]
    tonemap: ToneMap,

    /// Fallback filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn renderer_config(&self) -> Result<RendererConfig> {
        let mut config = match &self.config {
            Some(path) => RendererConfig::from_json_file(path)?,
            None => RendererConfig::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(spp) = self.spp {
            config.samples_per_pixel = spp;
        }
        if let Some(tile_size) = self.tile_size {
            config.tile_size = tile_size;
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        if let Some(tracer) = self.tracer {
            config.tracer = tracer;
        }
        if let Some(sampler) = self.sampler {
            config.sampler = sampler;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        config.validate()?;
        Ok(config)
    }
}

fn demo_scene() -> Scene<GradientSky> {
    let sky = GradientSky::new(Vec3::new(0.9, 0.85, 0.8), Vec3::new(0.35, 0.55, 0.9));
    let sun = DirectionalLight::new(Vec3::new(-0.4, -1.0, -0.6), Vec3::splat(2.5));
    let mut scene = Scene::new(sky).with_sun(sun);

    let floor = scene.add_material(Material::diffuse(Vec3::splat(0.6)));
    let red = scene.add_material(Material::diffuse(Vec3::new(0.75, 0.15, 0.1)));
    let teal = scene.add_material(Material::diffuse(Vec3::new(0.1, 0.55, 0.5)));
    let lamp = scene.add_material(Material::emissive(Vec3::new(6.0, 4.5, 2.5)));

    scene.add_shape(Plane::new(Vec3::ZERO, Vec3::Y, floor));
    scene.add_shape(Sphere::new(Vec3::new(-0.9, 0.7, 0.0), 0.7, red));
    scene.add_shape(Sphere::new(Vec3::new(0.8, 0.5, 0.4), 0.5, teal));
    scene.add_shape(Sphere::new(Vec3::new(0.2, 0.2, 1.3), 0.2, lamp));
    scene
}

/// Logs progress every time another whole percent completes, until `stop` is set.
fn spawn_progress_reporter(
    monitor: Arc<ProgressMonitor>,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last_percent = None;
        while !stop.load(Ordering::Acquire) {
            thread::sleep(PROGRESS_POLL);
            if !monitor.in_progress() {
                continue;
            }
            let percent = (monitor.progress() * 100.0) as u32;
            if last_percent == Some(percent) {
                continue;
            }
            last_percent = Some(percent);
            let remaining = monitor
                .remaining_time()
                .map(|t| format!("{:.1}s", t.as_secs_f32()))
                .unwrap_or_else(|| "unknown".to_string());
            info!(
                percent,
                tiles = monitor.completed_units(),
                total = monitor.total_units(),
                remaining = %remaining,
                "rendering"
            );
        }
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = args.renderer_config()?;
    let pool = Arc::new(RenderPool::new(config.threads).context("building render pool")?);
    let monitor = Arc::new(ProgressMonitor::new());
    let camera = Camera::new(
        Vec3::new(0.0, 1.2, 4.5),
        Vec3::new(0.0, 0.5, 0.0),
        45.0,
        config.width,
        config.height,
    );

    info!(
        width = config.width,
        height = config.height,
        samples_per_pixel = config.samples_per_pixel,
        tracer = %config.tracer,
        sampler = %config.sampler,
        threads = pool.thread_count(),
        "starting render"
    );

    let mut renderer = Renderer::new(
        config,
        Arc::new(demo_scene()),
        camera,
        pool,
        Arc::clone(&monitor),
    )?;

    let stop = Arc::new(AtomicBool::new(false));
    let reporter = spawn_progress_reporter(Arc::clone(&monitor), Arc::clone(&stop));

    renderer.new_task();
    renderer.wait();
    stop.store(true, Ordering::Release);
    if reporter.join().is_err() {
        tracing::warn!("progress reporter panicked");
    }

    info!(
        passes = renderer.film().passes(),
        elapsed = %format!("{:.2}s", monitor.elapsed_time().as_secs_f32()),
        "render finished"
    );

    PngExporter::with_tonemap(args.tonemap)
        .with_exposure(args.exposure)
        .export(renderer.film(), &args.output)
        .with_context(|| format!("exporting {}", args.output.display()))?;

    Ok(())
}
