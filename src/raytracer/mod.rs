pub mod camera;
pub mod config;
pub mod error;
pub mod exporter;
pub mod film;
pub mod light;
pub mod material;
pub mod progress;
pub mod ray;
pub mod renderer;
pub mod renderloop;
pub mod rng;
pub mod sampler;
pub mod scene;
pub mod shape;
pub mod sky;
pub mod tracer;

pub use config::{RendererConfig, SamplerKind, TracerKind};
pub use error::{ConfigError, RenderError, RenderResult};
pub use film::Film;
pub use progress::ProgressMonitor;
pub use renderer::Renderer;
pub use renderloop::RenderPool;
