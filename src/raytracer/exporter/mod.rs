mod png;
mod tonemapping;

pub use png::PngExporter;
pub use tonemapping::{linear_to_srgb_u8, ToneMap};

use crate::raytracer::error::RenderResult;
use crate::raytracer::film::Film;
use std::path::Path;

pub trait Exporter {
    /// Writes the film's finalized pixels to `path`.
    fn export(&self, film: &Film, path: &Path) -> RenderResult<()>;
}
