use crate::raytracer::error::ConfigError;
use crate::raytracer::sampler::{BlueNoiseSampler, RandomSampler, Sampler};
use crate::raytracer::tracer::{DirectLighting, PathTracer, Tracer, UnshadedTracer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_TILE_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TracerKind {
    Unshaded,
    DirectLighting,
    #[default]
    PathTracing,
}

impl TracerKind {
    pub fn name(self) -> &'static str {
        match self {
            TracerKind::Unshaded => "unshaded",
            TracerKind::DirectLighting => "direct_lighting",
            TracerKind::PathTracing => "path_tracing",
        }
    }
}

impl FromStr for TracerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unshaded" => Ok(TracerKind::Unshaded),
            "direct_lighting" | "direct" => Ok(TracerKind::DirectLighting),
            "path_tracing" | "path" => Ok(TracerKind::PathTracing),
            _ => Err(ConfigError::UnknownTracer(s.to_string())),
        }
    }
}

impl TryFrom<String> for TracerKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TracerKind> for String {
    fn from(kind: TracerKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for TracerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SamplerKind {
    #[default]
    Random,
    BlueNoise,
}

impl SamplerKind {
    pub fn name(self) -> &'static str {
        match self {
            SamplerKind::Random => "random",
            SamplerKind::BlueNoise => "blue_noise",
        }
    }
}

impl FromStr for SamplerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(SamplerKind::Random),
            "blue_noise" | "bluenoise" => Ok(SamplerKind::BlueNoise),
            _ => Err(ConfigError::UnknownSampler(s.to_string())),
        }
    }
}

impl TryFrom<String> for SamplerKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SamplerKind> for String {
    fn from(kind: SamplerKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the renderer needs to start a pass set.
///
/// Strategy names are resolved while the config is built or parsed, so an
/// unknown tracer or sampler never reaches a worker thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub width: usize,
    pub height: usize,
    pub samples_per_pixel: u32,
    pub tile_size: usize,
    pub tracer: TracerKind,
    pub max_depth: u32,
    pub sampler: SamplerKind,
    /// Worker threads; `None` uses every available core.
    pub threads: Option<usize>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            samples_per_pixel: 16,
            tile_size: DEFAULT_TILE_SIZE,
            tracer: TracerKind::default(),
            max_depth: 5,
            sampler: SamplerKind::default(),
            threads: None,
        }
    }
}

impl RendererConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RendererConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::InvalidSamplesPerPixel);
        }
        if self.tile_size == 0 {
            return Err(ConfigError::InvalidTileSize);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth);
        }
        if self.threads == Some(0) {
            return Err(ConfigError::InvalidThreadCount);
        }
        Ok(())
    }

    pub fn new_tracer(&self) -> Arc<dyn Tracer> {
        match self.tracer {
            TracerKind::Unshaded => Arc::new(UnshadedTracer),
            TracerKind::DirectLighting => Arc::new(DirectLighting::new()),
            TracerKind::PathTracing => Arc::new(PathTracer::new(self.max_depth)),
        }
    }

    pub fn new_sampler(&self) -> Arc<dyn Sampler> {
        match self.sampler {
            SamplerKind::Random => Arc::new(RandomSampler),
            SamplerKind::BlueNoise => Arc::new(BlueNoiseSampler::new()),
        }
    }
}
