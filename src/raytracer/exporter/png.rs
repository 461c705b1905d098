use super::{linear_to_srgb_u8, Exporter, ToneMap};
use crate::raytracer::error::{RenderError, RenderResult};
use crate::raytracer::film::Film;
use glam::Vec3;
use image::{ImageBuffer, Rgb, RgbImage};
use std::path::Path;
use tracing::info;

/// 8-bit sRGB PNG output with an exposure scale and a tone curve.
#[derive(Clone, Copy, Debug)]
pub struct PngExporter {
    tonemap: ToneMap,
    exposure: f32,
}

impl Default for PngExporter {
    fn default() -> Self {
        Self::srgb()
    }
}

impl PngExporter {
    pub fn srgb() -> Self {
        Self::with_tonemap(ToneMap::None)
    }

    pub fn with_tonemap(tonemap: ToneMap) -> Self {
        Self {
            tonemap,
            exposure: 1.0,
        }
    }

    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.exposure = exposure;
        self
    }

    fn to_rgb(&self, color: Vec3) -> Rgb<u8> {
        Rgb(linear_to_srgb_u8(
            self.tonemap.apply_with_exposure(color, self.exposure),
        ))
    }

    /// Converts a row-major pixel buffer. Missing pixels come out black.
    pub fn encode(&self, pixels: &[Vec3], width: usize, height: usize) -> RgbImage {
        ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            let color = pixels
                .get(y as usize * width + x as usize)
                .copied()
                .unwrap_or(Vec3::ZERO);
            self.to_rgb(color)
        })
    }
}

impl Exporter for PngExporter {
    fn export(&self, film: &Film, path: &Path) -> RenderResult<()> {
        let (width, height) = (film.width(), film.height());
        let image = self.encode(&film.snapshot(), width, height);
        image.save(path).map_err(|source| RenderError::Export {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            width,
            height,
            passes = film.passes(),
            tonemap = %self.tonemap,
            "image exported"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_applies_exposure_and_curve() {
        let pixels = vec![Vec3::ZERO, Vec3::splat(0.5), Vec3::ONE, Vec3::splat(3.0)];
        let image = PngExporter::srgb().with_exposure(2.0).encode(&pixels, 2, 2);
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255]);

        let image = PngExporter::with_tonemap(ToneMap::Reinhard).encode(&pixels, 2, 2);
        assert!(image.get_pixel(1, 1).0[0] < 255);
    }

    #[test]
    fn short_buffer_pads_with_black() {
        let image = PngExporter::srgb().encode(&[Vec3::ONE], 2, 1);
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn export_reports_unwritable_path() {
        let film = Film::new(2, 2);
        let path = std::env::temp_dir()
            .join("tiletrace-missing-dir")
            .join("nested")
            .join("out.png");
        let err = PngExporter::srgb().export(&film, &path).unwrap_err();
        assert!(matches!(err, RenderError::Export { .. }));
    }

    #[test]
    fn export_writes_png() {
        let film = Film::new(3, 2);
        film.commit(2, 1, Vec3::ONE);
        film.scale_pixels();
        let path = std::env::temp_dir().join(format!("tiletrace-export-{}.png", std::process::id()));
        PngExporter::srgb().export(&film, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [255, 255, 255]);
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0]);
        std::fs::remove_file(&path).ok();
    }
}
