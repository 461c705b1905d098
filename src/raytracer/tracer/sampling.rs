use glam::Vec3;
use std::f32::consts::PI;

pub const MAX_SAMPLE_VALUE: f32 = 10.0;

pub fn sample_cosine_hemisphere(u1: f32, u2: f32) -> Vec3 {
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;
    Vec3::new(r * phi.cos(), r * phi.sin(), (1.0 - u1).max(0.0).sqrt())
}

pub fn build_basis(n: Vec3) -> (Vec3, Vec3, Vec3) {
    let up = if n.y.abs() < 0.999 { Vec3::Y } else { Vec3::X };
    let t = up.cross(n).normalize();
    let b = n.cross(t);
    (t, b, n)
}

pub fn to_world(local: Vec3, t: Vec3, b: Vec3, n: Vec3) -> Vec3 {
    t * local.x + b * local.y + n * local.z
}

/// Cosine-weighted direction around `n`.
pub fn cosine_direction(n: Vec3, u1: f32, u2: f32) -> Vec3 {
    let (t, b, n) = build_basis(n);
    to_world(sample_cosine_hemisphere(u1, u2), t, b, n).normalize()
}

pub fn clamp_radiance(radiance: Vec3) -> Vec3 {
    if !radiance.is_finite() {
        return Vec3::ZERO;
    }

    let max_component = radiance.max_element();
    if max_component > MAX_SAMPLE_VALUE {
        radiance * (MAX_SAMPLE_VALUE / max_component)
    } else {
        radiance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_direction_stays_in_hemisphere() {
        let n = Vec3::new(0.3, 0.9, -0.1).normalize();
        for i in 0..16 {
            for j in 0..16 {
                let d = cosine_direction(n, i as f32 / 16.0, j as f32 / 16.0);
                assert!(d.dot(n) >= -1e-5);
                assert!((d.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn clamp_radiance_drops_nan_and_caps_fireflies() {
        assert_eq!(clamp_radiance(Vec3::new(f32::NAN, 0.0, 0.0)), Vec3::ZERO);
        let capped = clamp_radiance(Vec3::new(100.0, 50.0, 0.0));
        assert!((capped.x - MAX_SAMPLE_VALUE).abs() < 1e-4);
        assert!((capped.y - MAX_SAMPLE_VALUE * 0.5).abs() < 1e-4);
    }
}
