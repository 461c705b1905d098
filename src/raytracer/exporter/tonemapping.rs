use crate::raytracer::error::ConfigError;
use glam::{Mat3, Vec3};
use std::fmt;
use std::str::FromStr;

/// Display transform applied to linear radiance before sRGB encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToneMap {
    #[default]
    None,
    Aces,
    Reinhard,
    Agx,
}

impl ToneMap {
    pub fn name(self) -> &'static str {
        match self {
            ToneMap::None => "none",
            ToneMap::Aces => "aces",
            ToneMap::Reinhard => "reinhard",
            ToneMap::Agx => "agx",
        }
    }

    pub fn apply(self, color: Vec3) -> Vec3 {
        match self {
            ToneMap::None => color,
            ToneMap::Aces => aces(color),
            ToneMap::Reinhard => color / (color + Vec3::ONE),
            ToneMap::Agx => agx(color),
        }
    }

    pub fn apply_with_exposure(self, color: Vec3, exposure: f32) -> Vec3 {
        self.apply(color * exposure)
    }
}

impl FromStr for ToneMap {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "linear" => Ok(ToneMap::None),
            "aces" => Ok(ToneMap::Aces),
            "reinhard" => Ok(ToneMap::Reinhard),
            "agx" => Ok(ToneMap::Agx),
            _ => Err(ConfigError::UnknownToneMap(s.to_string())),
        }
    }
}

impl fmt::Display for ToneMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Stephen Hill's fitted ACES: sRGB -> RRT/ODT space, rational fit, back to sRGB.
const ACES_INPUT: Mat3 = Mat3::from_cols_array(&[
    0.59719, 0.07600, 0.02840, //
    0.35458, 0.90834, 0.13383, //
    0.04823, 0.01566, 0.83777,
]);

const ACES_OUTPUT: Mat3 = Mat3::from_cols_array(&[
    1.60475, -0.10208, -0.00327, //
    -0.53108, 1.10813, -0.07276, //
    -0.07367, -0.00605, 1.07602,
]);

fn aces(color: Vec3) -> Vec3 {
    let v = ACES_INPUT * color;
    let a = v * (v + 0.0245786) - 0.000090537;
    let b = v * (v * 0.983729 + 0.432951) + 0.238081;
    (ACES_OUTPUT * (a / b)).clamp(Vec3::ZERO, Vec3::ONE)
}

const AGX_INSET: Mat3 = Mat3::from_cols_array(&[
    0.842479062253094, 0.0784335999999992, 0.0792237451477643, //
    0.0423282422610123, 0.878468636469772, 0.0791661274605434, //
    0.0423756549057051, 0.0784336, 0.879142973793104,
]);

const AGX_OUTSET: Mat3 = Mat3::from_cols_array(&[
    1.19687900512017, -0.0980208811401368, -0.0990297440797205, //
    -0.0528968517574562, 1.15190312990417, -0.0989611768448433, //
    -0.0529716355144438, -0.0980434501171241, 1.15107367264116,
]);

const AGX_MIN_EV: f32 = -12.47393;
const AGX_MAX_EV: f32 = 4.026069;

fn agx(color: Vec3) -> Vec3 {
    let log = (AGX_INSET * color)
        .max(Vec3::splat(1e-10))
        .to_array()
        .map(|c| c.log2().clamp(AGX_MIN_EV, AGX_MAX_EV));
    let x = (Vec3::from_array(log) - AGX_MIN_EV) / (AGX_MAX_EV - AGX_MIN_EV);

    // Sixth-order fit of the default AgX contrast curve.
    let x2 = x * x;
    let x4 = x2 * x2;
    let curve = x4 * x2 * 15.5 - x4 * x * 40.14 + x4 * 31.96 - x2 * x * 6.868 + x2 * 0.4298
        + x * 0.1191
        - 0.00232;

    (AGX_OUTSET * curve).max(Vec3::ZERO).powf(2.2)
}

/// Encodes a display-referred colour as 8-bit sRGB, clamping to `[0, 1]` first.
pub fn linear_to_srgb_u8(color: Vec3) -> [u8; 3] {
    color.clamp(Vec3::ZERO, Vec3::ONE).to_array().map(|c| {
        let encoded = if c <= 0.0031308 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        };
        (encoded * 255.0 + 0.5) as u8
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for map in [ToneMap::None, ToneMap::Aces, ToneMap::Reinhard, ToneMap::Agx] {
            assert_eq!(map.name().parse::<ToneMap>().unwrap(), map);
        }
        assert!(matches!(
            "filmic".parse::<ToneMap>(),
            Err(ConfigError::UnknownToneMap(name)) if name == "filmic"
        ));
    }

    #[test]
    fn curves_are_finite_and_non_negative() {
        for map in [ToneMap::Aces, ToneMap::Reinhard, ToneMap::Agx] {
            for value in [0.0, 0.18, 1.0, 8.0, 1000.0] {
                let c = map.apply(Vec3::splat(value));
                assert!(c.is_finite(), "{map} at {value}");
                assert!(c.min_element() >= 0.0, "{map} at {value}: {c}");
                if map != ToneMap::Agx {
                    assert!(c.max_element() <= 1.0, "{map} at {value}: {c}");
                }
            }
        }
    }

    #[test]
    fn exposure_scales_input() {
        let c = ToneMap::None.apply_with_exposure(Vec3::splat(0.25), 2.0);
        assert_eq!(c, Vec3::splat(0.5));
        assert_eq!(ToneMap::Reinhard.apply(Vec3::ONE), Vec3::splat(0.5));
    }

    #[test]
    fn srgb_encoding_endpoints() {
        assert_eq!(linear_to_srgb_u8(Vec3::ZERO), [0, 0, 0]);
        assert_eq!(linear_to_srgb_u8(Vec3::ONE), [255, 255, 255]);
        assert_eq!(linear_to_srgb_u8(Vec3::splat(4.0)), [255, 255, 255]);
        assert_eq!(linear_to_srgb_u8(Vec3::new(-1.0, 0.5, 0.0))[0], 0);
    }
}
