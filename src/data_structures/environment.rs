//! Panoramic environment lighting.
//!
//! HDR radiance is stored RGBE-encoded in 8-bit RGBA images: the shared exponent
//! lives in alpha, so the maps upload as plain `Rgba8Unorm` textures on every
//! backend (WebGL2 included) and are decoded in the shader.

use std::borrow::Cow;

use anyhow::Context as _;
use image::{ImageFormat, Rgb32FImage, RgbaImage, imageops::FilterType};

use crate::data_structures::texture::{fit_within, fitted_size};

/// Size of the pre-filtered diffuse map.
pub const IRRADIANCE_SIZE: [u32; 2] = [32, 16];

const EXPONENT_BIAS: i32 = 128;

/// How the panorama is projected onto directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mapping {
    /// Longitude/latitude panorama sampled with reflected view directions.
    #[default]
    EquirectangularReflection,
}

#[derive(Clone, Debug)]
pub struct EnvironmentMap {
    pub mapping: Mapping,
    /// Full-resolution radiance, RGBE encoded.
    pub radiance: RgbaImage,
    /// Heavily downsampled radiance used for diffuse lighting, RGBE encoded.
    pub irradiance: RgbaImage,
}

impl EnvironmentMap {
    /// Decodes a Radiance `.hdr` file.
    pub fn from_hdr_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)
            .context("Environment is not a valid Radiance HDR image")?
            .to_rgb32f();
        Ok(Self::from_radiance(&image))
    }

    pub fn from_radiance(radiance: &Rgb32FImage) -> Self {
        let [width, height] = IRRADIANCE_SIZE;
        let irradiance = image::imageops::resize(radiance, width, height, FilterType::Triangle);
        Self {
            mapping: Mapping::EquirectangularReflection,
            radiance: encode_rgbe(radiance),
            irradiance: encode_rgbe(&irradiance),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.radiance.dimensions()
    }

    /// Borrows `self` if the radiance fits `max_dimension`, otherwise returns a copy
    /// whose radiance was resampled in linear space. Resampling the encoded bytes
    /// would blend unrelated exponents.
    pub fn fit_within(&self, max_dimension: u32) -> Cow<'_, Self> {
        if fitted_size(self.dimensions(), max_dimension) == self.dimensions() {
            return Cow::Borrowed(self);
        }
        let radiance = decode_rgbe(&self.radiance);
        let radiance = fit_within(&radiance, max_dimension);
        Cow::Owned(Self {
            mapping: self.mapping,
            radiance: encode_rgbe(&radiance),
            irradiance: self.irradiance.clone(),
        })
    }
}

pub fn encode_rgbe(image: &Rgb32FImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        image::Rgba(encode_rgbe_pixel(image.get_pixel(x, y).0))
    })
}

pub fn decode_rgbe(image: &RgbaImage) -> Rgb32FImage {
    Rgb32FImage::from_fn(image.width(), image.height(), |x, y| {
        image::Rgb(decode_rgbe_pixel(image.get_pixel(x, y).0))
    })
}

pub fn encode_rgbe_pixel([r, g, b]: [f32; 3]) -> [u8; 4] {
    let max = r.max(g).max(b);
    if !max.is_finite() || max <= 1e-32 {
        return [0, 0, 0, 0];
    }
    let exponent = (max.log2().ceil() as i32).clamp(-EXPONENT_BIAS, 255 - EXPONENT_BIAS);
    let scale = 255.0 * (-exponent as f32).exp2();
    let channel = |c: f32| (c.max(0.0) * scale).round().clamp(0.0, 255.0) as u8;
    [
        channel(r),
        channel(g),
        channel(b),
        (exponent + EXPONENT_BIAS) as u8,
    ]
}

pub fn decode_rgbe_pixel([r, g, b, e]: [u8; 4]) -> [f32; 3] {
    if e == 0 {
        return [0.0; 3];
    }
    let scale = (e as i32 - EXPONENT_BIAS) as f32;
    let scale = scale.exp2() / 255.0;
    [r as f32 * scale, g as f32 * scale, b as f32 * scale]
}
