//! GPU textures and render targets.
//!
//! [`Texture`] wraps a sampled texture with its view and sampler. Depth and
//! multisampled colour attachments are plain [`RenderTarget`]s because they are
//! never sampled.

use std::borrow::Cow;

use anyhow::bail;
use image::{ImageBuffer, Pixel, RgbaImage, imageops::FilterType};

/// A sampled GPU texture.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Uploads an RGBA8 image, downscaled first if it exceeds the device's 2D
    /// texture limit.
    ///
    /// `srgb` selects `Rgba8UnormSrgb`, which is right for colour data. Encoded data
    /// (e.g. RGBE environment maps) must stay linear.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: Option<&str>,
        srgb: bool,
    ) -> anyhow::Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            bail!("Cannot upload an empty image ({:?})", label);
        }
        let max_dimension = device.limits().max_texture_dimension_2d;
        let image = fit_within(image, max_dimension);
        if let Cow::Owned(scaled) = &image {
            log::warn!(
                "Texture {:?} downscaled to {}x{} to fit the device limit of {}",
                label,
                scaled.width(),
                scaled.height(),
                max_dimension
            );
        }
        let (width, height) = image.dimensions();
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            sampler: create_default_sampler(device),
        })
    }

    /// A 1x1 opaque white texture, neutral when multiplied with a base colour.
    pub fn blank(device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<Self> {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        Self::from_rgba(device, queue, &image, Some("blank texture"), true)
    }
}

/// A render attachment that is never sampled.
#[derive(Debug)]
pub struct RenderTarget {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth buffer matching a surface of `size` and the pipelines' sample count.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        size: [u32; 2],
        sample_count: u32,
        label: &str,
    ) -> Self {
        Self::create(device, size, sample_count, Self::DEPTH_FORMAT, label)
    }

    /// Multisampled colour attachment that is resolved into the surface texture.
    pub fn create_msaa_target(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Self {
        Self::create(
            device,
            [config.width, config.height],
            sample_count,
            config.format,
            "msaa_target",
        )
    }

    fn create(
        device: &wgpu::Device,
        size: [u32; 2],
        sample_count: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Size of `(width, height)` scaled down, keeping the aspect ratio, so that neither
/// side exceeds `max_dimension`.
pub fn fitted_size((width, height): (u32, u32), max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || max_dimension == 0 {
        return (width, height);
    }
    let scale = |side: u32| ((side as u64 * max_dimension as u64) / longest as u64).max(1) as u32;
    (scale(width), scale(height))
}

/// Borrows `image` if it already fits, otherwise returns a resampled copy.
pub fn fit_within<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    max_dimension: u32,
) -> Cow<'_, ImageBuffer<P, Vec<P::Subpixel>>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let (width, height) = fitted_size(image.dimensions(), max_dimension);
    if (width, height) == image.dimensions() {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(image::imageops::resize(image, width, height, FilterType::Triangle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_side_is_scaled_to_the_limit() {
        assert_eq!(fitted_size((4096, 2048), 2048), (2048, 1024));
        assert_eq!(fitted_size((1000, 8192), 2048), (250, 2048));
        assert_eq!(fitted_size((2048, 2048), 2048), (2048, 2048));
    }

    #[test]
    fn thin_images_keep_at_least_one_texel() {
        assert_eq!(fitted_size((100_000, 1), 2048), (2048, 1));
    }

    #[test]
    fn fitting_images_are_not_copied() {
        let image = RgbaImage::new(16, 8);
        assert!(matches!(fit_within(&image, 16), Cow::Borrowed(_)));
        let scaled = fit_within(&image, 4);
        assert_eq!(scaled.dimensions(), (4, 2));
    }
}
