use std::borrow::Cow;

use crate::data_structures::{environment::EnvironmentMap, scene_graph::Scene, texture::Texture};

/// GPU copy of the scene environment. Until an environment is installed both maps
/// are 1x1 black placeholders and the shader skips environment lighting.
///
/// The maps hold RGBE texels, which must not be filtered before decoding, so the
/// group has no sampler: the shader fetches texels and interpolates decoded values.
pub struct EnvironmentResources {
    pub radiance: Texture,
    pub irradiance: Texture,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    revision: u64,
}

impl EnvironmentResources {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<Self> {
        let bind_group_layout = mk_bind_group_layout(device);
        let placeholder = image::RgbaImage::new(1, 1);
        let radiance = Texture::from_rgba(device, queue, &placeholder, Some("radiance"), false)?;
        let irradiance = Texture::from_rgba(device, queue, &placeholder, Some("irradiance"), false)?;
        let bind_group = mk_bind_group(device, &bind_group_layout, &radiance, &irradiance);
        Ok(Self {
            radiance,
            irradiance,
            bind_group,
            bind_group_layout,
            revision: 0,
        })
    }

    /// Re-uploads the maps when the scene installed a new environment.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        if scene.environment_revision() == self.revision {
            return;
        }
        self.revision = scene.environment_revision();
        let Some(environment) = scene.environment() else {
            return;
        };
        if let Err(e) = self.upload(device, queue, environment) {
            log::error!("Environment could not be uploaded: {}", e);
        }
    }

    fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        environment: &EnvironmentMap,
    ) -> anyhow::Result<()> {
        let max_dimension = device.limits().max_texture_dimension_2d;
        let environment = environment.fit_within(max_dimension);
        if let Cow::Owned(scaled) = &environment {
            let (width, height) = scaled.dimensions();
            log::info!("Environment downscaled to {}x{} for this device", width, height);
        }
        self.radiance = Texture::from_rgba(device, queue, &environment.radiance, Some("radiance"), false)?;
        self.irradiance =
            Texture::from_rgba(device, queue, &environment.irradiance, Some("irradiance"), false)?;
        self.bind_group = mk_bind_group(device, &self.bind_group_layout, &self.radiance, &self.irradiance);
        Ok(())
    }
}

fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[texture_entry(0), texture_entry(1)],
        label: Some("environment_bind_group_layout"),
    })
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    radiance: &Texture,
    irradiance: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&radiance.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&irradiance.view),
            },
        ],
        label: Some("environment_bind_group"),
    })
}
