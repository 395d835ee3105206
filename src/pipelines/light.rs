use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::data_structures::scene_graph::{Light, Scene};

/// Directional lights beyond this count are ignored by the shader.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Summed ambient colour times intensity; `w` unused.
    ambient: [f32; 4],
    /// Unit vectors pointing towards each directional light.
    directions: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    colours: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Directional light count, environment present flag, padding.
    counts: [u32; 4],
}

impl LightUniform {
    pub fn from_scene(scene: &Scene) -> Self {
        let mut uniform = Self::zeroed();
        let mut directional = 0;
        for light in scene.lights() {
            match light {
                Light::Ambient { colour, intensity } => {
                    for (sum, c) in uniform.ambient.iter_mut().zip(colour) {
                        *sum += c * intensity;
                    }
                }
                Light::Directional {
                    colour,
                    intensity,
                    position,
                    target,
                } => {
                    if directional == MAX_DIRECTIONAL_LIGHTS {
                        log::warn!("Only {} directional lights are supported", MAX_DIRECTIONAL_LIGHTS);
                        continue;
                    }
                    let direction = *position - *target;
                    if direction.magnitude2() == 0.0 {
                        continue;
                    }
                    let direction = direction.normalize();
                    uniform.directions[directional] = [direction.x, direction.y, direction.z, 0.0];
                    uniform.colours[directional] = [
                        colour[0] * intensity,
                        colour[1] * intensity,
                        colour[2] * intensity,
                        1.0,
                    ];
                    directional += 1;
                }
            }
        }
        uniform.counts = [
            directional as u32,
            scene.environment().is_some() as u32,
            0,
            0,
        ];
        uniform
    }

    fn zeroed() -> Self {
        bytemuck::Zeroable::zeroed()
    }

    pub fn directional_count(&self) -> u32 {
        self.counts[0]
    }

    pub fn ambient(&self) -> [f32; 3] {
        [self.ambient[0], self.ambient[1], self.ambient[2]]
    }

    pub fn has_environment(&self) -> bool {
        self.counts[1] != 0
    }
}

impl LightResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = LightUniform::zeroed();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("light_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Uploads the scene's lights when they changed since the last call.
    pub fn sync(&mut self, queue: &wgpu::Queue, scene: &Scene) {
        let uniform = LightUniform::from_scene(scene);
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}
