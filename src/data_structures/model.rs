//! Meshes, materials and models.
//!
//! Geometry and material parameters are kept on the CPU so they can be built off
//! the render thread and mutated by animations. GPU buffers and bind groups are
//! created on the first [`Model::write_to_buffers`] call and afterwards only
//! refreshed when a mesh is flagged with `needs_update`.
//!
//! Materials are shared between all models of one import, so a material and its
//! texture are decoded and uploaded once no matter how many nodes use it.

use std::{
    ops::Range,
    sync::{Arc, OnceLock},
};

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::{data_structures::texture::Texture, tween::TweenTarget};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Everything needed to move CPU data to the GPU.
pub struct Uploader<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub material_layout: &'a wgpu::BindGroupLayout,
    /// Bound in place of a missing base colour image.
    pub blank: &'a Texture,
}

#[derive(Clone, Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Index into the owning model's materials.
    pub material: usize,
    /// Set whenever `vertices` changed after the first upload.
    pub needs_update: bool,
    gpu: Option<GpuMesh>,
}

impl Mesh {
    pub fn new(name: &str, vertices: Vec<ModelVertex>, indices: Vec<u32>, material: usize) -> Self {
        Self {
            name: name.to_string(),
            vertices,
            indices,
            material,
            needs_update: false,
            gpu: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn mark_positions_dirty(&mut self) {
        self.needs_update = true;
    }

    pub fn gpu(&self) -> Option<&GpuMesh> {
        self.gpu.as_ref()
    }

    /// Axis-aligned bounds of all vertex positions, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (
                [
                    min[0].min(v.position[0]),
                    min[1].min(v.position[1]),
                    min[2].min(v.position[2]),
                ],
                [
                    max[0].max(v.position[0]),
                    max[1].max(v.position[1]),
                    max[2].max(v.position[2]),
                ],
            )
        }))
    }

    fn write_to_buffers(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        match &self.gpu {
            Some(gpu) => {
                if self.needs_update {
                    queue.write_buffer(&gpu.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
                }
            }
            None => {
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Vertex Buffer", self.name)),
                    contents: bytemuck::cast_slice(&self.vertices),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", self.name)),
                    contents: bytemuck::cast_slice(&self.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                self.gpu = Some(GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    num_elements: self.indices.len() as u32,
                });
            }
        }
        self.needs_update = false;
    }
}

/// Vertex positions are addressed as a flat `[x0, y0, z0, x1, ...]` array. Any
/// successful write flags the mesh for re-upload.
impl TweenTarget for Mesh {
    fn property_count(&self) -> usize {
        self.vertices.len() * 3
    }

    fn property(&self, index: usize) -> Option<f32> {
        self.vertices
            .get(index / 3)
            .map(|vertex| vertex.position[index % 3])
    }

    fn set_property(&mut self, index: usize, value: f32) -> bool {
        match self.vertices.get_mut(index / 3) {
            Some(vertex) => {
                vertex.position[index % 3] = value;
                self.mark_positions_dirty();
                true
            }
            None => false,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    base_colour: [f32; 4],
    // metallic, roughness, environment intensity, unused
    params: [f32; 4],
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub base_colour: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Scales the contribution of the scene environment.
    pub env_intensity: f32,
    pub diffuse: Option<RgbaImage>,
    bind_group: OnceLock<wgpu::BindGroup>,
}

impl Material {
    pub fn new(name: &str, base_colour: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            base_colour,
            metallic: 0.0,
            roughness: 1.0,
            env_intensity: 1.0,
            diffuse: None,
            bind_group: OnceLock::new(),
        }
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.get()
    }

    /// Creates the bind group once. A base colour image that cannot be uploaded is
    /// reported a single time and replaced by the blank texture.
    fn write_to_buffers(&self, uploader: &Uploader) {
        self.bind_group.get_or_init(|| self.create_bind_group(uploader));
    }

    fn create_bind_group(&self, uploader: &Uploader) -> wgpu::BindGroup {
        let uniform = MaterialUniform {
            base_colour: self.base_colour,
            params: [self.metallic, self.roughness, self.env_intensity, 0.0],
        };
        let buffer = uploader
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Material Buffer", self.name)),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let texture = self.diffuse.as_ref().and_then(|image| {
            Texture::from_rgba(uploader.device, uploader.queue, image, Some(&self.name), true)
                .map_err(|e| log::error!("Material {} could not be uploaded: {}", self.name, e))
                .ok()
        });
        let texture = texture.as_ref().unwrap_or(uploader.blank);
        uploader.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: uploader.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: Some(&self.name),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Arc<[Material]>,
}

impl Model {
    /// Creates missing GPU resources and re-uploads dirty vertex data. Only the
    /// materials referenced by a mesh are uploaded.
    pub fn write_to_buffers(&mut self, uploader: &Uploader) {
        for mesh in self.meshes.iter_mut() {
            if let Some(material) = self.materials.get(mesh.material) {
                material.write_to_buffers(uploader);
            }
            mesh.write_to_buffers(uploader.device, uploader.queue);
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
        environment_bind_group: &'a wgpu::BindGroup,
    );

    fn draw_model_instanced(
        &mut self,
        model: &'a Model,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
        environment_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
        environment_bind_group: &'b wgpu::BindGroup,
    ) {
        // not uploaded yet
        let (Some(gpu), Some(material_bind_group)) = (mesh.gpu(), material.bind_group()) else {
            return;
        };
        self.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        self.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, material_bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.set_bind_group(3, environment_bind_group, &[]);
        self.draw_indexed(0..gpu.num_elements, 0, instances);
    }

    fn draw_model_instanced(
        &mut self,
        model: &'b Model,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
        environment_bind_group: &'b wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            let Some(material) = model.materials.get(mesh.material) else {
                log::warn!("Mesh {} references missing material {}", mesh.name, mesh.material);
                continue;
            };
            self.draw_mesh_instanced(
                mesh,
                material,
                instances.clone(),
                camera_bind_group,
                light_bind_group,
                environment_bind_group,
            );
        }
    }
}
