//! Scene graph and hierarchical scene organization.
//!
//! The [`Scene`] owns top-level [`SceneNode`]s, the lights and the optional
//! environment. Nodes form a tree: each node keeps a local transform relative to
//! its parent and a world transform that [`Scene::update_world_transforms`]
//! recomputes every frame before rendering.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        environment::EnvironmentMap,
        instance::Instance,
        model::{self, Model, Uploader},
    },
    render::Instanced,
};

/// Handle to a top-level node of a [`Scene`].
pub type NodeId = usize;

/// Builds a node (and its subtree) from a glTF node. Every model of the subtree
/// shares `materials`; its last entry is used for primitives without a material.
pub fn to_scene_node(
    node: gltf::scene::Node,
    buffers: &[Vec<u8>],
    materials: &Arc<[model::Material]>,
) -> Box<dyn SceneNode> {
    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mesh_name = mesh.name().unwrap_or("unknown_mesh");
            let meshes = mesh
                .primitives()
                .enumerate()
                .filter_map(|(idx, primitive)| {
                    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

                    let Some(positions) = reader.read_positions() else {
                        log::warn!("Primitive {} of mesh {} has no positions", idx, mesh_name);
                        return None;
                    };
                    let mut vertices: Vec<model::ModelVertex> = positions
                        .map(|position| model::ModelVertex {
                            position,
                            ..Default::default()
                        })
                        .collect();
                    if let Some(normals) = reader.read_normals() {
                        vertices
                            .iter_mut()
                            .zip(normals)
                            .for_each(|(vertex, normal)| vertex.normal = normal);
                    }
                    if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                        vertices
                            .iter_mut()
                            .zip(tex_coords)
                            .for_each(|(vertex, tex_coord)| vertex.tex_coords = tex_coord);
                    }

                    let indices: Vec<u32> = match reader.read_indices() {
                        Some(indices) => indices.into_u32().collect(),
                        // non-indexed geometry
                        None => (0..vertices.len() as u32).collect(),
                    };
                    let material = primitive
                        .material()
                        .index()
                        .unwrap_or(materials.len().saturating_sub(1));

                    Some(model::Mesh::new(
                        &format!("{}#{}", mesh_name, idx),
                        vertices,
                        indices,
                        material,
                    ))
                })
                .collect();
            let model = Model {
                meshes,
                materials: Arc::clone(materials),
            };
            Box::new(ModelNode::new(model))
        }
        None => Box::new(ContainerNode::new()),
    };
    let (position, rotation, scale) = node.transform().decomposed();
    *scene_node.local_transform_mut() = Instance {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers, materials));
    }

    scene_node
}

pub trait SceneNode: Send {
    fn local_transform(&self) -> &Instance;

    fn local_transform_mut(&mut self) -> &mut Instance;

    fn world_transform(&self) -> &Instance;

    /// Recomputes this node's world transform from its parent's and recurses.
    fn update_world_transforms(&mut self, parent: &Instance);

    fn children(&self) -> &[Box<dyn SceneNode>];

    fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children_mut().push(child);
    }

    fn model(&self) -> Option<&Model> {
        None
    }

    fn model_mut(&mut self) -> Option<&mut Model> {
        None
    }

    fn write_to_buffers(&mut self, uploader: &Uploader) {
        self.children_mut()
            .iter_mut()
            .for_each(|child| child.write_to_buffers(uploader));
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        self.children()
            .iter()
            .flat_map(|child| child.get_render())
            .collect()
    }

    /// Number of nodes in this subtree, `self` included.
    fn subtree_len(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|child| child.subtree_len())
            .sum::<usize>()
    }

    /// Total vertex count of all models in this subtree.
    fn vertex_count(&self) -> usize {
        self.model().map_or(0, Model::vertex_count)
            + self
                .children()
                .iter()
                .map(|child| child.vertex_count())
                .sum::<usize>()
    }
}

/// A transform-only node grouping its children.
#[derive(Default)]
pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    transform: (Instance, Instance),
}

impl ContainerNode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SceneNode for ContainerNode {
    fn local_transform(&self) -> &Instance {
        &self.transform.0
    }

    fn local_transform_mut(&mut self) -> &mut Instance {
        &mut self.transform.0
    }

    fn world_transform(&self) -> &Instance {
        &self.transform.1
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        let (local, world) = &mut self.transform;
        *world = parent * &*local;
        let world = world.clone();
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }
}

/// A node that draws a [`Model`] with its world transform.
pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    transform: (Instance, Instance),
    model: Model,
    instance_buffer: Option<wgpu::Buffer>,
}

impl ModelNode {
    pub fn new(model: Model) -> Self {
        Self {
            children: vec![],
            transform: Default::default(),
            model,
            instance_buffer: None,
        }
    }
}

impl SceneNode for ModelNode {
    fn local_transform(&self) -> &Instance {
        &self.transform.0
    }

    fn local_transform_mut(&mut self) -> &mut Instance {
        &mut self.transform.0
    }

    fn world_transform(&self) -> &Instance {
        &self.transform.1
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        let (local, world) = &mut self.transform;
        *world = parent * &*local;
        let world = world.clone();
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn model(&self) -> Option<&Model> {
        Some(&self.model)
    }

    fn model_mut(&mut self) -> Option<&mut Model> {
        Some(&mut self.model)
    }

    fn write_to_buffers(&mut self, uploader: &Uploader) {
        self.model.write_to_buffers(uploader);
        let raw = [self.transform.1.to_raw()];
        match &self.instance_buffer {
            Some(buffer) => uploader
                .queue
                .write_buffer(buffer, 0, bytemuck::cast_slice(&raw)),
            None => {
                self.instance_buffer = Some(uploader.device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some("Instance Buffer"),
                        contents: bytemuck::cast_slice(&raw),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    },
                ))
            }
        }
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(uploader));
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        let own = self.instance_buffer.as_ref().map(|instance| Instanced {
            instance,
            model: &self.model,
            amount: 1,
        });
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .chain(own)
            .collect()
    }
}

/// Light sources understood by the standard pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    /// Uniform light reaching every surface.
    Ambient { colour: [f32; 3], intensity: f32 },
    /// Parallel light shining from `position` towards `target`.
    Directional {
        colour: [f32; 3],
        intensity: f32,
        position: cgmath::Point3<f32>,
        target: cgmath::Point3<f32>,
    },
}

/// Root of everything that is drawn.
#[derive(Default)]
pub struct Scene {
    nodes: Vec<(NodeId, Box<dyn SceneNode>)>,
    lights: Vec<Light>,
    environment: Option<EnvironmentMap>,
    environment_revision: u64,
    next_id: NodeId,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a top-level node and returns its handle.
    pub fn add(&mut self, node: Box<dyn SceneNode>) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.push((id, node));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&dyn SceneNode> {
        self.nodes
            .iter()
            .find(|(node_id, _)| *node_id == id)
            .map(|(_, node)| node.as_ref() as &dyn SceneNode)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut (dyn SceneNode + 'static)> {
        self.nodes
            .iter_mut()
            .find(|(node_id, _)| *node_id == id)
            .map(|(_, node)| node.as_mut())
    }

    /// Number of top-level nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &dyn SceneNode> {
        self.nodes.iter().map(|(_, node)| node.as_ref() as &dyn SceneNode)
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Installs `environment`, replacing any previous one.
    pub fn set_environment(&mut self, environment: EnvironmentMap) {
        self.environment = Some(environment);
        self.environment_revision += 1;
    }

    pub fn environment(&self) -> Option<&EnvironmentMap> {
        self.environment.as_ref()
    }

    /// Increases with every [`set_environment`](Self::set_environment) call.
    pub fn environment_revision(&self) -> u64 {
        self.environment_revision
    }

    pub fn update_world_transforms(&mut self) {
        let root = Instance::default();
        self.nodes
            .iter_mut()
            .for_each(|(_, node)| node.update_world_transforms(&root));
    }

    pub fn write_to_buffers(&mut self, uploader: &Uploader) {
        self.nodes
            .iter_mut()
            .for_each(|(_, node)| node.write_to_buffers(uploader));
    }

    pub fn get_render(&self) -> Vec<Instanced<'_>> {
        self.nodes
            .iter()
            .flat_map(|(_, node)| node.get_render())
            .collect()
    }
}
