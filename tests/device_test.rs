#![cfg(not(target_arch = "wasm32"))]

use std::sync::Arc;

use cgmath::Deg;
use food_art_scene::{
    camera::{Camera, CameraResources, OrbitController, Projection},
    config::SceneConfig,
    data_structures::{
        environment::EnvironmentMap,
        model::{Material, Mesh, Model, ModelVertex, Uploader},
        scene_graph::{Scene, SceneNode},
        texture::Texture,
    },
    pipelines::{basic::mk_basic_pipeline, environment::EnvironmentResources, light::LightResources},
    resources::{load_model_gltf, texture::material_layout},
};
use image::{Rgb32FImage, RgbaImage};

use crate::common::test_utils::capture_logs;

mod common;

/// A device without a backend that still validates every call, limited like WebGL2.
fn webgl2_device() -> (wgpu::Device, wgpu::Queue) {
    wgpu::Device::noop(&wgpu::DeviceDescriptor {
        required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
        ..Default::default()
    })
}

struct Uploads {
    device: wgpu::Device,
    queue: wgpu::Queue,
    material_layout: wgpu::BindGroupLayout,
    blank: Texture,
}

impl Uploads {
    fn new() -> Self {
        let (device, queue) = webgl2_device();
        let material_layout = material_layout(&device);
        let blank = Texture::blank(&device, &queue).expect("blank texture");
        Self {
            device,
            queue,
            material_layout,
            blank,
        }
    }

    fn uploader(&self) -> Uploader<'_> {
        Uploader {
            device: &self.device,
            queue: &self.queue,
            material_layout: &self.material_layout,
            blank: &self.blank,
        }
    }
}

fn triangle(material: Material) -> Model {
    let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        .into_iter()
        .map(|position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();
    Model {
        meshes: vec![Mesh::new("triangle", vertices, vec![0, 1, 2], 0)],
        materials: vec![material].into(),
    }
}

#[test]
fn textures_beyond_the_device_limit_are_downscaled() {
    let logs = capture_logs();
    let (device, queue) = webgl2_device();
    let max = device.limits().max_texture_dimension_2d;
    assert_eq!(max, 2048);

    let texture = Texture::from_rgba(&device, &queue, &RgbaImage::new(4096, 512), Some("wide"), true)
        .expect("oversized image is uploaded");

    assert_eq!(texture.texture.width(), 2048);
    assert_eq!(texture.texture.height(), 256);
    assert!(
        logs.records()
            .iter()
            .any(|(level, message)| *level == log::Level::Warn && message.contains("downscaled"))
    );
}

#[test]
fn oversized_panorama_is_uploaded_on_webgl2() {
    let (device, queue) = webgl2_device();
    let mut environment = EnvironmentResources::new(&device, &queue).expect("placeholders");
    let mut scene = Scene::new();
    scene.set_environment(EnvironmentMap::from_radiance(&Rgb32FImage::from_pixel(
        4096,
        64,
        image::Rgb([1.0, 1.0, 1.0]),
    )));

    environment.sync(&device, &queue, &scene);

    assert_eq!(environment.radiance.texture.width(), 2048);
    assert_eq!(environment.radiance.texture.height(), 32);
}

#[test]
fn lit_pipeline_matches_the_bind_group_layouts() {
    let (device, queue) = webgl2_device();
    let settings = SceneConfig::default();
    let projection = Projection::new(800, 600, Deg(75.0), 0.1, 1000.0);
    let camera = CameraResources::new(
        &device,
        Camera::new(settings.viewport.camera_position, settings.controls.target),
        OrbitController::new(&settings.controls),
        &projection,
    );
    let light = LightResources::new(&device);
    let environment = EnvironmentResources::new(&device, &queue).expect("placeholders");
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        width: 800,
        height: 600,
        present_mode: wgpu::PresentMode::Fifo,
        desired_maximum_frame_latency: 2,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
    };

    // any shader or layout mismatch panics through the uncaptured error handler
    mk_basic_pipeline(
        &device,
        &config,
        1,
        &material_layout(&device),
        &camera.bind_group_layout,
        &light.bind_group_layout,
        &environment.bind_group_layout,
    );
}

#[test]
fn failed_material_upload_is_reported_once() {
    let logs = capture_logs();
    let uploads = Uploads::new();
    let mut broken = Material::new("broken", [1.0; 4]);
    broken.diffuse = Some(RgbaImage::new(0, 0));
    let mut model = triangle(broken);

    for _ in 0..3 {
        model.write_to_buffers(&uploads.uploader());
    }

    let failures = logs
        .records()
        .into_iter()
        .filter(|(level, message)| *level == log::Level::Error && message.contains("broken"))
        .count();
    assert_eq!(failures, 1);
    // drawn with the blank texture instead
    assert!(model.materials[0].bind_group().is_some());
    assert!(model.meshes[0].gpu().is_some());
}

#[tokio::test]
async fn nodes_of_one_import_share_their_materials() {
    let uploads = Uploads::new();
    let root = load_model_gltf("../tests/fixtures/shared.gltf")
        .await
        .expect("fixture model loads");
    let mut scene = Scene::new();
    scene.add(Box::new(root));

    scene.write_to_buffers(&uploads.uploader());

    let root = scene.nodes().next().expect("root was added");
    let models: Vec<_> = root
        .children()
        .iter()
        .map(|node| node.model().expect("every node draws the triangle"))
        .collect();
    assert_eq!(models.len(), 3);
    for model in &models[1..] {
        assert!(Arc::ptr_eq(&model.materials, &models[0].materials));
    }

    // red, checker and the default material
    let materials = &models[0].materials;
    assert_eq!(materials.len(), 3);
    assert_eq!(materials[1].diffuse.as_ref().map(|image| image.dimensions()), Some((2, 2)));
    assert!(materials[0].bind_group().is_some());
    // no mesh uses the checker, so its texture never reaches the GPU
    assert!(materials[1].bind_group().is_none());
    assert!(materials[2].bind_group().is_none());
}
