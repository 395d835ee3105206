use cgmath::{Point3, Vector3};
use food_art_scene::{
    config::SceneConfig,
    data_structures::{
        environment::EnvironmentMap,
        instance::Instance,
        scene_graph::{ContainerNode, Light, Scene, SceneNode},
    },
    pipelines::light::LightUniform,
    showcase::stage::{install_environment, install_light_rig, install_model},
};
use image::Rgb32FImage;

use crate::common::test_utils::{approx_eq, capture_logs, quad_model};

mod common;

fn panorama(width: u32, height: u32, value: f32) -> EnvironmentMap {
    EnvironmentMap::from_radiance(&Rgb32FImage::from_pixel(
        width,
        height,
        image::Rgb([value, value, value]),
    ))
}

#[test]
fn failed_model_load_leaves_scene_untouched_and_logs_once() {
    let logs = capture_logs();
    let mut scene = Scene::new();
    scene.add(Box::new(ContainerNode::new()));

    let id = install_model(&mut scene, Err(anyhow::anyhow!("model.glb: 404")), 2.0);

    assert!(id.is_none());
    assert_eq!(scene.node_count(), 1);
    assert_eq!(logs.count(log::Level::Error), 1);
    assert!(logs.records()[0].1.contains("404"));
}

#[test]
fn loaded_model_is_scaled_and_attached() {
    let mut scene = Scene::new();
    let id = install_model(&mut scene, Ok(quad_model()), 2.0).expect("model attached");

    let root = scene.node(id).expect("node exists");
    assert_eq!(root.local_transform().scale, Vector3::new(2.0, 2.0, 2.0));
    assert_eq!(root.subtree_len(), 2);
    assert_eq!(root.vertex_count(), 4);
}

#[test]
fn environment_and_model_installs_are_order_independent() {
    let mut environment_first = Scene::new();
    install_environment(&mut environment_first, Ok(panorama(8, 4, 1.0)));
    install_model(&mut environment_first, Ok(quad_model()), 2.0);

    let mut model_first = Scene::new();
    install_model(&mut model_first, Ok(quad_model()), 2.0);
    install_environment(&mut model_first, Ok(panorama(8, 4, 1.0)));

    for scene in [&environment_first, &model_first] {
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.environment_revision(), 1);
        assert_eq!(scene.environment().map(EnvironmentMap::dimensions), Some((8, 4)));
    }
}

#[test]
fn last_environment_wins() {
    let mut scene = Scene::new();
    install_environment(&mut scene, Ok(panorama(8, 4, 1.0)));
    install_environment(&mut scene, Ok(panorama(16, 8, 2.0)));

    assert_eq!(scene.environment_revision(), 2);
    assert_eq!(scene.environment().map(EnvironmentMap::dimensions), Some((16, 8)));
}

#[test]
fn failed_environment_is_a_warning() {
    let logs = capture_logs();
    let mut scene = Scene::new();
    assert!(!install_environment(&mut scene, Err(anyhow::anyhow!("offline"))));
    assert!(scene.environment().is_none());
    assert_eq!(logs.count(log::Level::Warn), 1);
    assert_eq!(logs.count(log::Level::Error), 0);
}

#[test]
fn light_rig_reaches_the_shader_uniform() {
    let settings = SceneConfig::default();
    let mut scene = Scene::new();
    install_light_rig(&mut scene, &settings.lights);

    assert_eq!(scene.lights().len(), 2);
    assert!(matches!(
        scene.lights()[1],
        Light::Directional { position, .. } if position == Point3::new(10.0, 10.0, 10.0)
    ));

    let uniform = LightUniform::from_scene(&scene);
    assert_eq!(uniform.directional_count(), 1);
    assert_eq!(uniform.ambient(), [0.5, 0.5, 0.5]);
    assert!(!uniform.has_environment());

    scene.set_environment(panorama(4, 2, 1.0));
    assert!(LightUniform::from_scene(&scene).has_environment());
}

#[test]
fn world_transforms_follow_the_parent() {
    let mut scene = Scene::new();
    let mut root = quad_model();
    *root.local_transform_mut() = Instance {
        position: Vector3::new(0.0, 1.0, 0.0),
        ..Instance::new().with_uniform_scale(2.0)
    };
    root.children_mut()[0].local_transform_mut().position = Vector3::new(1.0, 0.0, 0.0);
    let id = scene.add(Box::new(root));

    scene.update_world_transforms();

    let root = scene.node(id).expect("node exists");
    let child = root.children()[0].world_transform();
    assert!(approx_eq(child.position.x, 2.0));
    assert!(approx_eq(child.position.y, 1.0));
    assert!(approx_eq(child.scale.z, 2.0));
}

#[test]
fn node_handles_stay_valid() {
    let mut scene = Scene::new();
    let first = scene.add(Box::new(ContainerNode::new()));
    let second = scene.add(Box::new(quad_model()));
    assert_ne!(first, second);
    assert_eq!(scene.node(second).map(|node| node.vertex_count()), Some(4));
    assert!(scene.node(second + 1).is_none());
    assert_eq!(scene.nodes().map(|node| node.vertex_count()).sum::<usize>(), 4);
}
