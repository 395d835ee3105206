use food_art_scene::{
    config::{SceneConfig, TitleConfig, WaveConfig},
    data_structures::scene_graph::{Scene, SceneNode},
    showcase::title::{TitleAnimation, spawn_title, wave_timeline},
    tween::{Animator, Ease, TweenTarget},
};
use rand::{SeedableRng, rngs::StdRng};

use crate::common::test_utils::{approx_eq, capture_logs, square_font};

mod common;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

/// Flat positions of `count` vertices laid out along X.
fn positions(count: usize) -> Vec<f32> {
    (0..count)
        .flat_map(|i| [i as f32, 0.5 * i as f32, -(i as f32)])
        .collect()
}

#[test]
fn one_tween_per_vertex_with_staggered_delays() {
    let settings = WaveConfig::default();
    let target = positions(8);
    let timeline = wave_timeline(target.as_slice(), &settings, &mut rng());

    assert_eq!(timeline.tweens().len(), 8);
    for (i, tween) in timeline.tweens().iter().enumerate() {
        assert!(approx_eq(tween.delay(), i as f32 / 8.0 * 0.5));
        assert!(approx_eq(tween.duration(), 0.5));
        assert_eq!(tween.repeat(), 1);
        assert!(tween.yoyo());
        assert_eq!(tween.ease(), Ease::Power1Out);

        let indices: Vec<usize> = tween.properties().iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![i * 3 + 1, i * 3 + 2]);
        for property in tween.properties() {
            let current = target[property.index()];
            let offset = property.to() - current;
            assert!(offset.abs() <= 0.25 + 1e-5, "offset {} out of range", offset);
            // start values are captured when the tween first renders
            assert!(property.from().is_none());
        }
    }
    // the last vertex starts just before the stagger ends and runs there and back
    assert!(approx_eq(timeline.duration(), 7.0 / 8.0 * 0.5 + 2.0 * 0.5));
}

#[test]
fn x_coordinates_are_never_animated() {
    let timeline = wave_timeline(positions(5).as_slice(), &WaveConfig::default(), &mut rng());
    assert!(
        timeline
            .tweens()
            .iter()
            .flat_map(|tween| tween.properties())
            .all(|property| property.index() % 3 != 0)
    );
}

#[test]
fn empty_target_gives_empty_wave() {
    let timeline = wave_timeline(Vec::<f32>::new().as_slice(), &WaveConfig::default(), &mut rng());
    assert!(timeline.tweens().is_empty());
    assert!(timeline.is_finished());
}

#[test]
fn yoyo_returns_every_vertex_to_its_start() {
    let start = positions(6);
    let mut target = start.clone();
    let mut timeline = wave_timeline(target.as_slice(), &WaveConfig::default(), &mut rng());

    let mut moved = false;
    for _ in 0..120 {
        timeline.advance(1.0 / 60.0, target.as_mut_slice());
        moved |= target != start;
    }
    assert!(moved);
    assert!(timeline.is_finished());
    for (actual, expected) in target.iter().zip(start.iter()) {
        assert!(approx_eq(*actual, *expected));
    }
}

#[test]
fn stacked_waves_run_independently() {
    let start = positions(4);
    let mut target = start.clone();
    let mut animator = Animator::new();
    let mut rng = rng();

    animator.push(wave_timeline(target.as_slice(), &WaveConfig::default(), &mut rng));
    animator.advance(0.3, target.as_mut_slice());
    animator.push(wave_timeline(target.as_slice(), &WaveConfig::default(), &mut rng));
    assert_eq!(animator.active(), 2);

    for _ in 0..200 {
        animator.advance(1.0 / 60.0, target.as_mut_slice());
    }
    assert!(animator.is_idle());
    assert_eq!(target.property_count(), start.len());
}

#[test]
fn clicks_without_a_title_do_nothing() {
    let logs = capture_logs();
    let mut scene = Scene::new();
    let mut animation = TitleAnimation::new(rng());

    assert!(!animation.on_click(&mut scene, &WaveConfig::default()));
    animation.advance(&mut scene, 0.1);

    assert_eq!(animation.active_waves(), 0);
    assert!(logs.records().is_empty());
}

#[test]
fn title_is_placed_and_waves_on_click() {
    let settings = SceneConfig::default();
    let mut scene = Scene::new();
    let node = spawn_title(&mut scene, &square_font(), &settings.title).expect("title built");

    let title = scene.node(node).expect("title exists");
    assert_eq!(title.local_transform().position, settings.title.position);
    let model = title.model().expect("title has a model");
    assert_eq!(model.materials[0].base_colour, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(model.materials[0].roughness, 1.0);
    assert_eq!(model.materials[0].metallic, 0.0);
    let start = model.meshes[0].vertices.clone();
    assert!(!start.is_empty());

    let mut animation = TitleAnimation::new(rng());
    animation.attach(node);
    assert!(animation.on_click(&mut scene, &settings.wave));
    assert_eq!(animation.active_waves(), 1);

    animation.advance(&mut scene, 0.25);
    let mesh = &scene.node(node).and_then(|n| n.model()).expect("title has a model").meshes[0];
    assert!(mesh.needs_update);
    assert_ne!(mesh.vertices, start);

    for _ in 0..120 {
        animation.advance(&mut scene, 1.0 / 60.0);
    }
    assert_eq!(animation.active_waves(), 0);
    let mesh = &scene.node(node).and_then(|n| n.model()).expect("title has a model").meshes[0];
    for (actual, expected) in mesh.vertices.iter().zip(start.iter()) {
        assert_eq!(actual.position[0], expected.position[0]);
        assert!(approx_eq(actual.position[1], expected.position[1]));
        assert!(approx_eq(actual.position[2], expected.position[2]));
    }
}

#[test]
fn title_without_text_is_still_a_node() {
    let settings = TitleConfig {
        text: String::new(),
        ..Default::default()
    };
    let mut scene = Scene::new();
    let node = spawn_title(&mut scene, &square_font(), &settings).expect("title built");
    assert_eq!(scene.node(node).map(|n| n.vertex_count()), Some(0));
}

#[test]
fn every_click_adds_a_wave() {
    let settings = SceneConfig::default();
    let mut scene = Scene::new();
    let node = spawn_title(&mut scene, &square_font(), &settings.title).expect("title built");
    let mut animation = TitleAnimation::new(rng());
    animation.attach(node);

    for clicks in 1..=3 {
        assert!(animation.on_click(&mut scene, &settings.wave));
        assert_eq!(animation.active_waves(), clicks);
        animation.advance(&mut scene, 0.1);
    }
    for _ in 0..200 {
        animation.advance(&mut scene, 1.0 / 60.0);
    }
    assert_eq!(animation.active_waves(), 0);
}
