//! Scene settings.
//!
//! Every tunable of the showcase lives in [`SceneConfig`]. The defaults describe the
//! "Food Art & Design" page; callers may tweak a copy before handing it to
//! [`crate::flow::run`]. The settings end up on the [`crate::context::Context`] so
//! flows can read them at any time.

use cgmath::{Deg, Point3, Vector3};

/// Locations of the external assets. Relative paths are resolved against the asset
/// directory (see [`crate::resources::load_binary`]), absolute `http(s)` URLs are
/// fetched as they are.
#[derive(Clone, Debug)]
pub struct AssetPaths {
    pub environment: String,
    pub model: String,
    pub font: String,
    pub music: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            environment: "environment.hdr".to_string(),
            model: "model.glb".to_string(),
            font: "https://cdn.jsdelivr.net/npm/three@0.155.0/examples/fonts/helvetiker_regular.typeface.json".to_string(),
            music: "./under_your_spell.mp3".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ViewportConfig {
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Initial camera position; the camera always looks at the orbit pivot.
    pub camera_position: Point3<f32>,
    /// RGBA clear colour. The default is fully transparent.
    pub clear_colour: wgpu::Color,
    pub sample_count: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            fovy: Deg(75.0),
            znear: 0.1,
            zfar: 1000.0,
            // above and behind the origin
            camera_position: Point3::new(0.0, 5.0, 15.0),
            clear_colour: wgpu::Color::TRANSPARENT,
            sample_count: 4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ControlsConfig {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            target: Point3::new(0.0, 0.0, 0.0),
            enable_damping: true,
            damping_factor: 0.1,
            min_distance: 5.0,
            max_distance: 50.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LightRigConfig {
    pub ambient_colour: [f32; 3],
    pub ambient_intensity: f32,
    pub directional_colour: [f32; 3],
    pub directional_intensity: f32,
    pub directional_position: Point3<f32>,
}

impl Default for LightRigConfig {
    fn default() -> Self {
        Self {
            ambient_colour: [1.0, 1.0, 1.0],
            ambient_intensity: 0.5,
            directional_colour: [1.0, 1.0, 1.0],
            directional_intensity: 1.0,
            directional_position: Point3::new(10.0, 10.0, 10.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TitleConfig {
    pub text: String,
    pub size: f32,
    pub depth: f32,
    pub curve_segments: u32,
    pub colour: [f32; 4],
    pub position: Vector3<f32>,
    /// Tilt around the X axis in radians.
    pub tilt: f32,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            text: "Food Art & Design".to_string(),
            size: 1.0,
            depth: 0.2,
            curve_segments: 12,
            colour: [1.0, 0.0, 0.0, 1.0],
            // behind the model
            position: Vector3::new(-8.0, 2.0, -5.0),
            tilt: -0.1,
        }
    }
}

/// Shape of the click-triggered vertex wave.
#[derive(Clone, Debug)]
pub struct WaveConfig {
    /// Offsets are drawn from `[-amplitude, amplitude)`.
    pub amplitude: f32,
    pub duration: f32,
    /// Delay of the last vertex; earlier vertices start proportionally sooner.
    pub stagger: f32,
    pub repeat: u32,
    pub yoyo: bool,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            amplitude: 0.25,
            duration: 0.5,
            stagger: 0.5,
            repeat: 1,
            yoyo: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub assets: AssetPaths,
    pub viewport: ViewportConfig,
    pub controls: ControlsConfig,
    pub lights: LightRigConfig,
    pub title: TitleConfig,
    pub wave: WaveConfig,
    /// Uniform scale applied to the loaded model's root.
    pub model_scale: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            viewport: ViewportConfig::default(),
            controls: ControlsConfig::default(),
            lights: LightRigConfig::default(),
            title: TitleConfig::default(),
            wave: WaveConfig::default(),
            model_scale: 2.0,
        }
    }
}
