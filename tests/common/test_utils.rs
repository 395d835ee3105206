use std::cell::RefCell;

use food_art_scene::{
    data_structures::{
        model::{Material, Mesh, Model, ModelVertex},
        scene_graph::{ContainerNode, ModelNode, SceneNode},
    },
    resources::font::Font,
};

thread_local! {
    static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Collects log records emitted on the current test thread.
struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

pub(crate) struct LogCapture;

impl LogCapture {
    pub fn records(&self) -> Vec<(log::Level, String)> {
        RECORDS.with(|records| records.borrow().clone())
    }

    pub fn count(&self, level: log::Level) -> usize {
        self.records()
            .iter()
            .filter(|(recorded, _)| *recorded == level)
            .count()
    }
}

/// Starts capturing log records of the calling thread, dropping earlier ones.
pub(crate) fn capture_logs() -> LogCapture {
    // another test of this binary may have installed it already
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Trace);
    RECORDS.with(|records| records.borrow_mut().clear());
    LogCapture
}

pub(crate) const SQUARE_FONT: &str = include_str!("../fixtures/square.typeface.json");

pub(crate) fn square_font() -> Font {
    Font::from_json(SQUARE_FONT).expect("fixture font is valid")
}

/// A model root holding one quad, as the model loader would produce it.
pub(crate) fn quad_model() -> ContainerNode {
    let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
        .into_iter()
        .map(|position| ModelVertex {
            position,
            normal: [0.0, 0.0, 1.0],
            ..Default::default()
        })
        .collect();
    let mesh = Mesh::new("quad", vertices, vec![0, 1, 2, 0, 2, 3], 0);
    let model = Model {
        meshes: vec![mesh],
        materials: vec![Material::new("white", [1.0; 4])].into(),
    };
    let mut root = ContainerNode::new();
    root.add_child(Box::new(ModelNode::new(model)));
    root
}

pub(crate) fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
