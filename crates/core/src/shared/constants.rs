pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Embedding distance below which a candidate is the tracked identity.
pub const DEFAULT_FACE_THRESHOLD: f64 = 0.45;

/// Frames between detector invocations.
pub const DEFAULT_DETECT_INTERVAL: u64 = 5;

/// Frames between display publishes.
pub const DEFAULT_DISPLAY_INTERVAL: u64 = 2;

/// Acquisition timer period (~33 frames per second).
pub const DEFAULT_TICK_PERIOD_MS: u64 = 30;

/// Consecutive misses after which the locked box is dropped.
pub const DEFAULT_STALE_AFTER_MISSES: u32 = 1;

/// Upper bound on how long the match worker sleeps when it has no work.
pub const DEFAULT_IDLE_WAIT_MS: u64 = 5;

/// COCO class id for "person".
pub const PERSON_CLASS_ID: u32 = 0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Overlay colour for the locked box (RGB).
pub const LOCK_BOX_COLOR: [u8; 3] = [0, 255, 0];
pub const LOCK_BOX_THICKNESS: u32 = 3;
