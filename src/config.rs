//! Application configuration and constants

use std::path::PathBuf;
use std::sync::OnceLock;

static CUSTOM_MODELS_DIR: OnceLock<PathBuf> = OnceLock::new();
static CUSTOM_VISION: OnceLock<PathBuf> = OnceLock::new();

// === Model Files ===
pub const VISION_MODEL: &str = "vision_model_q4f16.onnx";

// === Model Parameters ===
pub const INPUT_SIZE: u32 = 224;
pub const EMBEDDING_DIM: usize = 512;

/// Per-channel normalization applied before inference (CLIP preprocessing)
pub const PIXEL_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];
pub const PIXEL_STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

// === Protocol Defaults ===
pub const DEFAULT_THRESHOLD: f32 = 0.85;
pub const MIN_GROUP_SIZE: usize = 2;

pub fn set_models_dir(path: PathBuf) {
    let _ = CUSTOM_MODELS_DIR.set(path);
}

pub fn set_vision_model(path: PathBuf) {
    let _ = CUSTOM_VISION.set(path);
}

/// Get models directory (flag override, PHOTOSIFT_MODELS_DIR env var, or next to executable)
pub fn models_dir() -> Option<PathBuf> {
    if let Some(custom) = CUSTOM_MODELS_DIR.get() {
        crate::ui::debug(&format!("Using custom model dir: {}", custom.display()));
        return Some(custom.clone());
    }

    if let Ok(env_path) = std::env::var("PHOTOSIFT_MODELS_DIR") {
        let path = PathBuf::from(&env_path);
        if path.is_dir() {
            crate::ui::debug(&format!("Using PHOTOSIFT_MODELS_DIR: {}", env_path));
            return Some(path);
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let models = dir.join("models");
            if models.is_dir() {
                crate::ui::debug(&format!("Found models at: {}", models.display()));
                return Some(models);
            }
        }
    }

    None
}

pub fn get_vision_model_path() -> Option<PathBuf> {
    if let Some(custom) = CUSTOM_VISION.get() {
        return Some(custom.clone());
    }
    models_dir().map(|d| d.join(VISION_MODEL))
}
