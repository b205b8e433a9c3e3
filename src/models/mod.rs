pub mod camera_models;

pub use camera_models::{CameraGroup, CameraId};
