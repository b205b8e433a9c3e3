pub mod camera_ingest;

pub use camera_ingest::CameraIngestService;
