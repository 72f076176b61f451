pub mod blobs;
pub mod engine;
