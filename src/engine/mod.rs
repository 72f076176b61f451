//! Access to the container engine that stores the images.

mod http;
#[cfg(test)]
mod tests;

use std::{error::Error, io::Read};

pub use http::{Client, EngineError};

/// Metadata of an image, as reported by the engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageMetadata {
    /// Image identifier (`sha256:...`).
    pub id: String,

    /// Digests of the layers, from the base layer to the top one.
    pub layers: Vec<String>,
}

/// Engine that can describe and export images.
pub trait ImageSource {
    /// Stream with the export archive of an image.
    type Export: Read;

    type Error: Error + Send + Sync + 'static;

    /// Get the metadata of the image.
    fn inspect(&self, image_id: &str) -> Result<ImageMetadata, Self::Error>;

    /// Version of the engine, like `25.0.3`.
    ///
    /// The format of the export archive depends on this version.
    fn engine_version(&self) -> Result<String, Self::Error>;

    /// Start to export the image. The archive is read from the
    /// returned stream.
    fn export(&self, image_id: &str) -> Result<Self::Export, Self::Error>;
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
    type Export = S::Export;

    type Error = S::Error;

    fn inspect(&self, image_id: &str) -> Result<ImageMetadata, Self::Error> {
        (**self).inspect(image_id)
    }

    fn engine_version(&self) -> Result<String, Self::Error> {
        (**self).engine_version()
    }

    fn export(&self, image_id: &str) -> Result<Self::Export, Self::Error> {
        (**self).export(image_id)
    }
}
