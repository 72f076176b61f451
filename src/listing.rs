use std::{error::Error, io};

use crate::{
    digest::blob_paths,
    engine::ImageSource,
    merge::{merge, Listing},
    walker::{walk, ExtendedHeaderKind},
    EventHandler,
};

type BoxError = Box<dyn Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum ListError {
    #[error("Failed to inspect image {image}: {source}")]
    Inspect { image: String, source: BoxError },

    #[error("Failed to export image {image}: {source}")]
    Export { image: String, source: BoxError },

    #[error("Unexpected tar entry ({kind}) in layer {layer}: name={path}")]
    ExtendedHeader {
        layer: String,
        path: String,
        kind: ExtendedHeaderKind,
    },

    #[error("Invalid gzip stream in layer {layer}: {source}")]
    Gzip { layer: String, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// List the files of the image `image_id`.
///
/// The image is exported from `source`, and its archive is read to
/// collect the files of every layer. The result contains every path
/// only once, with directories first.
///
/// Layers that can't be read are skipped, so the listing may be
/// incomplete. [`EventHandler::layer_skipped`] is invoked for every
/// skipped layer.
pub fn list_files<S, E>(source: S, image_id: &str, event_handler: E) -> Result<Listing, ListError>
where
    S: ImageSource,
    E: EventHandler,
{
    let metadata = source.inspect(image_id).map_err(|e| ListError::Inspect {
        image: image_id.to_owned(),
        source: Box::new(e),
    })?;

    // Without a version, the archive is read with the legacy layout.
    let engine_version = match source.engine_version() {
        Ok(version) => Some(version),
        Err(err) => {
            log::debug!("Engine version is not available: {err}");
            event_handler.engine_version_unavailable(&err);
            None
        }
    };

    let blob_paths = blob_paths(&metadata.layers);

    event_handler.export_started(image_id);

    let export = source.export(image_id).map_err(|e| ListError::Export {
        image: image_id.to_owned(),
        source: Box::new(e),
    })?;

    let walk = walk(
        export,
        &blob_paths,
        engine_version.as_deref(),
        &event_handler,
    )?;

    let listing = merge(walk.records);

    event_handler.listing_finished(listing.records.len(), walk.skipped_layers);

    Ok(listing)
}
