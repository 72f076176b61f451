use std::fmt::Display;

use crate::walker::LayerPayload;

/// Handler to receive notifications for events while an image is listed.
///
/// All methods are optional.
#[expect(unused_variables)]
pub trait EventHandler {
    /// The export archive of the image has been requested.
    fn export_started(&self, image_id: &str) {}

    /// The engine didn't report its version. Archives are read with the
    /// legacy layout.
    fn engine_version_unavailable(&self, cause: &dyn Display) {}

    /// An entry of the export archive is going to be read as a layer.
    fn layer_start(&self, name: &str, payload: LayerPayload) {}

    /// A layer was fully read. `files` is the number of records found
    /// in it.
    fn layer_finished(&self, name: &str, files: usize) {}

    /// A layer could not be read, and its files are not included in
    /// the listing.
    fn layer_skipped(&self, name: &str, cause: &dyn Display) {}

    /// An entry of a layer was ignored because its path is the root
    /// directory.
    fn entry_skipped(&self, path: &str) {}

    /// The export archive could not be read after this point. Files in
    /// the remaining layers are not included in the listing.
    fn export_read_failed(&self, cause: &dyn Display) {}

    /// The listing is ready.
    ///
    /// `records` is the number of unique paths, and `skipped_layers` the
    /// number of layers that could not be read.
    fn listing_finished(&self, records: usize, skipped_layers: usize) {}
}

/// [`EventHandler`] instance to ignore all events.
pub struct NoEventHandler;

impl EventHandler for NoEventHandler {}

impl<E: EventHandler + ?Sized> EventHandler for &E {
    fn export_started(&self, image_id: &str) {
        (**self).export_started(image_id)
    }

    fn engine_version_unavailable(&self, cause: &dyn Display) {
        (**self).engine_version_unavailable(cause)
    }

    fn layer_start(&self, name: &str, payload: LayerPayload) {
        (**self).layer_start(name, payload)
    }

    fn layer_finished(&self, name: &str, files: usize) {
        (**self).layer_finished(name, files)
    }

    fn layer_skipped(&self, name: &str, cause: &dyn Display) {
        (**self).layer_skipped(name, cause)
    }

    fn entry_skipped(&self, path: &str) {
        (**self).entry_skipped(path)
    }

    fn export_read_failed(&self, cause: &dyn Display) {
        (**self).export_read_failed(cause)
    }

    fn listing_finished(&self, records: usize, skipped_layers: usize) {
        (**self).listing_finished(records, skipped_layers)
    }
}
