//! Read the export archive of an image, and collect the files of
//! every layer found in it.

mod layers;

use std::{collections::HashSet, fmt, io::Read};

use crate::{
    version::{self, EngineVersion},
    EventHandler, FileRecord, ListError,
};

pub use layers::ExtendedHeaderKind;

use layers::{list_layer, open_gzip, LayerError};

/// First engine version (`25`) that exports images with the OCI layout,
/// where layers are stored as `blobs/<algorithm>/<hash>`.
const BLOB_LAYOUT_VERSION: u64 = 25;

/// How to read an entry of the export archive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayerPayload {
    /// Uncompressed layer stored as a blob (`blobs/sha256/...`).
    BlobTar,

    /// Uncompressed layer (`*.tar`).
    Tar,

    /// Layer compressed with gzip (`*.tar.gz` or `*.tgz`).
    TarGzip,

    /// Layer compressed with zstd (`*.tar.zst`).
    #[cfg(feature = "zstd")]
    TarZstd,

    /// The entry is not a layer, like the manifest or the image
    /// configuration.
    NotALayer,
}

impl fmt::Display for LayerPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayerPayload::BlobTar => "blob",
            LayerPayload::Tar => "tar",
            LayerPayload::TarGzip => "tar+gzip",
            #[cfg(feature = "zstd")]
            LayerPayload::TarZstd => "tar+zstd",
            LayerPayload::NotALayer => "not a layer",
        })
    }
}

/// Decide how to read the entry `name` of the export archive.
///
/// `blob_paths` contains the paths of the layer blobs of the image
/// (see [`Digest::blob_path`](crate::Digest::blob_path)). They are
/// only used if `engine_version` is `25` or newer.
///
/// # Examples
///
/// ```
/// # use std::collections::HashSet;
/// # use image_files::{classify, LayerPayload};
/// let blob = format!("blobs/sha256/{}", "a".repeat(64));
/// let blobs = HashSet::from([blob.clone()]);
///
/// assert_eq!(classify("25.0.0", &blob, &blobs), LayerPayload::BlobTar);
/// assert_eq!(classify("24.0.0", &blob, &blobs), LayerPayload::NotALayer);
/// assert_eq!(classify("24.0.0", "abc/layer.tar", &blobs), LayerPayload::Tar);
/// ```
pub fn classify(engine_version: &str, name: &str, blob_paths: &HashSet<String>) -> LayerPayload {
    classify_entry(blob_layout(Some(engine_version)), name, blob_paths)
}

fn blob_layout(engine_version: Option<&str>) -> bool {
    let minimum = EngineVersion::new(&[BLOB_LAYOUT_VERSION]);
    engine_version.is_some_and(|v| version::at_least(v, &minimum))
}

fn classify_entry(blob_layout: bool, name: &str, blob_paths: &HashSet<String>) -> LayerPayload {
    if blob_layout && blob_paths.contains(name) {
        return LayerPayload::BlobTar;
    }

    if name.ends_with(".tar") {
        return LayerPayload::Tar;
    }

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        return LayerPayload::TarGzip;
    }

    #[cfg(feature = "zstd")]
    if name.ends_with(".tar.zst") {
        return LayerPayload::TarZstd;
    }

    LayerPayload::NotALayer
}

/// Files collected from the layers of an export archive.
#[derive(Debug, Default)]
pub struct Walk {
    /// Records of all layers, in the order they were found.
    pub records: Vec<FileRecord>,

    /// Number of layers that could not be read.
    pub skipped_layers: usize,
}

/// Read the export archive in `export`, and collect the files of
/// every layer.
///
/// A layer that can't be read is skipped, and the walk continues with
/// the next entry. The walk stops at the first error reading the
/// export archive itself.
///
/// The walk fails if a layer contains extended headers, or if a
/// compressed layer has an invalid gzip header.
pub fn walk<R, E>(
    export: R,
    blob_paths: &HashSet<String>,
    engine_version: Option<&str>,
    event_handler: &E,
) -> Result<Walk, ListError>
where
    R: Read,
    E: EventHandler,
{
    let blob_layout = blob_layout(engine_version);

    let mut result = Walk::default();
    let mut archive = tar::Archive::new(export);

    for entry in archive.entries()? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("Stop reading the export archive: {err}");
                event_handler.export_read_failed(&err);
                break;
            }
        };

        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let payload = classify_entry(blob_layout, &name, blob_paths);

        log::trace!("Entry {name}: {payload}");

        let layer = match payload {
            LayerPayload::NotALayer => continue,

            LayerPayload::BlobTar | LayerPayload::Tar => {
                event_handler.layer_start(&name, payload);
                list_layer(entry, event_handler)
            }

            LayerPayload::TarGzip => {
                let decoder = open_gzip(entry).map_err(|source| ListError::Gzip {
                    layer: name.clone(),
                    source,
                })?;

                event_handler.layer_start(&name, payload);
                list_layer(decoder, event_handler)
            }

            #[cfg(feature = "zstd")]
            LayerPayload::TarZstd => {
                event_handler.layer_start(&name, payload);
                match zstd::stream::read::Decoder::new(entry) {
                    Ok(decoder) => list_layer(decoder, event_handler),
                    Err(err) => Err(LayerError::Io(err)),
                }
            }
        };

        match layer {
            Ok(files) => {
                event_handler.layer_finished(&name, files.len());
                result.records.extend(files);
            }

            Err(LayerError::ExtendedHeader { path, kind }) => {
                return Err(ListError::ExtendedHeader {
                    layer: name,
                    path,
                    kind,
                });
            }

            Err(LayerError::Io(err)) => {
                log::debug!("Skip layer {name}: {err}");
                event_handler.layer_skipped(&name, &err);
                result.skipped_layers += 1;
            }
        }
    }

    Ok(result)
}
