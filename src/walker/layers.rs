use std::{
    fmt,
    io::{self, Read},
};

use flate2::read::GzDecoder;

use crate::{normalize_path, EventHandler, FileRecord};

/// Type of an extended header found in a layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExtendedHeaderKind {
    /// PAX global extended header (`g`).
    Global,

    /// PAX extended header (`x`).
    Local,
}

impl fmt::Display for ExtendedHeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendedHeaderKind::Global => f.write_str("XGlobalHeader, type=g"),
            ExtendedHeaderKind::Local => f.write_str("XHeader, type=x"),
        }
    }
}

pub(super) enum LayerError {
    Io(io::Error),

    ExtendedHeader {
        path: String,
        kind: ExtendedHeaderKind,
    },
}

impl From<io::Error> for LayerError {
    fn from(err: io::Error) -> Self {
        LayerError::Io(err)
    }
}

/// Open a gzip stream.
///
/// The header of the stream is parsed before returning the decoder,
/// so an invalid stream is detected before reading any entry.
pub(super) fn open_gzip<R: Read>(reader: R) -> io::Result<GzDecoder<R>> {
    let mut decoder = GzDecoder::new(reader);

    if decoder.header().is_none() {
        // The decoder keeps the error from the header parser, and
        // returns it in the first read.
        return Err(match decoder.read(&mut [0; 1]) {
            Err(err) => err,
            Ok(_) => io::Error::new(io::ErrorKind::InvalidData, "Missing gzip header."),
        });
    }

    Ok(decoder)
}

/// Collect the files of the layer archive in `reader`.
///
/// The reader is consumed until its end, so checksums of compressed
/// streams are verified even if the archive has trailing data.
pub(super) fn list_layer<R, E>(reader: R, event_handler: &E) -> Result<Vec<FileRecord>, LayerError>
where
    R: Read,
    E: EventHandler,
{
    let mut archive = tar::Archive::new(reader);
    let mut files = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let entry_path = entry.path()?;

        let path = match normalize_path(&entry_path) {
            Some(path) => path,
            None => {
                event_handler.entry_skipped(&entry_path.to_string_lossy());
                continue;
            }
        };

        let kind = match entry.header().entry_type() {
            tar::EntryType::XGlobalHeader => ExtendedHeaderKind::Global,
            tar::EntryType::XHeader => ExtendedHeaderKind::Local,
            _ => {
                files.push(FileRecord::from_entry(path, &entry)?);
                continue;
            }
        };

        return Err(LayerError::ExtendedHeader { path, kind });
    }

    let mut reader = archive.into_inner();
    io::copy(&mut reader, &mut io::sink())?;

    Ok(files)
}
