use std::{fmt, io::Write, path::Path};

use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Compression {
    None,
    Gzip,

    #[cfg(feature = "zstd")]
    Zstd,
}

/// Layer archive, with the digest of its uncompressed contents.
#[derive(Debug)]
pub struct Layer {
    pub compression: Compression,
    pub digest: String,
    pub data: Box<[u8]>,
}

impl Layer {
    /// Return a builder to create a layer.
    pub fn archive(compression: Compression) -> LayerArchive {
        LayerArchive {
            compression,
            archive: tar::Builder::new(Vec::with_capacity(4096)),
        }
    }

    /// Layer digest, as reported by the engine (`sha256:...`).
    pub fn layer_id(&self) -> String {
        format!("sha256:{}", self.digest)
    }

    pub fn blob_path(&self) -> String {
        format!("blobs/sha256/{}", self.digest)
    }

    /// Entry name for this layer in the legacy layout.
    pub fn legacy_path(&self) -> String {
        match self.compression {
            Compression::None => format!("{}/layer.tar", self.digest),
            Compression::Gzip => format!("{}/layer.tar.gz", self.digest),

            #[cfg(feature = "zstd")]
            Compression::Zstd => format!("{}/layer.tar.zst", self.digest),
        }
    }
}

pub struct LayerArchive {
    compression: Compression,
    archive: tar::Builder<Vec<u8>>,
}

impl LayerArchive {
    pub fn build(self) -> Layer {
        let tarball = self.archive.into_inner().unwrap();

        let mut hasher = Sha256::new();
        hasher.update(&tarball);
        let digest = HexString(hasher.finalize()).to_string();

        let data = match self.compression {
            Compression::None => tarball,
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Default::default());
                encoder.write_all(&tarball).unwrap();
                encoder.finish().unwrap()
            }

            #[cfg(feature = "zstd")]
            Compression::Zstd => zstd::stream::encode_all(&tarball[..], 0).unwrap(),
        };

        Layer {
            compression: self.compression,
            digest,
            data: data.into(),
        }
    }

    pub fn directory(mut self, path: impl AsRef<Path>) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::dir());
        header.set_size(0);
        header.set_cksum();
        self.archive.append(&header, &b""[..]).unwrap();
        self
    }

    pub fn regular(mut self, path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> Self {
        let data = data.as_ref();
        let mut header = tar::Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::file());
        header.set_size(data.len() as u64);
        header.set_cksum();
        self.archive.append(&header, data).unwrap();
        self
    }

    pub fn symlink(mut self, path: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o777);
        header.set_entry_type(tar::EntryType::symlink());
        header.set_size(0);
        self.archive.append_link(&mut header, path, target).unwrap();
        self
    }

    /// Add a PAX global header, which is not a file.
    pub fn global_header(mut self) -> Self {
        let mut header = tar::Header::new_ustar();
        header.set_path("pax_global_header").unwrap();
        header.set_entry_type(tar::EntryType::XGlobalHeader);
        header.set_size(0);
        header.set_cksum();
        self.archive.append(&header, &b""[..]).unwrap();
        self
    }
}

/// Builder for the archive generated when an image is exported.
pub struct ExportArchive {
    archive: tar::Builder<Vec<u8>>,
}

impl ExportArchive {
    pub fn new() -> Self {
        ExportArchive {
            archive: tar::Builder::new(Vec::new()),
        }
    }

    pub fn entry(mut self, name: &str, data: impl AsRef<[u8]>) -> Self {
        let data = data.as_ref();
        let mut header = tar::Header::new_ustar();
        header.set_mode(0o644);
        header.set_size(data.len() as u64);
        self.archive.append_data(&mut header, name, data).unwrap();
        self
    }

    /// Add a layer with the layout used before version 25.
    pub fn legacy_layer(self, layer: &Layer) -> Self {
        let name = layer.legacy_path();
        self.entry(&name, &layer.data)
    }

    /// Add a layer with the OCI layout, used since version 25.
    pub fn blob_layer(self, layer: &Layer) -> Self {
        let name = layer.blob_path();
        self.entry(&name, &layer.data)
    }

    pub fn build(self) -> Vec<u8> {
        self.archive.into_inner().unwrap()
    }
}

/// Encode a byte buffer as hex string.
struct HexString<T>(T);

impl<T: AsRef<[u8]>> fmt::Display for HexString<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .as_ref()
            .iter()
            .try_for_each(|byte| write!(f, "{:02x}", byte))
    }
}
