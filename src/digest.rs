use std::fmt;

/// Algorithm used to compute a layer digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DigestAlgorithm {
    SHA256,
    SHA512,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::SHA256 => "sha256",
            DigestAlgorithm::SHA512 => "sha512",
        }
    }
}

/// Content digest of a layer, as reported by the image metadata.
///
/// It contains the algorithm (like `SHA256`) and its value as a
/// hexadecimal string.
///
/// # Examples
///
/// ```
/// # use image_files::*;
/// const DIGEST: &str = "123456789012345678901234567890123456789012345678901234567890abcd";
///
/// let digest = Digest::try_from(format!("sha256:{}", DIGEST)).unwrap();
/// assert_eq!(digest.algorithm(), DigestAlgorithm::SHA256);
/// assert_eq!(digest.hash_value(), DIGEST);
/// assert_eq!(digest.blob_path(), format!("blobs/sha256/{}", DIGEST));
/// assert_eq!(digest.to_string(), format!("sha256:{}", DIGEST));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Digest {
    hash: String,
    algorithm: DigestAlgorithm,
}

/// Errors from the digest parser.
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    #[error("Invalid digest algorithm.")]
    InvalidAlgorithm,

    #[error("Invalid digest value.")]
    InvalidValue,
}

impl Digest {
    pub fn hash_value(&self) -> &str {
        self.hash
            .split_once(':')
            .map(|(_, h)| h)
            .unwrap_or_default()
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Path of the layer blob inside an export archive that uses the
    /// OCI image layout.
    pub fn blob_path(&self) -> String {
        format!("blobs/{}/{}", self.algorithm.as_str(), self.hash_value())
    }
}

impl TryFrom<String> for Digest {
    type Error = DigestError;

    fn try_from(hash: String) -> Result<Self, Self::Error> {
        let (algorithm, value, expected_size) = {
            if let Some(h) = hash.strip_prefix("sha256:") {
                (DigestAlgorithm::SHA256, h, 256 / 8 * 2)
            } else if let Some(h) = hash.strip_prefix("sha512:") {
                (DigestAlgorithm::SHA512, h, 512 / 8 * 2)
            } else {
                return Err(DigestError::InvalidAlgorithm);
            }
        };

        // Validate that the hash value is a string with the expected length,
        // and it only contains hexadecimal digits.
        if value.len() == expected_size && value.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Digest { hash, algorithm })
        } else {
            Err(DigestError::InvalidValue)
        }
    }
}

impl TryFrom<&str> for Digest {
    type Error = DigestError;

    fn try_from(hash: &str) -> Result<Self, Self::Error> {
        Digest::try_from(hash.to_owned())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash)
    }
}

/// Build the set of blob paths for the layers of an image.
///
/// Digests that can't be parsed are ignored, since they can never
/// match an entry of the archive.
pub(crate) fn blob_paths<I, S>(layers: I) -> std::collections::HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    layers
        .into_iter()
        .filter_map(|layer| Digest::try_from(layer.as_ref()).ok())
        .map(|digest| digest.blob_path())
        .collect()
}

#[test]
fn reject_invalid_digest() {
    assert!(matches!(
        Digest::try_from("md5:0123"),
        Err(DigestError::InvalidAlgorithm)
    ));

    assert!(matches!(
        Digest::try_from("sha256:0123"),
        Err(DigestError::InvalidValue)
    ));

    let not_hex = format!("sha256:{}", "z".repeat(64));
    assert!(matches!(
        Digest::try_from(not_hex),
        Err(DigestError::InvalidValue)
    ));
}

#[test]
fn blob_paths_from_layers() {
    let a = "a".repeat(64);
    let b = "b".repeat(128);

    let paths = blob_paths([
        format!("sha256:{a}"),
        format!("sha512:{b}"),
        "sha256:short".to_owned(),
    ]);

    assert_eq!(paths.len(), 2);
    assert!(paths.contains(&format!("blobs/sha256/{a}")));
    assert!(paths.contains(&format!("blobs/sha512/{b}")));
}
