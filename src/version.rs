//! Version numbers reported by a container engine.
//!
//! Engines don't always report strict semantic versions (`25`, `20.10.24+dfsg1`,
//! `26.0.0-rc.2`), so the parser accepts any number of numeric segments.
//! Missing segments compare as `0`, and a pre-release sorts before the
//! release with the same segments.

use std::{cmp::Ordering, fmt, str::FromStr};

/// Parsed engine version.
///
/// # Examples
///
/// ```
/// # use image_files::EngineVersion;
/// let version: EngineVersion = "25.0.3".parse().unwrap();
/// assert!(version >= EngineVersion::new(&[25]));
///
/// let version: EngineVersion = "25.0.0-rc.1".parse().unwrap();
/// assert!(version < EngineVersion::new(&[25]));
/// ```
#[derive(Clone, Debug, Eq)]
pub struct EngineVersion {
    segments: Vec<u64>,
    pre_release: Option<String>,
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("Invalid version: {0:?}")]
pub struct InvalidVersion(pub String);

impl EngineVersion {
    pub fn new(segments: &[u64]) -> Self {
        EngineVersion {
            segments: segments.to_vec(),
            pre_release: None,
        }
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }

    fn segment(&self, index: usize) -> u64 {
        self.segments.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for EngineVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidVersion(s.to_owned());

        let version = s.trim();
        let version = version.strip_prefix('v').unwrap_or(version);

        // Build metadata is ignored.
        let version = match version.split_once('+') {
            Some((v, _)) => v,
            None => version,
        };

        let (core, pre_release) = match version.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_owned())),
            Some(_) => return Err(invalid()),
            None => (version, None),
        };

        let segments = core
            .split('.')
            .map(|segment| segment.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EngineVersion {
            segments,
            pre_release,
        })
    }
}

impl Ord for EngineVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());

        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for EngineVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EngineVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }

        if let Some(pre) = &self.pre_release {
            write!(f, "-{pre}")?;
        }

        Ok(())
    }
}

/// Check if `version` is, at least, `minimum`.
///
/// Versions that can't be parsed never satisfy the requirement.
pub(crate) fn at_least(version: &str, minimum: &EngineVersion) -> bool {
    match EngineVersion::from_str(version) {
        Ok(v) => v >= *minimum,
        Err(_) => false,
    }
}

#[test]
fn parse_versions() {
    let v: EngineVersion = "25.0.3".parse().unwrap();
    assert_eq!(v.segments(), &[25, 0, 3]);
    assert_eq!(v.pre_release(), None);

    let v: EngineVersion = "v26.1.0-rc.2".parse().unwrap();
    assert_eq!(v.segments(), &[26, 1, 0]);
    assert_eq!(v.pre_release(), Some("rc.2"));
    assert_eq!(v.to_string(), "26.1.0-rc.2");

    let v: EngineVersion = "20.10.24+dfsg1".parse().unwrap();
    assert_eq!(v.segments(), &[20, 10, 24]);

    for invalid in ["", "dev", "25.x", "25.0-", "."] {
        assert!(invalid.parse::<EngineVersion>().is_err(), "{invalid:?}");
    }
}

#[test]
fn compare_versions() {
    let minimum = EngineVersion::new(&[25]);

    assert!(at_least("25", &minimum));
    assert!(at_least("25.0.0", &minimum));
    assert!(at_least("27.3.1", &minimum));
    assert!(at_least("100", &minimum));

    assert!(!at_least("24.0.0", &minimum));
    assert!(!at_least("24.99.99", &minimum));
    assert!(!at_least("25.0.0-beta.1", &minimum));
    assert!(!at_least("", &minimum));
    assert!(!at_least("unknown", &minimum));

    assert_eq!(
        "25.0".parse::<EngineVersion>().unwrap(),
        "25.0.0".parse::<EngineVersion>().unwrap()
    );
}
