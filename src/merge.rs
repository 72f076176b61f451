//! Merge the records of all layers in a single listing.
//!
//! Records are sorted with directories first, and then by path. When
//! multiple layers contain the same path, only the first record after
//! sorting is kept. The sort is stable, so records with the same path
//! and type keep the order in which the layers were read.

use std::{cmp::Ordering, collections::HashSet};

use crate::FileRecord;

/// Files of an image.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Listing {
    /// Unique records, with directories first.
    pub records: Vec<FileRecord>,

    /// Paths of `records`, in the same order.
    pub paths: Vec<String>,
}

/// Order used in the listing: directories before any other kind of
/// entry, then ascending by path.
pub fn listing_order(a: &FileRecord, b: &FileRecord) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.path.cmp(&b.path))
}

/// Sort `records` with [`listing_order`].
pub fn sort_records(records: &mut [FileRecord]) {
    records.sort_by(listing_order);
}

/// Remove records with a path seen in a previous record.
pub fn dedup_records(records: Vec<FileRecord>) -> Listing {
    let mut seen = HashSet::with_capacity(records.len());
    let mut listing = Listing {
        records: Vec::with_capacity(records.len()),
        paths: Vec::with_capacity(records.len()),
    };

    for record in records {
        if seen.insert(record.path.clone()) {
            listing.paths.push(record.path.clone());
            listing.records.push(record);
        }
    }

    listing
}

/// Sort and deduplicate the records collected from the layers.
pub fn merge(mut records: Vec<FileRecord>) -> Listing {
    sort_records(&mut records);
    dedup_records(records)
}

#[cfg(test)]
fn record(path: &str, is_directory: bool, size: u64) -> FileRecord {
    FileRecord {
        path: path.into(),
        name: path.into(),
        mode: 0o644,
        mode_string: String::new(),
        modified_at: 0,
        size,
        owner: "0".into(),
        group: "0".into(),
        link_target: None,
        is_directory,
        is_symlink: false,
        change: Default::default(),
    }
}

#[test]
fn directories_first() {
    let listing = merge(vec![
        record("/etc/passwd", false, 10),
        record("/etc", true, 0),
        record("/etc/passwd", false, 20),
        record("/var", true, 0),
    ]);

    assert_eq!(listing.paths, ["/etc", "/var", "/etc/passwd"]);
    assert_eq!(listing.records.len(), 3);

    // First record of the sequence is kept.
    assert_eq!(listing.records[2].size, 10);
}

#[test]
fn directory_wins_over_file() {
    let listing = merge(vec![record("/opt/x", false, 1), record("/opt/x", true, 0)]);

    assert_eq!(listing.paths, ["/opt/x"]);
    assert!(listing.records[0].is_directory);
}

#[test]
fn sorted_partitions() {
    let paths = ["/b/z", "/a", "/c/", "/b", "/a/b/c", "/0"];
    let records = paths
        .iter()
        .enumerate()
        .map(|(i, p)| record(p, i % 2 == 0, 0))
        .collect();

    let listing = merge(records);

    let dirs: Vec<_> = listing.records.iter().take_while(|r| r.is_directory).collect();
    let files: Vec<_> = listing.records.iter().skip(dirs.len()).collect();

    assert!(files.iter().all(|r| !r.is_directory));
    assert!(dirs.windows(2).all(|w| w[0].path <= w[1].path));
    assert!(files.windows(2).all(|w| w[0].path <= w[1].path));
    assert_eq!(listing.paths.len(), paths.len());
}

#[test]
fn empty_listing() {
    assert_eq!(merge(Vec::new()), Listing::default());
}
