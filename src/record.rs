use std::io::{self, Read};

/// Kind of change that a record represents.
///
/// The listing does not compare layers, so every record is tagged
/// with [`ChangeKind::Default`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    #[default]
    Default,
}

/// A filesystem entry found in a layer of the image.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Absolute and normalized path.
    pub path: String,

    /// Display name. Currently the same as `path`.
    pub name: String,

    /// Permission bits, including SUID/SGID/sticky.
    pub mode: u32,

    /// Permissions rendered like `ls -l` (`drwxr-xr-x`).
    pub mode_string: String,

    /// Modification time, in seconds since the Unix epoch.
    pub modified_at: u64,

    /// Size in bytes. Always `0` for directories and symbolic links.
    pub size: u64,

    pub owner: String,

    pub group: String,

    /// Target of a symbolic link.
    pub link_target: Option<String>,

    pub is_directory: bool,

    pub is_symlink: bool,

    #[serde(rename = "changeKind")]
    pub change: ChangeKind,
}

impl FileRecord {
    /// Build a record from the header of an archive entry.
    ///
    /// `path` must be already normalized.
    pub(crate) fn from_entry<R: Read>(path: String, entry: &tar::Entry<R>) -> io::Result<Self> {
        let header = entry.header();
        let entry_type = header.entry_type();

        let is_directory = entry_type.is_dir();
        let is_symlink = entry_type.is_symlink();

        let fields = header.as_old();
        let mode = numeric_field(&fields.mode, || header.mode())? & 0o7777;

        let link_target = if is_symlink {
            entry
                .link_name()?
                .map(|target| target.to_string_lossy().into_owned())
        } else {
            None
        };

        let size = if is_directory || is_symlink {
            0
        } else {
            entry.size()
        };

        Ok(FileRecord {
            name: path.clone(),
            path,
            mode,
            mode_string: mode_string(mode, entry_type),
            modified_at: numeric_field(&fields.mtime, || header.mtime())?,
            size,
            owner: numeric_field(&fields.uid, || header.uid())?.to_string(),
            group: numeric_field(&fields.gid, || header.gid())?.to_string(),
            link_target,
            is_directory,
            is_symlink,
            change: ChangeKind::Default,
        })
    }
}

/// Read a numeric field of an entry header.
///
/// Some archive writers leave the field empty. A field with only NUL
/// bytes or spaces is read as `0`, and any other value is parsed by
/// `parse`.
fn numeric_field<T: Default>(raw: &[u8], parse: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
    if raw.iter().all(|&byte| byte == 0 || byte == b' ') {
        Ok(T::default())
    } else {
        parse()
    }
}

/// Render permission bits like `ls -l`.
///
/// SUID and SGID are shown as `s` (or `S` if the execute bit is not
/// set), and the sticky bit as `t` (or `T`).
pub fn mode_string(mode: u32, entry_type: tar::EntryType) -> String {
    let kind = match entry_type {
        tar::EntryType::Directory => 'd',
        tar::EntryType::Symlink => 'l',
        tar::EntryType::Char => 'c',
        tar::EntryType::Block => 'b',
        tar::EntryType::Fifo => 'p',
        _ => '-',
    };

    let mut output = String::with_capacity(10);
    output.push(kind);

    // (read, write, execute, special bit, special char)
    let classes = [
        (0o400, 0o200, 0o100, 0o4000, 's'),
        (0o040, 0o020, 0o010, 0o2000, 's'),
        (0o004, 0o002, 0o001, 0o1000, 't'),
    ];

    for (read, write, exec, special, special_char) in classes {
        output.push(if mode & read != 0 { 'r' } else { '-' });
        output.push(if mode & write != 0 { 'w' } else { '-' });
        output.push(match (mode & exec != 0, mode & special != 0) {
            (true, true) => special_char,
            (false, true) => special_char.to_ascii_uppercase(),
            (true, false) => 'x',
            (false, false) => '-',
        });
    }

    output
}

#[test]
fn render_modes() {
    use tar::EntryType;

    assert_eq!(mode_string(0o755, EntryType::Directory), "drwxr-xr-x");
    assert_eq!(mode_string(0o644, EntryType::Regular), "-rw-r--r--");
    assert_eq!(mode_string(0o777, EntryType::Symlink), "lrwxrwxrwx");
    assert_eq!(mode_string(0o4755, EntryType::Regular), "-rwsr-xr-x");
    assert_eq!(mode_string(0o2640, EntryType::Regular), "-rw-r-S---");
    assert_eq!(mode_string(0o1777, EntryType::Directory), "drwxrwxrwt");
    assert_eq!(mode_string(0o1770, EntryType::Directory), "drwxrwx--T");
}

#[test]
fn serialize_record() {
    let record = FileRecord {
        path: "/bin/sh".into(),
        name: "/bin/sh".into(),
        mode: 0o777,
        mode_string: "lrwxrwxrwx".into(),
        modified_at: 1700000000,
        size: 0,
        owner: "0".into(),
        group: "0".into(),
        link_target: Some("busybox".into()),
        is_directory: false,
        is_symlink: true,
        change: ChangeKind::Default,
    };

    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["modeString"], "lrwxrwxrwx");
    assert_eq!(json["modifiedAt"], 1700000000);
    assert_eq!(json["linkTarget"], "busybox");
    assert_eq!(json["isSymlink"], true);
    assert_eq!(json["changeKind"], "default");
}

#[cfg(test)]
fn record_from_header(header: &tar::Header) -> io::Result<FileRecord> {
    let mut builder = tar::Builder::new(Vec::new());
    builder.append(header, &b""[..]).unwrap();
    let data = builder.into_inner().unwrap();

    let mut archive = tar::Archive::new(&data[..]);
    let entry = archive.entries().unwrap().next().unwrap().unwrap();
    FileRecord::from_entry("/file".into(), &entry)
}

#[test]
fn blank_numeric_fields() {
    // Only the path, the size and the type are written.
    let mut header = tar::Header::new_gnu();
    header.set_path("file").unwrap();
    header.set_entry_type(tar::EntryType::file());
    header.set_size(0);
    header.as_old_mut().mtime = [b' '; 12];
    header.set_cksum();

    let record = record_from_header(&header).unwrap();
    assert_eq!(record.mode, 0);
    assert_eq!(record.mode_string, "----------");
    assert_eq!(record.modified_at, 0);
    assert_eq!(record.owner, "0");
    assert_eq!(record.group, "0");

    // Non-octal values are still rejected.
    header.as_old_mut().uid[..3].copy_from_slice(b"abc");
    header.set_cksum();
    assert!(record_from_header(&header).is_err());
}
