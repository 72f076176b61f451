use std::path::{Component, Path};

/// Convert a path from an archive entry to an absolute path inside
/// the image.
///
/// `.` components are removed, and `..` components are resolved
/// lexically. A `..` at the root stays at the root, so the result is
/// never outside `/`.
///
/// Returns `None` if the path collapses to the root directory.
///
/// # Examples
///
/// ```
/// # use image_files::normalize_path;
/// assert_eq!(normalize_path("./etc/passwd").as_deref(), Some("/etc/passwd"));
/// assert_eq!(normalize_path("usr/lib/../bin/").as_deref(), Some("/usr/bin"));
/// assert_eq!(normalize_path("./"), None);
/// ```
pub fn normalize_path<T: AsRef<Path>>(path: T) -> Option<String> {
    let mut parts = Vec::new();

    // Similar to `tar::Entry::unpack_in`.
    for component in path.as_ref().components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::CurDir => continue,

            Component::ParentDir => {
                parts.pop();
            }

            Component::Normal(part) => parts.push(part.to_string_lossy()),
        }
    }

    if parts.is_empty() {
        return None;
    }

    let mut normalized = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for part in &parts {
        normalized.push('/');
        normalized.push_str(part);
    }

    Some(normalized)
}

#[test]
fn normalize_entry_names() {
    let cases = [
        ("etc/passwd", Some("/etc/passwd")),
        ("/etc/passwd", Some("/etc/passwd")),
        ("./etc/", Some("/etc")),
        ("a/../b", Some("/b")),
        ("a/./b//c", Some("/a/b/c")),
        ("../../x", Some("/x")),
        ("a/b/../../..", None),
        (".", None),
        ("./", None),
        ("/", None),
    ];

    for (input, expected) in cases {
        assert_eq!(normalize_path(input).as_deref(), expected, "{input:?}");
    }
}
