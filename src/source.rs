use std::{fs, path::Path};

/// One named blob handed to the loaders, usually a file read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceEntry {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Hidden entries follow the dot-prefix convention
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Read every regular file of a directory, sorted by file name.
///
/// Subdirectories and entries whose name is not valid UTF-8 are ignored.
/// Sorting gives a stable pre-sort order independent of the platform's
/// directory enumeration.
pub fn read_directory(path: impl AsRef<Path>) -> std::io::Result<Vec<SourceEntry>> {
    let mut files: Vec<_> = fs::read_dir(path.as_ref())?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_owned();
            Some((name, path))
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    files
        .into_iter()
        .map(|(name, path)| Ok(SourceEntry::new(name, fs::read(&path)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_files_in_name_order_and_skips_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b"), b"second").expect("write b");
        fs::write(dir.path().join("a"), b"first").expect("write a");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");

        let entries = read_directory(dir.path()).expect("read");
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(entries[0].bytes, b"first");
    }

    #[test]
    fn dot_prefixed_names_are_hidden() {
        assert!(SourceEntry::new(".DS_Store", Vec::new()).is_hidden());
        assert!(!SourceEntry::new("12", Vec::new()).is_hidden());
    }
}
