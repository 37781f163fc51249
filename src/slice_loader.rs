use crate::{
    decode::{DecodeError, DicomDecoder, SliceDecoder},
    slice::SliceSequence,
    source::{SourceEntry, read_directory},
};

use rayon::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SliceStoreError {
    #[error("No decodable slices among {attempted} entries")]
    NoDecodableSlices { attempted: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An entry the store could not decode.
#[derive(Debug)]
pub struct SkippedEntry {
    pub name: String,
    pub error: DecodeError,
}

/// Result of a best-effort load: the surviving slices and why the rest were
/// dropped.
#[derive(Debug)]
pub struct LoadReport {
    pub sequence: SliceSequence,
    pub skipped: Vec<SkippedEntry>,
}

pub struct SliceStore;

impl SliceStore {
    /// Decode `entries` and order the survivors by instance number.
    ///
    /// Entries are decoded in the order given, which acts as the tiebreak for
    /// equal instance numbers. Undecodable entries are recorded in
    /// [`LoadReport::skipped`] instead of failing the load.
    ///
    /// # Errors
    ///
    /// Returns [`SliceStoreError::NoDecodableSlices`] if nothing decodes
    pub fn load<D>(entries: &[SourceEntry], decoder: &D) -> Result<LoadReport, SliceStoreError>
    where
        D: SliceDecoder + Sync,
    {
        let decoded: Vec<_> = entries
            .par_iter()
            .map(|entry| (entry, decoder.decode_slice(&entry.name, &entry.bytes)))
            .collect();

        let mut slices = Vec::with_capacity(decoded.len());
        let mut skipped = Vec::new();
        for (entry, result) in decoded {
            match result {
                Ok(slice) => slices.push(slice),
                Err(error) => {
                    log::warn!("Skipping slice {}: {error}", entry.name);
                    skipped.push(SkippedEntry {
                        name: entry.name.clone(),
                        error,
                    });
                }
            }
        }

        if slices.is_empty() {
            return Err(SliceStoreError::NoDecodableSlices {
                attempted: entries.len(),
            });
        }

        let sequence = SliceSequence::new(slices);
        log::info!(
            "Loaded {} slices ({} skipped)",
            sequence.len(),
            skipped.len()
        );
        Ok(LoadReport { sequence, skipped })
    }

    /// Load every file of a directory as a DICOM slice, in file name order
    pub fn load_from_directory(path: impl AsRef<Path>) -> Result<LoadReport, SliceStoreError> {
        let entries = read_directory(path.as_ref())?;
        Self::load(&entries, &DicomDecoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dicom_bytes, instance_number};
    use std::fs;

    fn slice_entry(name: &str, instance: i64) -> SourceEntry {
        SourceEntry::new(
            name,
            dicom_bytes(1, 1, vec![instance as u16], vec![instance_number(instance)]),
        )
    }

    #[test]
    fn skips_corrupt_entries_and_sorts_by_instance_number() {
        let entries = vec![
            slice_entry("a", 9),
            SourceEntry::new("b", b"corrupt".to_vec()),
            slice_entry("c", 2),
        ];

        let report = SliceStore::load(&entries, &DicomDecoder).expect("load");
        let names: Vec<_> = report.sequence.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["c", "a"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "b");
    }

    #[test]
    fn nothing_decodable_is_fatal() {
        let entries = vec![SourceEntry::new("x", b"nope".to_vec())];
        let err = SliceStore::load(&entries, &DicomDecoder).expect_err("must fail");
        assert!(matches!(err, SliceStoreError::NoDecodableSlices { attempted: 1 }));

        let err = SliceStore::load(&[], &DicomDecoder).expect_err("must fail");
        assert!(matches!(err, SliceStoreError::NoDecodableSlices { attempted: 0 }));
    }

    #[test]
    fn equal_instance_numbers_keep_name_order_from_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, instance) in [("03", 1), ("01", 1), ("02", 0)] {
            let entry = slice_entry(name, instance);
            fs::write(dir.path().join(name), entry.bytes).expect("write slice");
        }

        let report = SliceStore::load_from_directory(dir.path()).expect("load");
        let names: Vec<_> = report.sequence.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["02", "01", "03"]);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SliceStore::load_from_directory(dir.path().join("absent")).expect_err("io");
        assert!(matches!(err, SliceStoreError::Io(_)));
    }
}
