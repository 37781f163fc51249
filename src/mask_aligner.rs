use crate::{
    decode::{DecodeError, DicomDecoder, MaskDecoder},
    slice::{MaskImage, SliceSequence},
    source::{SourceEntry, read_directory},
};

use std::{collections::HashMap, fmt, path::Path};
use thiserror::Error;

/// Parse a mask file name into a slice identifier.
///
/// Exporters disagree on the radix, so the name is read as decimal first
/// and as hexadecimal (optionally `0x`-prefixed) second.
pub fn parse_mask_identifier(name: &str) -> Option<i64> {
    let name = name.trim();
    if let Ok(decimal) = name.parse::<i64>() {
        return Some(decimal);
    }

    let (negative, digits) = match name.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, name.strip_prefix('+').unwrap_or(name)),
    };
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let value = i64::from_str_radix(digits, 16).ok()?;
    Some(if negative { -value } else { value })
}

#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("hidden file")]
    Hidden,
    #[error("name is neither a decimal nor a hexadecimal identifier")]
    UnparseableName,
    #[error("no slice with identifier {identifier}")]
    NoMatchingSlice { identifier: i64 },
    #[error("could not decode mask: {0}")]
    Undecodable(DecodeError),
    /// A later entry claimed the same slice.
    #[error("replaced by {by} at slice index {index}")]
    Superseded { index: usize, by: String },
}

#[derive(Debug)]
pub struct SkippedMask {
    pub name: String,
    pub reason: SkipReason,
}

/// Fewer masks than slices were aligned. Not an error: plain viewing still
/// works, but modes that need a mask on every frame should be disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMismatchWarning {
    pub slices: usize,
    pub masks: usize,
}

impl fmt::Display for CountMismatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} masks aligned to {} slices",
            self.masks, self.slices
        )
    }
}

/// Masks placed at the index of their slice. Always exactly one slot per
/// slice; slots without a mask stay `None`.
#[derive(Debug, Default)]
pub struct MaskAlignment {
    masks: Vec<Option<MaskImage>>,
    pub skipped: Vec<SkippedMask>,
}

impl MaskAlignment {
    pub fn dense(&self) -> &[Option<MaskImage>] {
        &self.masks
    }

    pub fn into_dense(self) -> Vec<Option<MaskImage>> {
        self.masks
    }

    pub fn into_parts(self) -> (Vec<Option<MaskImage>>, Vec<SkippedMask>) {
        (self.masks, self.skipped)
    }

    /// Only the present masks, in slice order. Index parity with the slices
    /// is lost.
    pub fn compacted(&self) -> Vec<&MaskImage> {
        self.masks.iter().flatten().collect()
    }

    pub fn matched_count(&self) -> usize {
        self.masks.iter().flatten().count()
    }

    pub fn count_mismatch(&self) -> Option<CountMismatchWarning> {
        let masks = self.matched_count();
        (masks != self.masks.len()).then_some(CountMismatchWarning {
            slices: self.masks.len(),
            masks,
        })
    }
}

pub struct MaskAligner;

impl MaskAligner {
    /// Place each mask entry at the index of the slice whose identifier its
    /// name encodes.
    ///
    /// Entries are processed in the order given. When two entries resolve to
    /// the same slice the later one wins; when two slices share an
    /// identifier the later slice receives the mask.
    pub fn align<D: MaskDecoder>(
        slices: &SliceSequence,
        entries: &[SourceEntry],
        decoder: &D,
    ) -> MaskAlignment {
        let lookup: HashMap<i64, usize> = (0..slices.len())
            .filter_map(|index| Some((slices.match_key(index)?, index)))
            .collect();

        let mut masks: Vec<Option<MaskImage>> = vec![None; slices.len()];
        let mut skipped = Vec::new();
        let mut skip = |name: &str, reason: SkipReason| {
            match reason {
                SkipReason::Hidden => log::debug!("Skipping hidden mask entry {name}"),
                _ => log::warn!("Skipping mask {name}: {reason}"),
            }
            skipped.push(SkippedMask {
                name: name.to_owned(),
                reason,
            });
        };

        for entry in entries {
            if entry.is_hidden() {
                skip(&entry.name, SkipReason::Hidden);
                continue;
            }

            let base = Path::new(&entry.name)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(&entry.name);
            let Some(identifier) = parse_mask_identifier(base) else {
                skip(&entry.name, SkipReason::UnparseableName);
                continue;
            };
            let Some(&index) = lookup.get(&identifier) else {
                skip(&entry.name, SkipReason::NoMatchingSlice { identifier });
                continue;
            };

            let pixels = match decoder.decode_mask(&entry.bytes) {
                Ok(pixels) => pixels,
                Err(error) => {
                    skip(&entry.name, SkipReason::Undecodable(error));
                    continue;
                }
            };

            log::debug!("Mask {} -> slice {index}", entry.name);
            let previous = masks[index].replace(MaskImage {
                name: entry.name.clone(),
                source_identifier: identifier,
                pixels,
            });
            if let Some(previous) = previous {
                skip(
                    &previous.name,
                    SkipReason::Superseded {
                        index,
                        by: entry.name.clone(),
                    },
                );
            }
        }

        let alignment = MaskAlignment { masks, skipped };
        log::info!(
            "Aligned {} of {} masks to {} slices",
            alignment.matched_count(),
            entries.len(),
            slices.len()
        );
        if let Some(warning) = alignment.count_mismatch() {
            log::warn!("Mask coverage incomplete: {warning}");
        }
        alignment
    }

    /// Align every file of a directory, decoding with [`DicomDecoder`]
    pub fn align_from_directory(
        slices: &SliceSequence,
        path: impl AsRef<Path>,
    ) -> std::io::Result<MaskAlignment> {
        let entries = read_directory(path)?;
        Ok(Self::align(slices, &entries, &DicomDecoder))
    }
}
