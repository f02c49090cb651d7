use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tokio::task::JoinError;

use super::ScanError;

/// EFS allocation granularity.
pub const BLOCK_SIZE: u64 = 4 * 1024;
/// Flat metadata charge per entry.
pub const METADATA_OVERHEAD: u64 = 2 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// Running sums for one subtree: raw bytes and the metered estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeTotals {
    pub real: u64,
    pub billed: u64,
}

impl SizeTotals {
    pub fn add_entry(&mut self, size: u64, kind: EntryKind) {
        self.real = self.real.saturating_add(size);
        let allocated = allocated_size(size);
        self.billed = self.billed.saturating_add(match kind {
            EntryKind::Directory => allocated,
            EntryKind::File => allocated.saturating_add(METADATA_OVERHEAD),
        });
    }
}

/// Data allocation for one entry, rounded up to whole blocks. Empty entries
/// still occupy a metadata slot and are billed as if they held that much.
pub const fn allocated_size(size: u64) -> u64 {
    let effective = if size > 0 { size } else { METADATA_OVERHEAD };
    effective.div_ceil(BLOCK_SIZE).saturating_mul(BLOCK_SIZE)
}

/// Runs [`estimate`] on the blocking pool.
pub async fn calculate_size(path: &Path) -> Result<SizeTotals, ScanError> {
    let owned = path.to_path_buf();
    let joined = tokio::task::spawn_blocking(move || estimate(&owned)).await;
    flatten_join(path.to_path_buf(), joined)
}

/// A walk that never finished has no sums to report, partial or otherwise.
fn flatten_join(
    path: PathBuf,
    joined: Result<Result<SizeTotals, ScanError>, JoinError>,
) -> Result<SizeTotals, ScanError> {
    joined.unwrap_or_else(|source| Err(ScanError::Task { path, source }))
}

/// Walks `root` once, root included, and sums every entry.
///
/// The first walk or metadata error stops the walk; the sums gathered up to
/// that point travel with the returned [`ScanError::Traversal`].
pub fn estimate(root: &Path) -> Result<SizeTotals, ScanError> {
    let mut totals = SizeTotals::default();

    let walker = WalkBuilder::new(root)
        .standard_filters(false) // Count hidden and ignored entries too
        .follow_links(false)
        .build();

    for result in walker {
        // The root is stat'ed through symlinks, matching how it was classified.
        let metadata = result.and_then(|entry| {
            if entry.depth() == 0 {
                fs::metadata(entry.path()).map_err(ignore::Error::from)
            } else {
                entry.metadata()
            }
        });
        let metadata = match metadata {
            Ok(m) => m,
            Err(source) => {
                return Err(ScanError::Traversal {
                    path: root.to_path_buf(),
                    totals,
                    source,
                });
            }
        };

        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        totals.add_entry(metadata.len(), kind);
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn file_totals(size: u64) -> SizeTotals {
        let mut totals = SizeTotals::default();
        totals.add_entry(size, EntryKind::File);
        totals
    }

    #[test]
    fn test_one_byte_file() {
        assert_eq!(file_totals(1), SizeTotals { real: 1, billed: 6144 });
    }

    #[test]
    fn test_exact_block_file() {
        assert_eq!(file_totals(4096).billed, 6144);
    }

    #[test]
    fn test_one_past_block_file() {
        assert_eq!(file_totals(4097).billed, 10240);
    }

    #[test]
    fn test_empty_file_billed_as_metadata() {
        assert_eq!(file_totals(0), SizeTotals { real: 0, billed: 6144 });
    }

    #[test]
    fn test_directory_has_no_surcharge() {
        let mut totals = SizeTotals::default();
        totals.add_entry(96, EntryKind::Directory);
        assert_eq!(totals, SizeTotals { real: 96, billed: 4096 });

        let mut large = SizeTotals::default();
        large.add_entry(4097, EntryKind::Directory);
        assert_eq!(large.billed, 8192);
    }

    #[test]
    fn test_directory_with_empty_file() {
        let mut totals = SizeTotals::default();
        totals.add_entry(4096, EntryKind::Directory);
        totals.add_entry(0, EntryKind::File);
        assert_eq!(totals, SizeTotals { real: 4096, billed: 4096 + 6144 });
    }

    #[test]
    fn test_adding_entries_never_decreases_totals() {
        let sizes = [0, 1, 96, 2048, 4096, 4097, 1 << 20];
        let mut totals = SizeTotals::default();
        for (i, size) in sizes.into_iter().enumerate() {
            let before = totals;
            let kind = if i % 2 == 0 {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            totals.add_entry(size, kind);
            assert!(totals.real >= before.real);
            assert!(totals.billed > before.billed);
            assert!(totals.billed >= totals.real);
        }
    }

    #[test]
    fn test_estimate_single_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("one.bin");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"x").unwrap();

        let totals = estimate(&file_path).unwrap();
        assert_eq!(totals, SizeTotals { real: 1, billed: 6144 });
    }

    #[test]
    fn test_estimate_nested_tree() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("subdir");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("root.txt"), vec![0u8; 4097]).unwrap();
        fs::write(sub.join("empty.txt"), b"").unwrap();
        fs::write(sub.join(".hidden"), b"hidden").unwrap();

        let root_len = fs::metadata(dir.path()).unwrap().len();
        let sub_len = fs::metadata(&sub).unwrap().len();

        let totals = estimate(dir.path()).unwrap();
        assert_eq!(totals.real, root_len + sub_len + 4097 + 6);
        assert_eq!(
            totals.billed,
            allocated_size(root_len) + allocated_size(sub_len) + 10240 + 6144 + 6144
        );
    }

    #[test]
    fn test_estimate_is_repeatable() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
        fs::write(dir.path().join("b.txt"), b"bbbbb").unwrap();

        let first = estimate(dir.path()).unwrap();
        let second = estimate(dir.path()).unwrap();
        assert_eq!(first, second);
        assert!(first.billed >= first.real);
    }

    #[test]
    fn test_estimate_nonexistent_keeps_empty_partial() {
        let err = estimate(Path::new("/nonexistent/path/12345")).unwrap_err();
        assert_eq!(err.partial_totals(), Some(SizeTotals::default()));
    }

    #[cfg(unix)]
    #[test]
    fn test_estimate_through_root_symlink() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("ten.bin"), b"0123456789").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert_eq!(estimate(&link).unwrap(), estimate(&real).unwrap());
    }

    #[tokio::test]
    async fn test_panicked_walk_is_fatal_without_totals() {
        let joined = tokio::task::spawn_blocking(|| -> Result<SizeTotals, ScanError> {
            panic!("walker blew up")
        })
        .await;

        let err = flatten_join(PathBuf::from("/data"), joined).unwrap_err();
        assert!(matches!(err, ScanError::Task { .. }));
        assert_eq!(err.severity(), crate::scanner::Severity::Fatal);
        assert!(err.partial_totals().is_none());
    }

    #[tokio::test]
    async fn test_calculate_size_matches_estimate() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), b"hello").unwrap();

        let totals = calculate_size(dir.path()).await.unwrap();
        assert_eq!(totals, estimate(dir.path()).unwrap());
    }
}
