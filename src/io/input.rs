//! Input discovery and sharding.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::errors::{DiscrimError, Result};

/// Whether a file name marks job bookkeeping rather than data
fn is_ignored_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// Expand input paths into the data files they contain.
///
/// Files given explicitly are always used. Directories are walked
/// recursively; entries whose names start with `_` or `.` are skipped, as are
/// their subtrees. Files found under each directory are sorted by path.
pub fn discover_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(DiscrimError::validation_field(
                format!("input path does not exist: {}", input.display()),
                "inputs",
            ));
        }

        let walker = WalkDir::new(input)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !is_ignored_name(&entry.file_name().to_string_lossy())
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                DiscrimError::validation_field(
                    format!("failed to walk {}: {e}", input.display()),
                    "inputs",
                )
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }

    if files.is_empty() {
        return Err(DiscrimError::validation_field(
            "no input files found",
            "inputs",
        ));
    }

    debug!(files = files.len(), "Discovered input files");
    Ok(files)
}

/// Records read from one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRecords {
    /// Non-blank data lines
    pub records: Vec<String>,
    /// Lines dropped because they are not valid UTF-8
    pub rejected: u64,
}

/// Input cut into map shards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedShards {
    /// Shards in file order
    pub shards: Vec<Vec<String>>,
    /// Lines dropped across all files because they are not valid UTF-8
    pub records_rejected: u64,
}

/// Read one file into non-blank records.
///
/// A line that is not valid UTF-8 is dropped and counted; the rest of the
/// file is still read.
pub fn read_records(path: &Path, skip_header: bool) -> Result<FileRecords> {
    let file = File::open(path)
        .map_err(|e| DiscrimError::io(format!("Failed to open input {}", path.display()), e))?;
    let mut reader = BufReader::new(file);

    let mut output = FileRecords::default();
    let mut buffer = Vec::new();
    let mut line_number = 0usize;
    loop {
        buffer.clear();
        let read = reader.read_until(b'\n', &mut buffer).map_err(|e| {
            DiscrimError::io(format!("Failed to read input {}", path.display()), e)
        })?;
        if read == 0 {
            break;
        }
        line_number += 1;
        if skip_header && line_number == 1 {
            continue;
        }

        let raw = strip_line_ending(&buffer);
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    line = line_number,
                    error = %err,
                    "Skipping record that is not valid UTF-8"
                );
                output.rejected += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        output.records.push(line.to_string());
    }
    Ok(output)
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Load files into map shards of at most `shard_size` records.
///
/// Shards never span two files.
pub fn load_shards(
    files: &[PathBuf],
    shard_size: usize,
    skip_header: bool,
) -> Result<LoadedShards> {
    if shard_size == 0 {
        return Err(DiscrimError::validation_field(
            "shard size must be greater than 0",
            "aggregation.shard_size",
        ));
    }

    let mut loaded = LoadedShards::default();
    for path in files {
        let FileRecords { records, rejected } = read_records(path, skip_header)?;
        debug!(
            path = %path.display(),
            records = records.len(),
            rejected,
            "Loaded input file"
        );
        loaded.records_rejected += rejected;

        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            loaded.shards.push(records.by_ref().take(shard_size).collect());
        }
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_directory_walk_skips_bookkeeping_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "1,a\n").unwrap();
        fs::write(dir.path().join("a.csv"), "2,b\n").unwrap();
        fs::write(dir.path().join("_SUCCESS"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "3,a\n").unwrap();
        fs::create_dir(dir.path().join("_logs")).unwrap();
        fs::write(dir.path().join("_logs").join("x.csv"), "4,a\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.csv"), "5,a\n").unwrap();

        let files = discover_input_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.csv"),
                PathBuf::from("b.csv"),
                PathBuf::from("nested").join("c.csv"),
            ]
        );
    }

    #[test]
    fn test_explicit_file_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("_part");
        fs::write(&path, "1,a\n").unwrap();

        let files = discover_input_files(&[path.clone()]).unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn test_missing_or_empty_inputs_fail() {
        let dir = tempdir().unwrap();
        let err = discover_input_files(&[dir.path().join("nope")]).unwrap_err();
        assert!(format!("{err}").contains("does not exist"));

        let err = discover_input_files(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(format!("{err}").contains("no input files"));
    }

    #[test]
    fn test_shards_respect_size_header_and_blank_lines() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        fs::write(&first, "value,class\n1,a\n\n2,b\n3,a\n").unwrap();
        fs::write(&second, "value,class\n4,b\n").unwrap();

        let loaded = load_shards(&[first, second], 2, true).unwrap();
        assert_eq!(loaded.records_rejected, 0);
        assert_eq!(
            loaded.shards,
            vec![
                vec!["1,a".to_string(), "2,b".to_string()],
                vec!["3,a".to_string()],
                vec!["4,b".to_string()],
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped_and_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, b"1.0,a\n2.0,b\r\n3.0,\xff\xfe\n4.0,a\n").unwrap();

        let loaded = load_shards(&[path.clone()], 10, false).unwrap();
        assert_eq!(loaded.records_rejected, 1);
        assert_eq!(
            loaded.shards,
            vec![vec![
                "1.0,a".to_string(),
                "2.0,b".to_string(),
                "4.0,a".to_string(),
            ]]
        );

        let file = read_records(&path, true).unwrap();
        assert_eq!(file.records, vec!["2.0,b".to_string(), "4.0,a".to_string()]);
        assert_eq!(file.rejected, 1);
    }

    #[test]
    fn test_zero_shard_size_is_rejected() {
        assert!(load_shards(&[], 0, false).is_err());
    }
}
