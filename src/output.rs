use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::SplitConfig;
use crate::generator::QaRecord;
use crate::split::{split_by_field, SplitOutcome};
use crate::{DatasetError, Result};

/// Reads a full (unsplit) QA dataset file.
pub fn load_records(path: &Path) -> Result<Vec<QaRecord>> {
    let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| DatasetError::json(path, e))
}

/// A JSON file written next to its target, not yet renamed into place.
///
/// Dropping it without [`commit`] removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    temp: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Serializes `data` as pretty JSON into a temporary sibling of `target`.
pub fn stage_json<T: Serialize + ?Sized>(target: &Path, data: &T) -> Result<StagedFile> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    let staged = StagedFile {
        target: target.to_path_buf(),
        temp: hidden_sibling(target, "tmp"),
        committed: false,
    };
    let file = File::create(&staged.temp).map_err(|e| DatasetError::io(&staged.temp, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data).map_err(|e| DatasetError::json(&staged.temp, e))?;
    writer.flush().map_err(|e| DatasetError::io(&staged.temp, e))?;
    Ok(staged)
}

// `.<name>.<suffix>` next to `target`
fn hidden_sibling(target: &Path, suffix: &str) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.json".to_string());
    target.with_file_name(format!(".{name}.{suffix}"))
}

/// Renames every staged file into place. Call only once all of them staged cleanly.
///
/// If any rename fails, files already moved are removed again and whatever
/// they replaced is restored, so the targets end up as they were before.
pub fn commit(files: Vec<StagedFile>) -> Result<()> {
    let mut moved: Vec<(StagedFile, Option<PathBuf>)> = Vec::with_capacity(files.len());
    for staged in files {
        match swap_in(&staged) {
            Ok(backup) => moved.push((staged, backup)),
            Err(e) => {
                roll_back(&moved);
                return Err(e);
            }
        }
    }
    for (mut staged, backup) in moved {
        staged.committed = true;
        if let Some(backup) = backup {
            let _ = fs::remove_file(backup);
        }
    }
    Ok(())
}

// moves an existing target aside, then the staged file into place
fn swap_in(staged: &StagedFile) -> Result<Option<PathBuf>> {
    let backup = if staged.target.is_file() {
        let backup = hidden_sibling(&staged.target, "bak");
        fs::rename(&staged.target, &backup).map_err(|e| DatasetError::io(&staged.target, e))?;
        Some(backup)
    } else {
        None
    };
    if let Err(e) = fs::rename(&staged.temp, &staged.target) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, &staged.target);
        }
        return Err(DatasetError::io(&staged.target, e));
    }
    Ok(backup)
}

fn roll_back(moved: &[(StagedFile, Option<PathBuf>)]) {
    for (staged, backup) in moved.iter().rev() {
        let _ = fs::remove_file(&staged.target);
        if let Some(backup) = backup {
            let _ = fs::rename(backup, &staged.target);
        }
    }
}

/// `train.json` and `val.json` next to the full dataset file.
pub fn split_paths(full: &Path) -> (PathBuf, PathBuf) {
    let dir = full.parent().map(Path::to_path_buf).unwrap_or_default();
    (dir.join("train.json"), dir.join("val.json"))
}

/// Writes the full dataset, splits it and writes train/val; all three files or none.
pub fn write_dataset(full: &Path, records: Vec<QaRecord>, config: &SplitConfig) -> Result<SplitOutcome> {
    let (train_path, val_path) = split_paths(full);
    let staged_full = stage_json(full, &records)?;
    let outcome = split_by_field(records, config)?;
    let train = stage_json(&train_path, &outcome.train)?;
    let val = stage_json(&val_path, &outcome.val)?;
    commit(vec![staged_full, train, val])?;
    Ok(outcome)
}

/// Splits an existing full dataset into explicit train/val paths.
pub fn write_split(
    records: Vec<QaRecord>,
    train_path: &Path,
    val_path: &Path,
    config: &SplitConfig,
) -> Result<SplitOutcome> {
    let outcome = split_by_field(records, config)?;
    let train = stage_json(train_path, &outcome.train)?;
    let val = stage_json(val_path, &outcome.val)?;
    commit(vec![train, val])?;
    Ok(outcome)
}
