//! This module contains many small independent components.

pub(crate) mod rewrite;
pub(crate) mod task;
pub(crate) mod toolchain;

pub(crate) fn log_errors<T>(res: anyhow::Result<T>) -> Option<T> {
    match res {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("{e:?}");
            None
        }
    }
}

/// Write an artifact, creating its parent directories.
pub(crate) fn write_file<P: AsRef<Path>, D: AsRef<[u8]>>(path: P, data: D) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::Write(parent.to_owned(), e))?;
    }
    fs::write(path, data).map_err(|e| BuildError::Write(path.to_owned(), e))?;
    Ok(())
}

use crate::error::BuildError;
use std::fs;
use std::path::Path;
