//! Failures of a build task, and the non-fatal pattern mismatch warning.

#[derive(Debug)]
pub(crate) enum BuildError {
    /// A declared source file does not exist.
    MissingSource(PathBuf),
    /// An artifact could not be written.
    Write(PathBuf, io::Error),
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource(path) => write!(f, "source `{}` does not exist", path.display()),
            Self::Write(path, _) => write!(f, "couldn't write artifact to `{}`", path.display()),
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingSource(_) => None,
            Self::Write(_, e) => Some(e),
        }
    }
}

/// A rewrite step found nothing to rewrite. The content is passed through unchanged.
#[derive(Debug)]
pub(crate) struct PatternMismatch<'a> {
    pub step: &'static str,
    pub path: &'a Path,
}

impl Display for PatternMismatch<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: pattern did not match in `{}`, leaving it unchanged",
            self.step,
            self.path.display()
        )
    }
}

impl Error for PatternMismatch<'_> {}

/// Find the [`BuildError`] at the root of an error chain, if any.
pub(crate) fn build_error(e: &anyhow::Error) -> Option<&BuildError> {
    e.chain().find_map(|cause| cause.downcast_ref())
}

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::io;
use std::path::Path;
use std::path::PathBuf;
