//! Makefile-like incremental tasks.
//!
//! A task knows when its inputs last changed and how to run. [`Task::writes`] turns that into
//! incremental rebuilds: the task is skipped while every file it writes is newer than its inputs.

pub(crate) trait Task {
    type Output;

    /// Get the latest time at which any input of this task changed.
    fn modified(&self) -> Modified;

    /// Run the task.
    fn run(&self) -> Self::Output;

    fn map<O, F: Fn(Self::Output) -> O>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
    {
        Map::new(self, f)
    }

    /// Declare the files this task writes, so that running it is skipped while all of them are
    /// newer than both the task's inputs and the running executable.
    fn writes<P: AsRef<Path>>(self, outputs: Vec<P>) -> Writes<Self, P>
    where
        Self: Task<Output = anyhow::Result<()>> + Sized,
    {
        Writes::new(self, outputs)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub(crate) enum Modified {
    Never,
    At(SystemTime),
    /// A file the task reads does not exist. Newer than any output, so the task always runs and
    /// gets to report it.
    Missing,
}

impl Modified {
    pub(crate) fn path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .metadata()
            .and_then(|meta| meta.modified())
            .map(Self::At)
            .ok()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Map<T, F> {
    task: T,
    f: F,
}
impl<T, F> Map<T, F> {
    fn new(task: T, f: F) -> Self {
        Self { task, f }
    }
}
impl<T: Task, F: Fn(T::Output) -> O, O> Task for Map<T, F> {
    type Output = O;

    fn modified(&self) -> Modified {
        self.task.modified()
    }
    fn run(&self) -> Self::Output {
        (self.f)(self.task.run())
    }
}

static EXE_MODIFIED: Lazy<Modified> = Lazy::new(|| {
    env::current_exe()
        .ok()
        .and_then(Modified::path)
        .unwrap_or_else(|| Modified::At(SystemTime::now()))
});

pub(crate) struct Writes<T, P> {
    task: T,
    outputs: Vec<P>,
}
impl<T, P> Writes<T, P> {
    fn new(task: T, outputs: Vec<P>) -> Self {
        Self { task, outputs }
    }
}
impl<T, P: AsRef<Path>> Task for Writes<T, P>
where
    T: Task<Output = anyhow::Result<()>>,
{
    type Output = anyhow::Result<()>;

    /// The modification time of the oldest output, or `Never` if any is missing.
    fn modified(&self) -> Modified {
        self.outputs
            .iter()
            .map(|path| Modified::path(path).unwrap_or(Modified::Never))
            .min()
            .unwrap_or(Modified::Never)
    }
    fn run(&self) -> Self::Output {
        let built = self.modified();
        if self.task.modified() < built && *EXE_MODIFIED < built {
            if let Some(first) = self.outputs.first() {
                log::debug!("`{}` is up to date", first.as_ref().display());
            }
            return Ok(());
        }
        self.task.run()
    }
}

impl<T: Task + ?Sized> Task for Box<T> {
    type Output = T::Output;

    fn modified(&self) -> Modified {
        (**self).modified()
    }
    fn run(&self) -> Self::Output {
        (**self).run()
    }
}

/// Combine several tasks into one that runs them in order and changes whenever any of them does.
pub(crate) fn all<T: Task>(tasks: Vec<T>) -> All<T> {
    All(tasks)
}

pub(crate) struct All<T>(Vec<T>);

impl<T: Task> Task for All<T> {
    type Output = Box<[T::Output]>;

    fn modified(&self) -> Modified {
        self.0.iter().map(T::modified).max().unwrap_or(Modified::Never)
    }
    fn run(&self) -> Self::Output {
        self.0.iter().map(T::run).collect()
    }
}

/// No-op task that sources its modification time from a path on the filesystem.
///
/// The path must exist: a missing one is [`Modified::Missing`].
pub(crate) struct FsPath<P> {
    path: P,
}
impl<P: AsRef<Path>> FsPath<P> {
    pub(crate) fn new(path: P) -> Self {
        Self { path }
    }
}
impl<P: AsRef<Path>> Task for FsPath<P> {
    type Output = ();

    fn modified(&self) -> Modified {
        Modified::path(&self.path).unwrap_or(Modified::Missing)
    }
    fn run(&self) -> Self::Output {}
}

/// No-op task whose modification time is the latest of every file with the given extension
/// anywhere below a directory.
pub(crate) struct Tree<P> {
    root: P,
    extension: &'static str,
}
impl<P: AsRef<Path>> Tree<P> {
    pub(crate) fn new(root: P, extension: &'static str) -> Self {
        Self { root, extension }
    }
}
impl<P: AsRef<Path>> Task for Tree<P> {
    type Output = ();

    fn modified(&self) -> Modified {
        WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension() == Some(self.extension.as_ref()))
            .filter_map(|entry| Modified::path(entry.path()))
            .max()
            .unwrap_or(Modified::Never)
    }
    fn run(&self) -> Self::Output {}
}


use once_cell::sync::Lazy;
use std::env;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;
