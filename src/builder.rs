//! Registers build tasks and runs them independently of one another.

pub(crate) struct Builder {
    root: Rc<Path>,
    toolchain: Rc<dyn Toolchain>,
    extra_inputs: Vec<PathBuf>,
    tasks: Vec<Registered>,
}

struct Registered {
    name: &'static str,
    task: anyhow::Result<Box<dyn Task<Output = anyhow::Result<()>>>>,
}

impl Builder {
    /// Every configured path is resolved relative to `root`.
    pub(crate) fn new(root: &Path, toolchain: Rc<dyn Toolchain>) -> Self {
        Self {
            root: Rc::from(root),
            toolchain,
            extra_inputs: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Rebuild every task registered after this call when `path` changes.
    pub(crate) fn input(&mut self, path: PathBuf) -> &mut Self {
        self.extra_inputs.push(path);
        self
    }

    pub(crate) fn register_style_task(&mut self, config: StyleBuildConfig) -> &mut Self {
        let task = style::task(
            self.root.clone(),
            config,
            self.toolchain.clone(),
            &self.extra_inputs,
        )
        .map(|task| -> Box<dyn Task<Output = _>> { Box::new(task) });
        self.tasks.push(Registered {
            name: "style",
            task,
        });
        self
    }

    pub(crate) fn register_script_task(&mut self, config: ScriptBuildConfig) -> &mut Self {
        let task = script::task(
            self.root.clone(),
            config,
            self.toolchain.clone(),
            &self.extra_inputs,
        );
        self.tasks.push(Registered {
            name: "script",
            task: Ok(Box::new(task)),
        });
        self
    }

    /// Run every task in registration order. A failing task never stops the ones after it.
    pub(crate) fn run(&self) -> Report {
        let mut failed = Vec::new();
        for Registered { name, task } in &self.tasks {
            let task = match task {
                Ok(task) => task,
                Err(e) => {
                    log::error!("{name} build could not be set up: {e:?}");
                    failed.push(*name);
                    continue;
                }
            };
            if let Err(e) = task.run() {
                match build_error(&e) {
                    Some(BuildError::MissingSource(_)) => {
                        log::error!("{name} build has missing sources: {e:?}");
                    }
                    _ => log::error!("{name} build failed: {e:?}"),
                }
                failed.push(*name);
            }
        }
        Report {
            total: self.tasks.len(),
            failed,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Report {
    total: usize,
    failed: Vec<&'static str>,
}

impl Report {
    pub(crate) fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn failed(&self) -> &[&'static str] {
        &self.failed
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }
}


use crate::config::ScriptBuildConfig;
use crate::config::StyleBuildConfig;
use crate::error::build_error;
use crate::error::BuildError;
use crate::script;
use crate::style;
use crate::util::task::Task;
use crate::util::toolchain::Toolchain;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
