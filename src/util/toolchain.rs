//! The external compiler and minifiers, run through `npx`.

pub(crate) trait Toolchain {
    /// Compile the Less file at `entry` to CSS, resolving imports under `include_dir`.
    fn compile_less(&self, entry: &Path, include_dir: &Path) -> anyhow::Result<String>;

    fn minify(&self, file_type: FileType, src: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileType {
    Css,
    Js,
}

/// Node tools installed from the `package.json` in `dir`.
pub(crate) struct Npx {
    dir: PathBuf,
}

impl Npx {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Run `npm install`, unless `node_modules` is newer than `package.json`.
    pub(crate) fn install(&self) -> anyhow::Result<()> {
        task::FsPath::new(self.dir.join("package.json"))
            .map(|()| self.npm_install())
            .writes(vec![self.dir.join("node_modules/.package-lock.json")])
            .run()
    }

    fn npm_install(&self) -> anyhow::Result<()> {
        let status = process::Command::new("npm")
            .arg("install")
            .arg("--silent")
            .current_dir(&self.dir)
            // disable the progress bar
            .stderr(process::Stdio::null())
            .status()
            .context("failed to run `npm install`")?;

        ensure!(
            status.success(),
            "`npm install` exited with a non-zero exit status"
        );

        log::info!("installed build tools in `{}`", self.dir.display());
        Ok(())
    }

    fn npx(&self, tool: &str) -> process::Command {
        let mut command = process::Command::new("npx");
        command.arg(tool).current_dir(&self.dir);
        command
    }
}

impl Toolchain for Npx {
    #[context("failed to compile `{}` with lessc", entry.display())]
    fn compile_less(&self, entry: &Path, include_dir: &Path) -> anyhow::Result<String> {
        // `npx` runs in the tools directory, so relative paths would resolve against it.
        let entry = path::absolute(entry).context("failed to resolve entry path")?;
        let include_dir = path::absolute(include_dir).context("failed to resolve include path")?;

        let output = self
            .npx("lessc")
            .arg(format!("--include-path={}", include_dir.display()))
            .arg(&entry)
            .stdin(process::Stdio::null())
            .stderr(process::Stdio::inherit())
            .output()
            .context("failed to run `npx lessc`")?;

        ensure!(
            output.status.success(),
            "lessc exited with a non-zero exit status"
        );

        String::from_utf8(output.stdout).context("lessc wrote invalid UTF-8")
    }

    fn minify(&self, file_type: FileType, src: &str) -> anyhow::Result<String> {
        match file_type {
            FileType::Css => pipe(self.npx("cleancss").arg("-O2"), src)
                .context("failed to minify CSS with cleancss"),
            FileType::Js => pipe(
                self.npx("terser")
                    .arg("--compress")
                    .arg("--mangle")
                    .arg("--comments")
                    .arg("some"),
                src,
            )
            .context("failed to minify JS with terser"),
        }
    }
}

fn pipe(command: &mut process::Command, input: &str) -> anyhow::Result<String> {
    let mut child = command
        .stdin(process::Stdio::piped())
        .stdout(process::Stdio::piped())
        .spawn()
        .context("failed to spawn child process")?;

    let mut stdin = child.stdin.take().context("child process has no stdin")?;

    // Feed stdin from another thread so a full stdout pipe can't deadlock us.
    let (written, output) = crossbeam::scope(|s| {
        let writer = s.spawn(move |_| stdin.write_all(input.as_bytes()));
        let output = child.wait_with_output();
        (writer.join(), output)
    })
    .map_err(|_| anyhow!("child process stdin writer panicked"))?;

    let output = output.context("failed to wait for child process")?;
    written
        .map_err(|_| anyhow!("child process stdin writer panicked"))?
        .context("failed to write to child process' stdin")?;

    ensure!(
        output.status.success(),
        "child process exited with a non-zero exit status"
    );

    String::from_utf8(output.stdout).context("child process wrote invalid UTF-8")
}

/// Passes sources through unchanged and collapses whitespace instead of minifying.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct Verbatim {
    pub calls: std::cell::Cell<u32>,
}

#[cfg(test)]
impl Toolchain for Verbatim {
    fn compile_less(&self, entry: &Path, _include_dir: &Path) -> anyhow::Result<String> {
        self.calls.set(self.calls.get() + 1);
        std::fs::read_to_string(entry).context("failed to read Less entry")
    }

    fn minify(&self, _file_type: FileType, src: &str) -> anyhow::Result<String> {
        self.calls.set(self.calls.get() + 1);
        Ok(src.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

use crate::util::task;
use crate::util::task::Task as _;
use anyhow::anyhow;
use anyhow::ensure;
use anyhow::Context as _;
use fn_error_context::context;
use std::io::Write as _;
use std::path;
use std::path::Path;
use std::path::PathBuf;
use std::process;
