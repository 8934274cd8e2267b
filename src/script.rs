//! Concatenates the scripts, in dependency order, into one bundle and its minified variant.

pub(crate) fn task(
    root: Rc<Path>,
    config: ScriptBuildConfig,
    toolchain: Rc<dyn Toolchain>,
    extra_inputs: &[PathBuf],
) -> impl Task<Output = anyhow::Result<()>> {
    let output_dir = root.join(&config.output_dir);
    let bundle_path = output_dir.join(&config.output_file_name);
    let minified_path = output_dir.join(minified_name(
        &config.output_file_name,
        &config.minified_file_suffix,
    ));

    let inputs = config
        .sources
        .iter()
        .map(|source| root.join(source))
        .chain(extra_inputs.iter().cloned())
        .map(task::FsPath::new)
        .collect();

    let outputs = vec![bundle_path.clone(), minified_path.clone()];
    task::all(inputs)
        .map(move |_| build(&root, &config, &*toolchain, &bundle_path, &minified_path))
        .writes(outputs)
}

#[context("failed to build script bundle `{}`", config.output_file_name)]
fn build(
    root: &Path,
    config: &ScriptBuildConfig,
    toolchain: &dyn Toolchain,
    bundle_path: &Path,
    minified_path: &Path,
) -> anyhow::Result<()> {
    let sources: Vec<PathBuf> = config.sources.iter().map(|source| root.join(source)).collect();

    // Check everything up front so a missing script never produces a partial bundle.
    let missing: Vec<&PathBuf> = sources.iter().filter(|path| !path.is_file()).collect();
    for path in &missing {
        log::error!("script source `{}` does not exist", path.display());
    }
    if let Some(&first) = missing.first() {
        return Err(BuildError::MissingSource(first.clone()).into());
    }

    let mut bundle = String::new();
    for (i, path) in sources.iter().enumerate() {
        let src = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        if i != 0 {
            bundle.push('\n');
        }
        match rewrite_leading(&src, config.comment_policy, config.header_rewrite) {
            Some(rewritten) => bundle.push_str(&rewritten),
            None => {
                if !starts_flagged(&src) {
                    log::warn!(
                        "{}",
                        PatternMismatch {
                            step: config.header_rewrite.name(),
                            path,
                        }
                    );
                }
                bundle.push_str(&src);
            }
        }
    }

    write_file(bundle_path, &bundle)?;
    log::info!("successfully emitted {}", bundle_path.display());

    let minified = toolchain.minify(FileType::Js, &bundle)?;
    write_file(minified_path, minified)?;
    log::info!("successfully emitted {}", minified_path.display());

    Ok(())
}


use crate::config::ScriptBuildConfig;
use crate::error::BuildError;
use crate::error::PatternMismatch;
use crate::util::rewrite::minified_name;
use crate::util::rewrite::rewrite_leading;
use crate::util::rewrite::starts_flagged;
use crate::util::task;
use crate::util::task::Task;
use crate::util::toolchain::FileType;
use crate::util::toolchain::Toolchain;
use crate::util::write_file;
use anyhow::Context as _;
use fn_error_context::context;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
