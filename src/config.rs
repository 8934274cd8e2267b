//! Build configuration values and their optional TOML overrides.

/// Settings for compiling the Less sources into one stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StyleBuildConfig {
    /// Which comments are stripped from the compiled stylesheet.
    pub comment_policy: CommentPolicy,

    /// Directory that Less imports resolve under.
    pub dependencies_root: PathBuf,

    /// Directory the compiled and minified stylesheets are written to.
    pub output_dir: PathBuf,

    /// Prepended to the compiled stylesheet.
    pub header_injection: String,

    /// Restores a section banner that Less compilation drops.
    pub section_header: SectionHeaderInsertion,

    /// Replaces the extension of the compiled stylesheet to name the minified one.
    pub minified_file_suffix: String,

    /// Prepended to the minified stylesheet. May be empty.
    pub minified_header_text: String,

    /// The Less file compilation starts from.
    pub source_entry: PathBuf,
}

impl StyleBuildConfig {
    /// File name of the compiled (unminified) stylesheet.
    pub(crate) fn compiled_file_name(&self) -> anyhow::Result<String> {
        let stem = self
            .source_entry
            .file_stem()
            .and_then(|stem| stem.to_str())
            .with_context(|| {
                format!("`{}` has no UTF-8 file stem", self.source_entry.display())
            })?;
        Ok(format!("{stem}.css"))
    }

    #[context("invalid style build settings")]
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        ensure_dir("dependencies_root", &self.dependencies_root)?;
        ensure_dir("output_dir", &self.output_dir)?;
        ensure!(
            !self.source_entry.as_os_str().is_empty(),
            "`source_entry` is empty"
        );
        self.compiled_file_name()?;
        ensure!(
            !self.minified_file_suffix.is_empty(),
            "`minified_file_suffix` is empty"
        );
        Ok(())
    }
}

/// Settings for concatenating the scripts into one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptBuildConfig {
    /// Concatenated in this order: later scripts may rely on globals defined by earlier ones.
    pub sources: Vec<PathBuf>,

    /// Selects the header comment of each source that `header_rewrite` is applied to.
    pub comment_policy: CommentPolicy,

    pub output_file_name: String,

    pub output_dir: PathBuf,

    pub minified_file_suffix: String,

    pub header_rewrite: HeaderRewrite,
}

impl ScriptBuildConfig {
    #[context("invalid script build settings")]
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.sources.is_empty(), "`sources` is empty");
        ensure_dir("output_dir", &self.output_dir)?;
        ensure!(
            !self.output_file_name.is_empty(),
            "`output_file_name` is empty"
        );
        ensure!(
            !self.minified_file_suffix.is_empty(),
            "`minified_file_suffix` is empty"
        );
        Ok(())
    }
}

fn ensure_dir(field: &str, path: &Path) -> anyhow::Result<()> {
    let ends_with_separator = path
        .to_str()
        .and_then(|s| s.chars().last())
        .map_or(false, path::is_separator);
    ensure!(
        ends_with_separator,
        "`{field}` must be a directory path ending in a separator, found `{}`",
        path.display()
    );
    Ok(())
}

/// Load the built-in settings, with the fields set in the TOML file at `path` replaced.
#[context("failed to load build settings")]
pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<(StyleBuildConfig, ScriptBuildConfig)> {
    let mut style = settings::style_build_config();
    let mut script = settings::script_build_config();

    if let Some(path) = path {
        let src = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let overrides = toml::from_str::<Overrides>(&src)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        overrides.style.apply(&mut style);
        overrides.script.apply(&mut script);
    }

    style.validate()?;
    script.validate()?;
    Ok((style, script))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Overrides {
    style: StyleOverrides,
    script: ScriptOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StyleOverrides {
    comment_policy: Option<CommentPolicy>,
    dependencies_root: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    header_injection: Option<String>,
    section_header: Option<SectionHeaderInsertion>,
    minified_file_suffix: Option<String>,
    minified_header_text: Option<String>,
    source_entry: Option<PathBuf>,
}

impl StyleOverrides {
    fn apply(self, config: &mut StyleBuildConfig) {
        let Self {
            comment_policy,
            dependencies_root,
            output_dir,
            header_injection,
            section_header,
            minified_file_suffix,
            minified_header_text,
            source_entry,
        } = self;
        replace(&mut config.comment_policy, comment_policy);
        replace(&mut config.dependencies_root, dependencies_root);
        replace(&mut config.output_dir, output_dir);
        replace(&mut config.header_injection, header_injection);
        replace(&mut config.section_header, section_header);
        replace(&mut config.minified_file_suffix, minified_file_suffix);
        replace(&mut config.minified_header_text, minified_header_text);
        replace(&mut config.source_entry, source_entry);
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScriptOverrides {
    sources: Option<Vec<PathBuf>>,
    comment_policy: Option<CommentPolicy>,
    output_file_name: Option<String>,
    output_dir: Option<PathBuf>,
    minified_file_suffix: Option<String>,
    header_rewrite: Option<HeaderRewrite>,
}

impl ScriptOverrides {
    fn apply(self, config: &mut ScriptBuildConfig) {
        let Self {
            sources,
            comment_policy,
            output_file_name,
            output_dir,
            minified_file_suffix,
            header_rewrite,
        } = self;
        replace(&mut config.sources, sources);
        replace(&mut config.comment_policy, comment_policy);
        replace(&mut config.output_file_name, output_file_name);
        replace(&mut config.output_dir, output_dir);
        replace(&mut config.minified_file_suffix, minified_file_suffix);
        replace(&mut config.header_rewrite, header_rewrite);
    }
}

/// Existing directories holding configured inputs that lie outside `root`, such as sibling
/// checkouts of vendored plugins.
pub(crate) fn external_dirs(
    root: &Path,
    style: &StyleBuildConfig,
    script: &ScriptBuildConfig,
) -> Vec<PathBuf> {
    let Ok(root) = root.canonicalize() else {
        return Vec::new();
    };
    let entry = root.join(&style.source_entry);
    let candidates = script
        .sources
        .iter()
        .filter_map(|source| root.join(source).parent().map(Path::to_owned))
        .chain(entry.parent().map(Path::to_owned))
        .chain([root.join(&style.dependencies_root)]);

    let mut dirs = Vec::new();
    for dir in candidates {
        let Ok(dir) = dir.canonicalize() else {
            continue;
        };
        if !dir.starts_with(&root) && !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

fn replace<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}


use crate::settings;
use crate::util::rewrite::CommentPolicy;
use crate::util::rewrite::HeaderRewrite;
use crate::util::rewrite::SectionHeaderInsertion;
use anyhow::ensure;
use anyhow::Context as _;
use fn_error_context::context;
use serde::Deserialize;
use std::fs;
use std::path;
use std::path::Path;
use std::path::PathBuf;
