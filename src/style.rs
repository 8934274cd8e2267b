//! Compiles the Less sources into one stylesheet and its minified variant.

pub(crate) fn task(
    root: Rc<Path>,
    config: StyleBuildConfig,
    toolchain: Rc<dyn Toolchain>,
    extra_inputs: &[PathBuf],
) -> anyhow::Result<impl Task<Output = anyhow::Result<()>>> {
    let compiled_name = config.compiled_file_name()?;
    let output_dir = root.join(&config.output_dir);
    let compiled_path = output_dir.join(&compiled_name);
    let minified_path = output_dir.join(minified_name(&compiled_name, &config.minified_file_suffix));

    let entry = root.join(&config.source_entry);
    let mut inputs: Vec<Box<dyn Task<Output = ()>>> = vec![
        Box::new(task::FsPath::new(entry.clone())),
        Box::new(task::Tree::new(root.join(&config.dependencies_root), "less")),
    ];
    if let Some(entry_dir) = entry.parent() {
        inputs.push(Box::new(task::Tree::new(entry_dir.to_owned(), "less")));
    }
    inputs.extend(
        extra_inputs
            .iter()
            .map(|path| -> Box<dyn Task<Output = ()>> { Box::new(task::FsPath::new(path.clone())) }),
    );

    let outputs = vec![compiled_path.clone(), minified_path.clone()];
    Ok(task::all(inputs)
        .map(move |_| {
            build(
                &root,
                &config,
                &*toolchain,
                &Artifacts {
                    compiled: &compiled_path,
                    minified: &minified_path,
                },
            )
        })
        .writes(outputs))
}

struct Artifacts<'a> {
    compiled: &'a Path,
    minified: &'a Path,
}

#[context("failed to build stylesheet from `{}`", config.source_entry.display())]
fn build(
    root: &Path,
    config: &StyleBuildConfig,
    toolchain: &dyn Toolchain,
    artifacts: &Artifacts<'_>,
) -> anyhow::Result<()> {
    let entry = root.join(&config.source_entry);
    if !entry.is_file() {
        return Err(BuildError::MissingSource(entry).into());
    }

    let compiled = toolchain.compile_less(&entry, &root.join(&config.dependencies_root))?;
    let stripped = strip_comments(&compiled, config.comment_policy);

    let sectioned = match config.section_header.apply(&stripped) {
        Some(sectioned) => Cow::Owned(sectioned),
        None => {
            log::warn!(
                "{}",
                PatternMismatch {
                    step: "section header insertion",
                    path: &entry,
                }
            );
            stripped
        }
    };

    let mut css = String::with_capacity(config.header_injection.len() + sectioned.len());
    css.push_str(&config.header_injection);
    css.push_str(&sectioned);
    write_file(artifacts.compiled, &css)?;
    log::info!("successfully emitted {}", artifacts.compiled.display());

    let minified = toolchain.minify(FileType::Css, &css)?;
    write_file(
        artifacts.minified,
        format!("{}{minified}", config.minified_header_text),
    )?;
    log::info!("successfully emitted {}", artifacts.minified.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    fn set_age(path: &Path, age: Duration) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - age)
            .unwrap();
    }

    fn config() -> StyleBuildConfig {
        StyleBuildConfig {
            dependencies_root: PathBuf::from("deps/"),
            output_dir: PathBuf::from("out/css/"),
            header_injection: "@import url('fonts.css');\n".to_owned(),
            minified_header_text: "/*! min */\n".to_owned(),
            source_entry: PathBuf::from("less/site.less"),
            ..settings::style_build_config()
        }
    }

    fn project(less: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("less")).unwrap();
        fs::create_dir_all(dir.path().join("deps")).unwrap();
        fs::write(dir.path().join("less/site.less"), less).unwrap();
        dir
    }

    fn run(dir: &TempDir, config: StyleBuildConfig, toolchain: &Rc<Verbatim>) -> anyhow::Result<()> {
        let toolchain: Rc<dyn Toolchain> = toolchain.clone();
        task(Rc::from(dir.path()), config, toolchain, &[])?.run()
    }

    #[test]
    fn emits_compiled_and_minified() {
        let dir = project(concat!(
            "/*! Site stylesheet */\n",
            "/* Typography\n",
            "** ==========\n",
            "**/\n",
            "\n",
            "body { margin: 0; }\n",
            "@media print {\n",
            "  body { color: black; }\n",
            "}\n",
            "@media screen {\n",
            "  body { color: gray; }\n",
            "}\n",
        ));
        let toolchain = Rc::new(Verbatim::default());
        run(&dir, config(), &toolchain).unwrap();

        let compiled = fs::read_to_string(dir.path().join("out/css/site.css")).unwrap();
        let banner = &settings::style_build_config().section_header.insert_text;
        assert_eq!(
            compiled,
            format!(
                concat!(
                    "@import url('fonts.css');\n",
                    "/*! Site stylesheet */\n",
                    "body {{ margin: 0; }}\n",
                    "{banner}\n",
                    "@media print {{\n",
                    "  body {{ color: black; }}\n",
                    "}}\n",
                    "@media screen {{\n",
                    "  body {{ color: gray; }}\n",
                    "}}\n",
                ),
                banner = banner
            )
        );
        assert_eq!(compiled.matches(banner.as_str()).count(), 1);

        let minified = fs::read_to_string(dir.path().join("out/css/site.min.css")).unwrap();
        assert!(minified.starts_with("/*! min */\n@import url('fonts.css'); /*! Site stylesheet */"));
        assert!(!minified.contains("Typography"));
    }

    #[test]
    fn missing_media_queries_pass_through() {
        let dir = project("body { margin: 0; }\n");
        let toolchain = Rc::new(Verbatim::default());
        run(&dir, config(), &toolchain).unwrap();

        let compiled = fs::read_to_string(dir.path().join("out/css/site.css")).unwrap();
        assert_eq!(compiled, "@import url('fonts.css');\nbody { margin: 0; }\n");
    }

    #[test]
    fn missing_entry_fails_without_output() {
        let dir = TempDir::new().unwrap();
        let toolchain = Rc::new(Verbatim::default());
        let e = run(&dir, config(), &toolchain).unwrap_err();

        assert!(matches!(
            build_error(&e),
            Some(BuildError::MissingSource(path)) if path.ends_with("less/site.less")
        ));
        assert_eq!(toolchain.calls.get(), 0);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn entry_deleted_after_build_fails() {
        let dir = project("body { margin: 0; }\n");
        set_age(&dir.path().join("less/site.less"), Duration::from_secs(60));
        let toolchain = Rc::new(Verbatim::default());
        run(&dir, config(), &toolchain).unwrap();
        run(&dir, config(), &toolchain).unwrap();
        assert_eq!(toolchain.calls.get(), 2);

        fs::remove_file(dir.path().join("less/site.less")).unwrap();
        let e = run(&dir, config(), &toolchain).unwrap_err();
        assert!(matches!(
            build_error(&e),
            Some(BuildError::MissingSource(path)) if path.ends_with("less/site.less")
        ));
        assert_eq!(toolchain.calls.get(), 2);
    }

    #[test]
    fn unwritable_output_is_a_write_error() {
        let dir = project("body { margin: 0; }\n");
        // A file where the output directory should be.
        fs::create_dir_all(dir.path().join("out")).unwrap();
        fs::write(dir.path().join("out/css"), "").unwrap();

        let toolchain = Rc::new(Verbatim::default());
        let e = run(&dir, config(), &toolchain).unwrap_err();
        assert!(matches!(build_error(&e), Some(BuildError::Write(..))));
    }

    use super::task;
    use crate::config::StyleBuildConfig;
    use crate::error::build_error;
    use crate::error::BuildError;
    use crate::settings;
    use crate::util::task::Task as _;
    use crate::util::toolchain::Toolchain;
    use crate::util::toolchain::Verbatim;
    use std::fs;
    use std::path::Path;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::Duration;
    use std::time::SystemTime;
    use tempfile::TempDir;
}

use crate::config::StyleBuildConfig;
use crate::error::BuildError;
use crate::error::PatternMismatch;
use crate::util::rewrite::minified_name;
use crate::util::rewrite::strip_comments;
use crate::util::task;
use crate::util::task::Task;
use crate::util::toolchain::FileType;
use crate::util::toolchain::Toolchain;
use crate::util::write_file;
use fn_error_context::context;
use std::borrow::Cow;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
