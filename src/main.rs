#![warn(
    noop_method_call,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    clippy::pedantic
)]
#![allow(
    clippy::match_bool,
    clippy::too_many_lines,
    clippy::items_after_statements,
    clippy::module_name_repetitions
)]

use ::{
    anyhow::Context as _,
    crossbeam::channel,
    notify::Watcher,
    std::{
        path::PathBuf,
        rc::Rc,
        time::{Duration, Instant},
    },
};

mod builder;
mod config;
mod error;
mod script;
mod settings;
mod style;

mod util;
use self::{
    builder::{Builder, Report},
    util::toolchain::{Npx, Toolchain},
};

/// Builds the custom stylesheet and script bundle of the DAESA website.
#[derive(clap::Parser)]
struct Args {
    /// Project root that every configured path is relative to.
    #[clap(long, default_value = ".")]
    root: PathBuf,

    /// TOML file overriding the built-in build settings.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Directory containing the `package.json` of the Node build tools.
    #[clap(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/js"))]
    tools: PathBuf,

    /// Whether to watch the project root, and the directories of configured sources outside it,
    /// for changes.
    #[clap(long)]
    watch: bool,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();

    let args: Args = clap::Parser::parse();

    let npx = Npx::new(args.tools.clone());
    npx.install().context("failed to install build tools")?;
    let toolchain: Rc<dyn Toolchain> = Rc::new(npx);

    let report = build(&args, &toolchain)?;

    if args.watch {
        let (sender, receiver) = channel::bounded(1);

        let mut watcher = notify::recommended_watcher(move |event_res| {
            let event: notify::Event = match event_res {
                Ok(event) => event,
                Err(e) => {
                    log::error!("error watching: {}", e);
                    return;
                }
            };
            if !matches!(event.kind, notify::event::EventKind::Access(_)) {
                let _ = sender.try_send(());
            }
        })
        .context("failed to create file watcher")?;

        watcher
            .watch(&args.root, notify::RecursiveMode::Recursive)
            .context("failed to watch project root")?;

        if let Some((style, script)) = util::log_errors(config::load(args.config.as_deref())) {
            for dir in config::external_dirs(&args.root, &style, &script) {
                watcher
                    .watch(&dir, notify::RecursiveMode::Recursive)
                    .with_context(|| format!("failed to watch `{}`", dir.display()))?;
            }
        }

        log::info!("now watching for changes");

        loop {
            let _ = receiver.recv();
            // debounce
            let debounce_deadline = Instant::now() + Duration::from_millis(10);
            while receiver.recv_deadline(debounce_deadline).is_ok() {}

            log::info!("rebuilding");
            util::log_errors(build(&args, &toolchain));
        }
    }

    anyhow::ensure!(
        report.is_success(),
        "{} of {} build tasks failed: {}",
        report.failed().len(),
        report.total(),
        report.failed().join(", ")
    );
    Ok(())
}

/// Load the settings afresh and run both build tasks once.
fn build(args: &Args, toolchain: &Rc<dyn Toolchain>) -> anyhow::Result<Report> {
    let (style, script) = config::load(args.config.as_deref())?;

    let mut builder = Builder::new(&args.root, toolchain.clone());
    if let Some(path) = &args.config {
        builder.input(path.clone());
    }
    builder
        .register_style_task(style)
        .register_script_task(script);
    Ok(builder.run())
}

