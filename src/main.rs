//! assetpipe - asset build pipeline for CSS, JS, manifests and size checks.

mod logger;

mod asset;
mod cli;
mod config;
mod core;
mod router;
mod task;
mod utils;
mod watch;

use anyhow::{Context, Result, bail};
use asset::glob::GlobList;
use asset::{manifest, size};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;
use std::sync::Arc;
use task::{Compiler, CssCompiler, EntrySet, JsCompiler, Task};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Arc::new(PipelineConfig::load(&cli)?);
    debug!("config"; "{} mode, root {}", config.mode.name(), config.get_root().display());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(cli.command, config))
}

async fn run(command: Commands, config: Arc<PipelineConfig>) -> Result<()> {
    match command {
        Commands::Css => finish(css_task(&config)?.run(config.mode.watch).await?, "css"),
        Commands::Js => finish(js_task(&config)?.run(config.mode.watch).await?, "js"),
        Commands::Build => build(&config).await,
        Commands::Manifest => manifest::generate(&config).map(|_| ()),
        Commands::Size { strict } => check_size(&config, strict || config.size.strict),
    }
}

/// Both tasks side by side. Production then versions and measures the
/// output, but only when every compile succeeded.
async fn build(config: &Arc<PipelineConfig>) -> Result<()> {
    let watch = config.mode.watch;
    let (css, js) = (css_task(config)?, js_task(config)?);
    let (css, js) = tokio::join!(css.run(watch), js.run(watch));
    let (css, js) = (css?, js?);

    if !(css && js) {
        bail!("build failed, skipping manifest and size check");
    }
    if !config.mode.is_dev() {
        manifest::generate(config)?;
        check_size(config, config.size.strict)?;
    }
    Ok(())
}

fn css_task(config: &Arc<PipelineConfig>) -> Result<Task<CssCompiler>> {
    let compiler = CssCompiler::new(Arc::clone(config));
    task(compiler, config, &config.css.modules, &config.css.watch)
}

fn js_task(config: &Arc<PipelineConfig>) -> Result<Task<JsCompiler>> {
    let compiler = JsCompiler::new(Arc::clone(config))?;
    task(compiler, config, &config.js.modules, &config.js.watch)
}

fn task<C: Compiler>(
    compiler: C,
    config: &Arc<PipelineConfig>,
    modules: &[String],
    watch: &[String],
) -> Result<Task<C>> {
    let entries = EntrySet::enumerate(config.get_root(), modules)?;
    let watch = GlobList::new(watch)?;
    Ok(Task::new(compiler, entries, watch, Arc::clone(config)))
}

/// A one-shot run that hit compile errors exits non-zero.
fn finish(ok: bool, name: &str) -> Result<()> {
    if !ok {
        bail!("{name} build failed");
    }
    Ok(())
}

fn check_size(config: &PipelineConfig, strict: bool) -> Result<()> {
    let report = size::check(config)?;
    report.print();
    if strict && report.has_failures() {
        bail!(
            "{} over size limit",
            utils::plural::plural_count(report.failures(), "file")
        );
    }
    Ok(())
}
