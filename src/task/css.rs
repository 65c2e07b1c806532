//! CSS entry modules through lightningcss.
//!
//! Development: `@import` bundling only, inline source map.
//! Production: bundling, prefixing and down-leveling for the configured
//! browser targets, minification, and a separate `.map` file.
//!
//! With `[css.processor]` enabled, the utility module is first run through
//! the processor (Tailwind JIT), whose stdout replaces the bundling step.

use super::Compiler;
use crate::config::PipelineConfig;
use crate::utils::exec::{Cmd, FilterRule};
use anyhow::{Context, Result, anyhow};
use lightningcss::bundler::{Bundler, FileProvider};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::Targets;
use parcel_sourcemap::SourceMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Tailwind's progress chatter on stderr.
const PROCESSOR_FILTER: FilterRule =
    FilterRule::new(&["Done in", "Rebuilding...", "Browserslist:", "npx browserslist"]);

pub struct CssCompiler {
    config: Arc<PipelineConfig>,
}

impl CssCompiler {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    fn targets(&self) -> Targets {
        if self.config.mode.optimize {
            Targets::from(self.config.css.targets.to_browsers())
        } else {
            Targets::default()
        }
    }

    /// Processor invocation for `module`, when it is the utility module and
    /// the processor is enabled.
    pub fn processor_command(&self, module: &Path) -> Option<Cmd> {
        let config = &self.config;
        let processor = &config.css.processor;
        if !processor.enable || config.css.utility.as_deref() != Some(module) {
            return None;
        }

        let mut cmd = Cmd::from_slice(&processor.command);
        if let Some(file) = &processor.config {
            cmd = cmd.arg("-c").arg(config.display(file));
        }
        Some(
            cmd.arg("-i")
                .arg(config.display(module))
                .cwd(config.get_root())
                .label("css")
                .filter(&PROCESSOR_FILTER),
        )
    }

    fn run_processor(&self, module: &Path) -> Result<Option<String>> {
        let Some(cmd) = self.processor_command(module) else {
            return Ok(None);
        };
        crate::debug!("css"; "{}", cmd.display());
        let output = cmd.run()?;
        let css = String::from_utf8(output.stdout).context("processor output is not UTF-8")?;
        Ok(Some(css))
    }

    /// Bundle, transform and write `<css.dist>/<stem>.css`.
    fn compile(&self, module: &Path) -> Result<()> {
        let config = &self.config;
        let mode = config.mode;
        let stem = module
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("invalid module name: {}", module.display()))?;
        let root = config.get_root().to_string_lossy().into_owned();

        let processed = self.run_processor(module)?;
        let provider = FileProvider::new();
        let mut source_map = SourceMap::new(&root);

        let mut stylesheet = match &processed {
            Some(source) => {
                let filename = config.display(module);
                source_map.add_source(&filename);
                source_map
                    .set_source_content(0, source)
                    .map_err(|e| anyhow!("source map: {e:?}"))?;
                let options = ParserOptions {
                    filename,
                    ..ParserOptions::default()
                };
                StyleSheet::parse(source, options).map_err(|e| anyhow!("{e}"))?
            }
            None => {
                let mut bundler =
                    Bundler::new(&provider, Some(&mut source_map), ParserOptions::default());
                bundler.bundle(module).map_err(|e| anyhow!("{e}"))?
            }
        };

        if mode.optimize {
            stylesheet
                .minify(MinifyOptions {
                    targets: self.targets(),
                    ..MinifyOptions::default()
                })
                .map_err(|e| anyhow!("{e}"))?;
        }

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: mode.optimize,
                source_map: Some(&mut source_map),
                project_root: Some(&root),
                targets: self.targets(),
                ..PrinterOptions::default()
            })
            .map_err(|e| anyhow!("{e}"))?;

        let dist = &config.css.dist;
        fs::create_dir_all(dist)
            .with_context(|| format!("Failed to create {}", dist.display()))?;

        let mut code = result.code;
        if mode.inline_source_maps {
            let url = source_map
                .to_data_url(None)
                .map_err(|e| anyhow!("source map: {e:?}"))?;
            code.push_str(&format!("\n/*# sourceMappingURL={url} */\n"));
        } else {
            let map_name = format!("{stem}.css.map");
            let json = source_map
                .to_json(None)
                .map_err(|e| anyhow!("source map: {e:?}"))?;
            fs::write(dist.join(&map_name), json)?;
            code.push_str(&format!("\n/*# sourceMappingURL={map_name} */\n"));
        }

        let out = dist.join(format!("{stem}.css"));
        fs::write(&out, code).with_context(|| format!("Failed to write {}", out.display()))?;
        Ok(())
    }
}

impl Compiler for CssCompiler {
    fn name(&self) -> &'static str {
        "css"
    }

    fn extension(&self) -> &'static str {
        "css"
    }

    fn compile_one(&self, module: &Path) -> Result<()> {
        self.compile(module)
    }

    /// `@import "partials/base.css"` and friends: a plain substring test.
    fn references(&self, source: &str, name: &str) -> bool {
        source.contains(name)
    }

    fn template_entry(&self) -> Option<&Path> {
        self.config.css.utility.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::core::BuildMode;
    use tempfile::TempDir;

    fn project(mode: BuildMode) -> (TempDir, Arc<PipelineConfig>) {
        let tmp = TempDir::new().unwrap();
        let css = tmp.path().join("src/css");
        fs::create_dir_all(css.join("modules")).unwrap();
        fs::create_dir_all(css.join("partials")).unwrap();
        fs::write(css.join("partials/base.css"), ".base { color: #ff0000; }\n").unwrap();
        fs::write(
            css.join("modules/app.css"),
            "@import \"../partials/base.css\";\n.app { user-select: none; }\n",
        )
        .unwrap();
        let config = test_config(tmp.path(), mode);
        (tmp, Arc::new(config))
    }

    #[test]
    fn test_development_inlines_source_map() {
        let (_tmp, config) = project(BuildMode::DEVELOPMENT);
        let compiler = CssCompiler::new(Arc::clone(&config));
        let module = config.root_join("src/css/modules/app.css");

        compiler.compile_one(&module).unwrap();

        let out = fs::read_to_string(config.css.dist.join("app.css")).unwrap();
        assert!(out.contains(".base"));
        assert!(out.contains(".app"));
        assert!(out.contains("sourceMappingURL=data:application/json"));
        assert!(!config.css.dist.join("app.css.map").exists());
    }

    #[test]
    fn test_production_minifies_and_prefixes() {
        let (_tmp, config) = project(BuildMode::PRODUCTION);
        let compiler = CssCompiler::new(Arc::clone(&config));
        let module = config.root_join("src/css/modules/app.css");

        compiler.compile_one(&module).unwrap();

        let out = fs::read_to_string(config.css.dist.join("app.css")).unwrap();
        assert!(out.contains(".base{color:red}"));
        assert!(out.contains("-webkit-user-select:none"));
        assert!(out.contains("sourceMappingURL=app.css.map"));
        assert!(config.css.dist.join("app.css.map").is_file());
    }

    #[test]
    fn test_missing_import_is_error() {
        let (_tmp, config) = project(BuildMode::DEVELOPMENT);
        let module = config.root_join("src/css/modules/broken.css");
        fs::write(&module, "@import \"../partials/nope.css\";\n").unwrap();

        let compiler = CssCompiler::new(Arc::clone(&config));
        assert!(compiler.compile_one(&module).is_err());
        assert!(!config.css.dist.join("broken.css").exists());
    }

    fn with_processor(mode: BuildMode, command: &[&str]) -> (TempDir, Arc<PipelineConfig>) {
        let (tmp, config) = project(mode);
        let mut config = Arc::unwrap_or_clone(config);
        config.css.processor.enable = true;
        config.css.processor.command = command.iter().map(|s| s.to_string()).collect();
        let utility = config.root_join("src/css/modules/utility.css");
        fs::write(&utility, "@tailwind utilities;\n.u { margin: 0; }\n").unwrap();
        (tmp, Arc::new(config))
    }

    #[test]
    fn test_processor_command_only_for_utility() {
        let (_tmp, config) = with_processor(BuildMode::PRODUCTION, &["npx", "tailwindcss"]);
        let mut config = Arc::unwrap_or_clone(config);
        config.css.processor.config = Some(config.root_join("tailwind.config.js"));
        let compiler = CssCompiler::new(Arc::new(config));

        let utility = compiler.config.root_join("src/css/modules/utility.css");
        let cmd = compiler.processor_command(&utility).unwrap();
        assert_eq!(
            cmd.display(),
            "npx tailwindcss -c tailwind.config.js -i src/css/modules/utility.css"
        );

        let app = compiler.config.root_join("src/css/modules/app.css");
        assert!(compiler.processor_command(&app).is_none());
    }

    #[test]
    fn test_processor_disabled_by_default() {
        let (_tmp, config) = project(BuildMode::DEVELOPMENT);
        let compiler = CssCompiler::new(Arc::clone(&config));
        let utility = config.root_join("src/css/modules/utility.css");
        assert!(compiler.processor_command(&utility).is_none());
    }

    /// A stand-in generator emitting one rule per `text-*` class used in the
    /// templates, the way a JIT compiler does.
    #[cfg(unix)]
    #[test]
    fn test_template_edit_changes_utility_output() {
        let script = "sed '/@tailwind/d' \"$2\"; \
                      grep -ho 'text-[a-z0-9-]*' static/views/*.html | sed 's/.*/.&{color:red}/'";
        let (_tmp, config) = with_processor(BuildMode::DEVELOPMENT, &["sh", "-c", script, "tailwind"]);
        let views = config.root_join("static/views");
        fs::create_dir_all(&views).unwrap();
        fs::write(views.join("index.html"), "<p class=\"flex\">hi</p>").unwrap();

        let compiler = CssCompiler::new(Arc::clone(&config));
        let utility = config.root_join("src/css/modules/utility.css");
        let out = config.css.dist.join("utility.css");

        compiler.compile_one(&utility).unwrap();
        let before = fs::read_to_string(&out).unwrap();
        assert!(before.contains(".u"));
        assert!(!before.contains("text-red-500"));

        fs::write(views.join("index.html"), "<p class=\"text-red-500 flex\">hi</p>").unwrap();
        compiler.compile_one(&utility).unwrap();
        let after = fs::read_to_string(&out).unwrap();
        assert!(after.contains(".text-red-500"));
        assert!(after.contains("sourceMappingURL=data:application/json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_processor_failure_is_error() {
        let (_tmp, config) = with_processor(BuildMode::DEVELOPMENT, &["sh", "-c", "echo nope >&2; exit 2"]);
        let compiler = CssCompiler::new(Arc::clone(&config));
        let utility = config.root_join("src/css/modules/utility.css");
        let err = compiler.compile_one(&utility).unwrap_err().to_string();
        assert!(err.contains("nope"));
    }

    #[test]
    fn test_references_and_template() {
        let (_tmp, config) = project(BuildMode::DEVELOPMENT);
        let compiler = CssCompiler::new(Arc::clone(&config));
        assert!(compiler.references("@import 'partials/base.css';", "base.css"));
        assert!(!compiler.references("@import 'partials/grid.css';", "base.css"));
        assert_eq!(
            compiler.template_entry(),
            Some(config.root_join("src/css/modules/utility.css").as_path())
        );
        assert_eq!(
            compiler.partial_name(Path::new("/p/src/css/partials/base.css")),
            Some("base.css".to_string())
        );
    }
}
