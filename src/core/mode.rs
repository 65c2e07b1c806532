//! Build mode configuration for production/development builds.

use clap::ValueEnum;

/// Environment variable selecting the build mode.
pub const MODE_ENV: &str = "ASSETPIPE_ENV";

/// Fallback for projects that already export `NODE_ENV`.
pub const NODE_ENV: &str = "NODE_ENV";

/// Build mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Embed source maps in the output instead of writing `.map` files.
    pub inline_source_maps: bool,

    /// Minify, prefix and down-level output for the configured targets.
    pub optimize: bool,

    /// Keep watching sources after the initial build.
    pub watch: bool,
}

impl BuildMode {
    /// Production mode: optimized output, separate source maps, no watchers.
    pub const PRODUCTION: Self = Self {
        inline_source_maps: false,
        optimize: true,
        watch: false,
    };

    /// Development mode: inline source maps and file watching.
    pub const DEVELOPMENT: Self = Self {
        inline_source_maps: true,
        optimize: false,
        watch: true,
    };

    /// Check if this is development mode.
    #[inline]
    pub const fn is_dev(&self) -> bool {
        self.watch
    }

    pub const fn name(&self) -> &'static str {
        if self.is_dev() { "development" } else { "production" }
    }

    /// Resolve the mode: an explicit `--mode` wins, then the environment.
    pub fn resolve(arg: Option<ModeArg>) -> Self {
        match arg {
            Some(arg) => arg.into(),
            None => Self::from_env(),
        }
    }

    /// Read `ASSETPIPE_ENV`, falling back to `NODE_ENV`.
    pub fn from_env() -> Self {
        let value = std::env::var(MODE_ENV)
            .or_else(|_| std::env::var(NODE_ENV))
            .ok();
        Self::from_env_value(value.as_deref())
    }

    /// Only the exact value `development` selects development mode.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("development") => Self::DEVELOPMENT,
            _ => Self::PRODUCTION,
        }
    }
}

impl Default for BuildMode {
    fn default() -> Self {
        Self::PRODUCTION
    }
}

/// `--mode` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Development,
    Production,
}

impl From<ModeArg> for BuildMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Development => Self::DEVELOPMENT,
            ModeArg::Production => Self::PRODUCTION,
        }
    }
}
