//! Top-level configuration
//!
//! Defaults can be overridden from `harness-fs.toml` and from environment
//! variables prefixed with `HARNESS_FS__`, using `__` as the nesting
//! separator (e.g. `HARNESS_FS__RETRY__MAX_ATTEMPTS=5`).

use crate::diagnostics::DiagnosticsConfig;
use crate::error::Result;
use crate::retry::RetryPolicy;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "harness-fs.toml";
pub const ENV_PREFIX: &str = "HARNESS_FS__";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
	pub retry: RetryPolicy,
	pub diagnostics: DiagnosticsConfig,
}

impl HarnessConfig {
	/// Load from defaults, `harness-fs.toml` in the working directory, and the environment
	pub fn load() -> Result<Self> {
		Self::load_from(CONFIG_FILE)
	}

	/// Load from defaults, the given TOML file (if present), and the environment
	pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
		let config: HarnessConfig = Self::figment(path.as_ref()).extract()?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		self.retry.validate()?;
		self.diagnostics.validate()
	}

	fn figment(path: &Path) -> Figment {
		Figment::from(Serialized::defaults(HarnessConfig::default()))
			.merge(Toml::file(path))
			.merge(Env::prefixed(ENV_PREFIX).split("__"))
	}
}
