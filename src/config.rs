//! Process-wide factory conventions.
//!
//! Controls the namespace used when deriving factory names from target
//! types and the method-name alias accepted by string-driven dispatch.
//! Configuration is process-global with snapshot reads; tests call
//! [`reset_config`] between runs.

use once_cell::sync::Lazy;
use parking_lot::RwLock;

static CONFIG: Lazy<RwLock<FactoryConfig>> =
	Lazy::new(|| RwLock::new(FactoryConfig::default()));

/// Conventions governing factory naming and dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
	/// Method name accepted by dispatch alongside the built-in `"factory"`.
	pub method_name: String,
	/// Namespace prefix for derived factory names.
	pub namespace: String,
}

impl Default for FactoryConfig {
	fn default() -> Self {
		Self {
			method_name: "factory".to_string(),
			namespace: "app".to_string(),
		}
	}
}

/// Canonical factory methods reachable through dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryMethod {
	/// The factory accessor itself.
	Factory,
}

/// Installs a new process-wide configuration.
pub fn configure(config: FactoryConfig) {
	tracing::debug!(
		method = %config.method_name,
		namespace = %config.namespace,
		"Configured factory conventions"
	);
	*CONFIG.write() = config;
}

/// Snapshot of the active configuration.
pub fn config() -> FactoryConfig {
	CONFIG.read().clone()
}

/// Restores the default configuration.
pub fn reset_config() {
	*CONFIG.write() = FactoryConfig::default();
}

/// Maps a method name to its canonical factory method, if any.
///
/// The built-in `"factory"` always canonicalizes; the configured
/// `method_name` canonicalizes as an alias for the same method.
pub fn canonical_method(name: &str) -> Option<FactoryMethod> {
	const BUILT_IN: [(&str, FactoryMethod); 1] = [("factory", FactoryMethod::Factory)];
	if let Some((_, method)) = BUILT_IN.iter().find(|(alias, _)| *alias == name) {
		return Some(*method);
	}
	(config().method_name == name).then_some(FactoryMethod::Factory)
}
