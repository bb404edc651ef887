//! Error types for factory operations.
//!
//! This module defines the error types used throughout the warhol crate.

use thiserror::Error;

/// Errors that can occur while resolving, composing, or constructing instances.
#[derive(Debug, Error)]
pub enum FactoryError {
	/// No factory is registered under the given name.
	#[error("Factory not found: {0}")]
	FactoryNotFound(String),

	/// No factory could be resolved for the given target type.
	#[error("Cannot resolve a factory for target type: {0}")]
	TargetNotFound(String),

	/// Dynamic dispatch was attempted through an unknown method name.
	#[error("Unknown factory method: {0}")]
	UnknownMethod(String),

	/// The construction strategy failed to produce a target instance.
	#[error("Construction of {target} failed: {reason}")]
	Construction {
		/// Target type the factory attempted to construct.
		target: &'static str,
		/// Underlying failure description.
		reason: String,
	},

	/// A state layer failed while folding the attribute map.
	#[error("State layer {index} failed: {source}")]
	LayerEvaluation {
		/// Zero-based position of the failing layer in registration order.
		index: usize,
		/// Error raised by the layer function.
		#[source]
		source: Box<FactoryError>,
	},

	/// A generator attribute failed during expansion.
	#[error("Generator for attribute '{key}' failed: {source}")]
	GeneratorEvaluation {
		/// Attribute key whose generator raised.
		key: String,
		/// Error raised by the generator.
		#[source]
		source: Box<FactoryError>,
	},

	/// A required attribute is absent from the resolved map.
	#[error("Missing attribute: {key}")]
	MissingAttribute {
		/// Attribute key that was looked up.
		key: String,
	},

	/// An attribute holds a different kind of value than requested.
	#[error("Attribute '{key}': expected {expected}, found {found}")]
	AttributeType {
		/// Attribute key that was looked up.
		key: String,
		/// Kind of value the caller asked for.
		expected: &'static str,
		/// Kind of value actually stored.
		found: &'static str,
	},

	/// JSON decoding of an attribute value failed.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Free-form failure raised by factory-authored layers or generators.
	#[error("Factory error: {0}")]
	Message(String),
}

impl FactoryError {
	/// Creates a free-form factory error from any displayable message.
	pub fn message(message: impl Into<String>) -> Self {
		Self::Message(message.into())
	}

	/// Creates a construction error for the given target type.
	pub fn construction<T>(reason: impl Into<String>) -> Self {
		Self::Construction {
			target: std::any::type_name::<T>(),
			reason: reason.into(),
		}
	}
}

/// Result type alias for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;
