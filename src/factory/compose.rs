//! Attribute folding and expansion.
//!
//! A factory's definition seeds an attribute map; state layers transform
//! it left-to-right in registration order; expansion then realizes nested
//! factories and invokes tagged generators. Folding and expansion are the
//! two halves of the compose step every make runs before construction.

use std::fmt;
use std::sync::Arc;

use crate::attrs::{AttrValue, Attributes, Generator, NestedFactory};
use crate::error::{FactoryError, FactoryResult};

/// One attribute-transforming state layer.
///
/// A layer receives the accumulated map so far and returns a partial map
/// that is shallow-merged over the accumulator. Layers needing builder
/// context (a faker, counters) capture it when the closure is created,
/// before folding runs.
#[derive(Clone)]
pub struct StateLayer {
	func: Arc<dyn Fn(&Attributes) -> FactoryResult<Attributes> + Send + Sync>,
}

impl StateLayer {
	/// Constant layer returning a fixed partial map.
	pub fn map(partial: Attributes) -> Self {
		Self {
			func: Arc::new(move |_| Ok(partial.clone())),
		}
	}

	/// Layer computed from the accumulated map so far.
	pub fn new<F>(func: F) -> Self
	where
		F: Fn(&Attributes) -> Attributes + Send + Sync + 'static,
	{
		Self {
			func: Arc::new(move |attrs| Ok(func(attrs))),
		}
	}

	/// Layer whose computation can fail.
	pub fn fallible<F>(func: F) -> Self
	where
		F: Fn(&Attributes) -> FactoryResult<Attributes> + Send + Sync + 'static,
	{
		Self {
			func: Arc::new(func),
		}
	}

	pub(crate) fn apply(&self, accumulated: &Attributes) -> FactoryResult<Attributes> {
		(self.func)(accumulated)
	}
}

impl fmt::Debug for StateLayer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "StateLayer")
	}
}

/// Ordered, append-only sequence of state layers.
///
/// Composers are values: [`Composer::with_layer`] returns a new composer
/// and never mutates the receiver, so builders sharing a prefix cannot
/// contaminate each other.
#[derive(Clone, Debug, Default)]
pub struct Composer {
	layers: Vec<StateLayer>,
}

impl Composer {
	/// Creates a composer with no layers.
	pub fn new() -> Self {
		Self { layers: Vec::new() }
	}

	/// Returns a new composer with the layer appended.
	pub fn with_layer(&self, layer: StateLayer) -> Self {
		let mut layers = self.layers.clone();
		layers.push(layer);
		Self { layers }
	}

	/// Number of registered layers.
	pub fn len(&self) -> usize {
		self.layers.len()
	}

	/// Returns true if no layers are registered.
	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}

	/// Folds the layer sequence over a definition seed.
	///
	/// Evaluates `definition` to obtain the seed map, then for each layer
	/// in registration order invokes it with the accumulated map and
	/// shallow-merges the result over the accumulator: every key the
	/// layer returns overwrites the prior value, keys it does not mention
	/// are preserved, and first-insertion positions are kept.
	///
	/// # Errors
	///
	/// A failing layer aborts the fold immediately with
	/// [`FactoryError::LayerEvaluation`] carrying the layer's index;
	/// partial results are discarded.
	pub fn fold<D>(&self, definition: D) -> FactoryResult<Attributes>
	where
		D: FnOnce() -> Attributes,
	{
		let mut accumulated = definition();
		for (index, layer) in self.layers.iter().enumerate() {
			let partial = layer
				.apply(&accumulated)
				.map_err(|source| FactoryError::LayerEvaluation {
					index,
					source: Box::new(source),
				})?;
			accumulated.merge(partial);
		}
		Ok(accumulated)
	}
}

/// Expands special attribute values into final ones.
///
/// Walks entries in insertion order. A [`AttrValue::Nested`] slot is
/// realized by running the sub-builder's make pipeline and substituting
/// the product as an instance. A [`AttrValue::Gen`] slot is invoked with
/// the map as resolved so far, its output substituted as-is; because
/// substitutions are written back immediately, later generators see the
/// resolved values of earlier siblings. Plain data and instances pass
/// through untouched.
///
/// # Errors
///
/// A failing generator aborts expansion with
/// [`FactoryError::GeneratorEvaluation`] carrying the attribute key.
/// Failures inside a nested factory propagate unchanged, keeping the
/// nested target's own diagnostics.
pub fn expand(mut raw: Attributes) -> FactoryResult<Attributes> {
	enum Work {
		Nested(NestedFactory),
		Gen(String, Generator),
	}

	for index in 0..raw.len() {
		let work = match raw.get_index(index) {
			Some((_, AttrValue::Nested(nested))) => Work::Nested(nested.clone()),
			Some((key, AttrValue::Gen(generator))) => Work::Gen(key.clone(), generator.clone()),
			_ => continue,
		};
		let resolved = match work {
			Work::Nested(nested) => AttrValue::Object(nested.make_object()?),
			Work::Gen(key, generator) => {
				generator
					.evaluate(&raw)
					.map_err(|source| FactoryError::GeneratorEvaluation {
						key,
						source: Box::new(source),
					})?
			}
		};
		raw.replace_index(index, resolved);
	}
	Ok(raw)
}
