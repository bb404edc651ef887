//! Provider container backing container-based construction.
//!
//! A container maps target types to provider closures. Container-based
//! construction hands the resolved attribute map to the bound provider,
//! which is how attribute overrides reach constructor arguments without
//! the engine knowing the constructor's shape.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::attrs::Attributes;
use crate::error::{FactoryError, FactoryResult};

/// Provider closure bound for a single target type.
type Provider<T> = Arc<dyn Fn(&Attributes) -> FactoryResult<T> + Send + Sync>;

struct Binding {
	provider: Arc<dyn Any + Send + Sync>,
	type_name: &'static str,
}

/// Type-keyed provider registry.
///
/// Builders may carry their own container
/// ([`using_container`](crate::factory::builder::Builder::using_container));
/// container-based construction without one falls back to
/// [`Container::global`].
#[derive(Default)]
pub struct Container {
	bindings: RwLock<HashMap<TypeId, Binding>>,
}

impl Container {
	/// Creates an empty container.
	pub fn new() -> Self {
		Self::default()
	}

	/// Binds a provider for `T`, replacing any existing binding.
	///
	/// The provider receives the resolved attribute map of the make that
	/// triggered construction.
	///
	/// # Example
	///
	/// ```
	/// use warhol::container::Container;
	///
	/// let container = Container::new();
	/// container.bind(|attrs| Ok(attrs.int("n")? as u64));
	/// let n = container.construct::<u64>(&warhol::attrs! { "n" => 7 }).unwrap();
	/// assert_eq!(n, 7);
	/// ```
	pub fn bind<T, P>(&self, provider: P)
	where
		T: Send + Sync + 'static,
		P: Fn(&Attributes) -> FactoryResult<T> + Send + Sync + 'static,
	{
		let type_name = std::any::type_name::<T>();
		let provider: Provider<T> = Arc::new(provider);
		self.bindings.write().insert(
			TypeId::of::<T>(),
			Binding {
				provider: Arc::new(provider),
				type_name,
			},
		);
		tracing::debug!("Bound container provider for {type_name}");
	}

	/// Constructs a `T` through its bound provider.
	///
	/// # Errors
	///
	/// Returns [`FactoryError::Construction`] naming `T` when no provider
	/// is bound; failures raised by the provider propagate unchanged.
	pub fn construct<T: Send + Sync + 'static>(&self, attrs: &Attributes) -> FactoryResult<T> {
		let provider = {
			let bindings = self.bindings.read();
			let binding = bindings.get(&TypeId::of::<T>()).ok_or_else(|| {
				FactoryError::construction::<T>("no provider bound in the container")
			})?;
			binding
				.provider
				.downcast_ref::<Provider<T>>()
				.cloned()
				.ok_or_else(|| {
					FactoryError::construction::<T>("provider entry has an unexpected type")
				})?
		};
		provider(attrs)
	}

	/// Returns true if a provider is bound for `T`.
	pub fn contains<T: 'static>(&self) -> bool {
		self.bindings.read().contains_key(&TypeId::of::<T>())
	}

	/// Number of bound providers.
	pub fn len(&self) -> usize {
		self.bindings.read().len()
	}

	/// Returns true if no providers are bound.
	pub fn is_empty(&self) -> bool {
		self.bindings.read().is_empty()
	}

	/// Removes every binding.
	///
	/// This is primarily useful for testing.
	pub fn clear(&self) {
		self.bindings.write().clear();
	}

	/// Names of the bound target types.
	pub fn bound_types(&self) -> Vec<&'static str> {
		self.bindings
			.read()
			.values()
			.map(|binding| binding.type_name)
			.collect()
	}

	/// The process-wide default container.
	pub fn global() -> &'static Container {
		static GLOBAL: Lazy<Container> = Lazy::new(Container::default);
		&GLOBAL
	}
}

impl std::fmt::Debug for Container {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Container")
			.field("bindings", &self.len())
			.finish()
	}
}
