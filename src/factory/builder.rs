//! Immutable fluent builder over a factory definition.
//!
//! Builders are values: every chain method borrows the receiver and
//! returns a new builder, so handing a builder to another test or thread
//! can never contaminate it. Internals are Arc-shared, which keeps the
//! clones cheap.

use std::fmt;
use std::sync::Arc;

use crate::attrs::{AttrValue, Attributes, DynObject, ErasedFactory, NestedFactory};
use crate::container::Container;
use crate::error::{FactoryError, FactoryResult};
use crate::factory::Factory;

use super::compose::{self, Composer, StateLayer};
use super::construct::{Construction, ConstructionStrategy};
use super::faker::Faker;

/// State bundle carried by a builder.
struct BuilderState<T> {
	count: Option<usize>,
	composer: Composer,
	hooks: Vec<Arc<dyn Fn(&mut T) + Send + Sync>>,
	construction: Construction<T>,
	container: Option<Arc<Container>>,
	faker: Faker,
}

impl<T> Clone for BuilderState<T> {
	fn clone(&self) -> Self {
		Self {
			count: self.count,
			composer: self.composer.clone(),
			hooks: self.hooks.clone(),
			construction: self.construction.clone(),
			container: self.container.clone(),
			faker: self.faker.clone(),
		}
	}
}

/// Fluent builder for one factory.
///
/// Obtained from [`Factory::new`], [`Factory::new_with`], or a target's
/// [`HasFactory::factory`](crate::factory::HasFactory::factory) accessor.
/// Chain state layers, a count, and hooks, then call a `make` terminal.
///
/// # Example
///
/// ```ignore
/// let users = UserFactory::new()
///     .state(attrs! { "active" => false })
///     .count(3)
///     .make()?;
/// assert_eq!(users.len(), 3);
/// ```
pub struct Builder<F: Factory> {
	factory: Arc<F>,
	state: BuilderState<F::Target>,
}

impl<F: Factory> Clone for Builder<F> {
	fn clone(&self) -> Self {
		Self {
			factory: Arc::clone(&self.factory),
			state: self.state.clone(),
		}
	}
}

impl<F: Factory> Builder<F> {
	/// Wraps a factory instance without running [`Factory::configure`].
	///
	/// Prefer [`Factory::new`], which configures the builder.
	pub fn from_factory(factory: F) -> Self {
		let construction = factory.construction();
		Self {
			factory: Arc::new(factory),
			state: BuilderState {
				count: None,
				composer: Composer::new(),
				hooks: Vec::new(),
				construction,
				container: None,
				faker: Faker::new(),
			},
		}
	}

	/// Returns a new builder with a constant state layer appended.
	///
	/// Keys in `partial` overwrite earlier values during folding; keys it
	/// does not mention are preserved.
	pub fn state(&self, partial: Attributes) -> Self {
		self.layer(StateLayer::map(partial))
	}

	/// Returns a new builder with a computed state layer appended.
	///
	/// The closure receives the attribute map accumulated so far and
	/// returns a partial map to merge over it.
	pub fn state_with<S>(&self, func: S) -> Self
	where
		S: Fn(&Attributes) -> Attributes + Send + Sync + 'static,
	{
		self.layer(StateLayer::new(func))
	}

	/// Returns a new builder with a fallible state layer appended.
	pub fn try_state_with<S>(&self, func: S) -> Self
	where
		S: Fn(&Attributes) -> FactoryResult<Attributes> + Send + Sync + 'static,
	{
		self.layer(StateLayer::fallible(func))
	}

	/// Returns a new builder with a prebuilt layer appended.
	pub fn layer(&self, layer: StateLayer) -> Self {
		let mut next = self.clone();
		next.state.composer = next.state.composer.with_layer(layer);
		next
	}

	/// Returns a new builder with the instance count replaced.
	///
	/// `None` restores single-instance make; `Some(0)` makes an empty
	/// batch.
	pub fn count(&self, count: impl Into<Option<usize>>) -> Self {
		let mut next = self.clone();
		next.state.count = count.into();
		next
	}

	/// Returns a new builder with a post-make hook appended.
	///
	/// Hooks observe fully constructed instances, in registration order,
	/// once per made instance.
	pub fn after_making<H>(&self, hook: H) -> Self
	where
		H: Fn(&mut F::Target) + Send + Sync + 'static,
	{
		let mut next = self.clone();
		next.state.hooks.push(Arc::new(hook));
		next
	}

	/// Returns a new builder using the given construction recipe.
	pub fn use_construction(&self, construction: Construction<F::Target>) -> Self {
		let mut next = self.clone();
		next.state.construction = construction;
		next
	}

	/// Returns a new builder resolving container-based construction
	/// through the given container instead of the global one.
	pub fn using_container(&self, container: Arc<Container>) -> Self {
		let mut next = self.clone();
		next.state.container = Some(container);
		next
	}

	/// Returns a new builder carrying the given fake-value source.
	pub fn with_faker(&self, faker: Faker) -> Self {
		let mut next = self.clone();
		next.state.faker = faker;
		next
	}

	/// The fake-value source definitions and layers draw from.
	pub fn faker(&self) -> &Faker {
		&self.state.faker
	}

	/// The configured instance count, if any.
	pub fn planned_count(&self) -> Option<usize> {
		self.state.count
	}

	/// Number of state layers registered so far.
	pub fn layer_count(&self) -> usize {
		self.state.composer.len()
	}

	/// Number of post-make hooks registered so far.
	pub fn hook_count(&self) -> usize {
		self.state.hooks.len()
	}

	/// Strategy of the active construction recipe.
	pub fn strategy(&self) -> ConstructionStrategy {
		self.state.construction.strategy()
	}

	/// Name of the target type this builder constructs.
	pub fn target_type(&self) -> &'static str {
		std::any::type_name::<F::Target>()
	}

	/// Folds and expands the attribute map without constructing.
	///
	/// Each call re-evaluates the definition, so generator and faker
	/// draws differ between calls exactly as they do between instances.
	pub fn attributes(&self) -> FactoryResult<Attributes> {
		let folded = self
			.state
			.composer
			.fold(|| self.factory.definition(&self.state.faker))?;
		compose::expand(folded)
	}

	/// Constructs one instance from an already-resolved attribute map.
	///
	/// # Errors
	///
	/// Failures are surfaced as [`FactoryError::Construction`] with the
	/// target type name attached; already-classified construction errors
	/// pass through unchanged.
	pub fn construct(&self, attrs: Attributes) -> FactoryResult<F::Target> {
		self.state
			.construction
			.apply(attrs, self.state.container.as_deref())
			.map_err(|err| match err {
				classified @ FactoryError::Construction { .. } => classified,
				other => FactoryError::Construction {
					target: std::any::type_name::<F::Target>(),
					reason: other.to_string(),
				},
			})
	}

	/// Makes instances according to the configured count.
	///
	/// Without a count, makes a single instance ([`Made::One`]). With a
	/// count of `n`, constructs all `n` instances first and only then
	/// runs the post-make hooks instance by instance; if any construction
	/// fails the whole batch fails and no hook runs.
	pub fn make(&self) -> FactoryResult<Made<F::Target>> {
		match self.state.count {
			None => self.make_one().map(Made::One),
			Some(count) => {
				let mut batch = Vec::with_capacity(count);
				for _ in 0..count {
					batch.push(self.make_instance()?);
				}
				for instance in &mut batch {
					self.run_hooks(instance);
				}
				Ok(Made::Batch(batch))
			}
		}
	}

	/// Makes instances with `overrides` applied as a final state layer.
	///
	/// Equivalent to `self.state(overrides).make()`.
	pub fn make_with(&self, overrides: Attributes) -> FactoryResult<Made<F::Target>> {
		self.state(overrides).make()
	}

	/// Makes exactly one instance, ignoring any configured count.
	pub fn make_one(&self) -> FactoryResult<F::Target> {
		let mut instance = self.make_instance()?;
		self.run_hooks(&mut instance);
		Ok(instance)
	}

	/// Makes a batch of `count` instances as a `Vec`.
	///
	/// Equivalent to `self.count(count).make()` flattened.
	pub fn make_batch(&self, count: usize) -> FactoryResult<Vec<F::Target>> {
		self.count(count).make().map(Made::into_vec)
	}

	fn make_instance(&self) -> FactoryResult<F::Target> {
		let attrs = self.attributes()?;
		self.construct(attrs)
	}

	fn run_hooks(&self, instance: &mut F::Target) {
		for hook in &self.state.hooks {
			hook(instance);
		}
	}
}

impl<F: Factory> fmt::Debug for Builder<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Builder")
			.field("target", &self.target_type())
			.field("layers", &self.layer_count())
			.field("count", &self.state.count)
			.field("strategy", &self.strategy())
			.finish()
	}
}

impl<F: Factory> ErasedFactory for Builder<F> {
	fn make_object(&self) -> FactoryResult<DynObject> {
		match self.make()? {
			Made::One(instance) => Ok(DynObject::new(instance)),
			Made::Batch(batch) => Ok(DynObject::new(batch)),
		}
	}

	fn target_type(&self) -> &'static str {
		Builder::target_type(self)
	}
}

impl AttrValue {
	/// Wraps a builder as a nested-factory attribute.
	///
	/// Expansion realizes the slot by running the builder's make; with a
	/// count set, the slot becomes a `Vec` of instances.
	pub fn factory<F: Factory>(builder: Builder<F>) -> Self {
		Self::Nested(NestedFactory::new(Arc::new(builder)))
	}
}

impl<F: Factory> From<Builder<F>> for AttrValue {
	fn from(builder: Builder<F>) -> Self {
		Self::factory(builder)
	}
}

/// Product of a make terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum Made<T> {
	/// Single instance (no count configured).
	One(T),
	/// Batch of instances (count configured, possibly zero).
	Batch(Vec<T>),
}

impl<T> Made<T> {
	/// Consumes a single-instance product.
	pub fn one(self) -> Option<T> {
		match self {
			Self::One(instance) => Some(instance),
			Self::Batch(_) => None,
		}
	}

	/// Consumes a batch product.
	pub fn batch(self) -> Option<Vec<T>> {
		match self {
			Self::One(_) => None,
			Self::Batch(batch) => Some(batch),
		}
	}

	/// Flattens either shape into a `Vec`.
	pub fn into_vec(self) -> Vec<T> {
		match self {
			Self::One(instance) => vec![instance],
			Self::Batch(batch) => batch,
		}
	}

	/// Borrows the made instances as a slice.
	pub fn as_slice(&self) -> &[T] {
		match self {
			Self::One(instance) => std::slice::from_ref(instance),
			Self::Batch(batch) => batch,
		}
	}

	/// Number of made instances.
	pub fn len(&self) -> usize {
		self.as_slice().len()
	}

	/// Returns true if nothing was made (an empty batch).
	pub fn is_empty(&self) -> bool {
		self.as_slice().is_empty()
	}

	/// Iterates over the made instances.
	pub fn iter(&self) -> std::slice::Iter<'_, T> {
		self.as_slice().iter()
	}
}

impl<T> IntoIterator for Made<T> {
	type Item = T;
	type IntoIter = std::vec::IntoIter<T>;

	fn into_iter(self) -> Self::IntoIter {
		self.into_vec().into_iter()
	}
}
