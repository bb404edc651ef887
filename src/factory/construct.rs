//! Construction strategies.
//!
//! A construction recipe turns the resolved attribute map into a target
//! instance. Three strategies exist: hand the whole map to the target's
//! constructor, resolve the target through a provider container, or map
//! declared parameter names to attribute keys. The recipe carries the
//! mechanism; [`Construction::strategy`] reports which strategy it is.

use std::fmt;
use std::sync::Arc;

use crate::attrs::Attributes;
use crate::container::Container;
use crate::error::FactoryResult;
use crate::factory::FromAttributes;

/// Named construction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionStrategy {
	/// The whole resolved attribute map goes to the target's constructor.
	ArrayBased,
	/// The target is resolved through a provider container.
	ContainerBased,
	/// Declared parameter names are mapped to attribute keys.
	ReflectionBased,
}

impl fmt::Display for ConstructionStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::ArrayBased => "array-based",
			Self::ContainerBased => "container-based",
			Self::ReflectionBased => "reflection-based",
		};
		f.write_str(name)
	}
}

/// Construction recipe for a target type.
///
/// Factories pick a recipe in [`Factory::construction`]; builders can
/// replace it per chain with
/// [`use_construction`](crate::factory::builder::Builder::use_construction).
/// The default is container-based, which needs no capability proof from
/// the target type; the array-based recipe is built where the author opts
/// in, which is also where the [`FromAttributes`] bound is checked.
///
/// [`Factory::construction`]: crate::factory::Factory::construction
pub enum Construction<T> {
	/// Whole-map constructor (array-based).
	FromMap(Arc<dyn Fn(Attributes) -> FactoryResult<T> + Send + Sync>),
	/// Explicit parameter mapping (reflection-based).
	Mapped(ParamMap<T>),
	/// Provider-container resolution (container-based).
	Container,
}

impl<T> Construction<T> {
	/// Array-based recipe through the target's [`FromAttributes`] impl.
	pub fn from_map() -> Self
	where
		T: FromAttributes + 'static,
	{
		Self::FromMap(Arc::new(T::from_attributes))
	}

	/// Array-based recipe through a custom whole-map constructor.
	pub fn from_fn<F>(build: F) -> Self
	where
		F: Fn(Attributes) -> FactoryResult<T> + Send + Sync + 'static,
	{
		Self::FromMap(Arc::new(build))
	}

	/// Reflection-based recipe from an explicit parameter mapping.
	pub fn mapped(params: ParamMap<T>) -> Self {
		Self::Mapped(params)
	}

	/// Container-based recipe.
	pub fn container() -> Self {
		Self::Container
	}

	/// Strategy this recipe implements.
	pub fn strategy(&self) -> ConstructionStrategy {
		match self {
			Self::FromMap(_) => ConstructionStrategy::ArrayBased,
			Self::Mapped(_) => ConstructionStrategy::ReflectionBased,
			Self::Container => ConstructionStrategy::ContainerBased,
		}
	}
}

impl<T: Send + Sync + 'static> Construction<T> {
	/// Runs the recipe over a resolved attribute map.
	///
	/// `container` is the builder's explicit container, if any; the
	/// container-based recipe falls back to [`Container::global`].
	pub(crate) fn apply(
		&self,
		attrs: Attributes,
		container: Option<&Container>,
	) -> FactoryResult<T> {
		match self {
			Self::FromMap(build) => build(attrs),
			Self::Mapped(params) => params.apply(attrs),
			Self::Container => match container {
				Some(explicit) => explicit.construct::<T>(&attrs),
				None => Container::global().construct::<T>(&attrs),
			},
		}
	}
}

impl<T> Clone for Construction<T> {
	fn clone(&self) -> Self {
		match self {
			Self::FromMap(build) => Self::FromMap(Arc::clone(build)),
			Self::Mapped(params) => Self::Mapped(params.clone()),
			Self::Container => Self::Container,
		}
	}
}

impl<T> Default for Construction<T> {
	fn default() -> Self {
		Self::Container
	}
}

impl<T> fmt::Debug for Construction<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Construction({})", self.strategy())
	}
}

/// Explicit constructor-parameter mapping.
///
/// Replaces runtime constructor introspection: the factory declares its
/// parameter names as data, the engine subsets the resolved map to those
/// names (attributes without a matching name are left out, absent names
/// are simply missing keys), and an assemble closure turns the subset
/// into the target.
pub struct ParamMap<T> {
	names: &'static [&'static str],
	assemble: Arc<dyn Fn(Attributes) -> FactoryResult<T> + Send + Sync>,
}

impl<T> ParamMap<T> {
	/// Declares parameter names and the assemble closure.
	///
	/// # Example
	///
	/// ```ignore
	/// ParamMap::new(&["x", "y"], |args| {
	///     Ok(Point { x: args.int("x")?, y: args.int("y")? })
	/// })
	/// ```
	pub fn new<F>(names: &'static [&'static str], assemble: F) -> Self
	where
		F: Fn(Attributes) -> FactoryResult<T> + Send + Sync + 'static,
	{
		Self {
			names,
			assemble: Arc::new(assemble),
		}
	}

	/// Declared parameter names, in constructor order.
	pub fn names(&self) -> &'static [&'static str] {
		self.names
	}

	/// Subsets the resolved map to the declared names and assembles.
	///
	/// Matching entries are moved out of `attrs` (instances stay takeable
	/// inside the assemble closure); unmatched attributes are dropped.
	pub(crate) fn apply(&self, mut attrs: Attributes) -> FactoryResult<T> {
		let mut args = Attributes::new();
		for name in self.names {
			if let Some(value) = attrs.remove(name) {
				args.insert(*name, value);
			}
		}
		(self.assemble)(args)
	}
}

impl<T> Clone for ParamMap<T> {
	fn clone(&self) -> Self {
		Self {
			names: self.names,
			assemble: Arc::clone(&self.assemble),
		}
	}
}

impl<T> fmt::Debug for ParamMap<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ParamMap({:?})", self.names)
	}
}
