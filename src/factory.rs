//! Factory definitions and the builder pipeline.
//!
//! A factory supplies a default attribute map (its definition) and a
//! construction recipe for one target type. Builders layer states over
//! the definition and make instances; the submodules hold the pipeline
//! stages: composition, construction, the fluent builder, the fake-value
//! source, and the global registry.

pub mod builder;
pub mod compose;
pub mod construct;
pub mod faker;
pub mod registry;

use crate::attrs::Attributes;
use crate::error::FactoryResult;

use builder::Builder;
use construct::Construction;
use faker::Faker;

/// Core factory contract.
///
/// Implementors are plain (usually unit) structs; `Default` unlocks the
/// provided entry points. The definition runs once per made instance, so
/// every faker draw inside it is per-instance.
///
/// # Example
///
/// ```ignore
/// #[derive(Default)]
/// struct UserFactory;
///
/// impl Factory for UserFactory {
///     type Target = User;
///
///     fn definition(&self, faker: &Faker) -> Attributes {
///         attrs! {
///             "name" => faker.name(),
///             "email" => faker.email(),
///         }
///     }
///
///     fn construction(&self) -> Construction<User> {
///         Construction::from_map()
///     }
/// }
///
/// let user = UserFactory::new().make_one()?;
/// ```
pub trait Factory: Sized + Send + Sync + 'static {
	/// Concrete type this factory constructs.
	type Target: Send + Sync + 'static;

	/// Default attribute map; the seed of every fold.
	fn definition(&self, faker: &Faker) -> Attributes;

	/// Construction recipe. Container-based unless overridden.
	fn construction(&self) -> Construction<Self::Target> {
		Construction::container()
	}

	/// One-time builder configuration applied by [`Factory::new`] and
	/// [`Factory::new_with`], after any initial override layer.
	fn configure(builder: Builder<Self>) -> Builder<Self> {
		builder
	}

	/// Fresh configured builder over this factory's definition.
	fn new() -> Builder<Self>
	where
		Self: Default,
	{
		Self::configure(Builder::from_factory(Self::default()))
	}

	/// Fresh configured builder with `overrides` applied as the first
	/// state layer.
	fn new_with(overrides: Attributes) -> Builder<Self>
	where
		Self: Default,
	{
		Self::configure(Builder::from_factory(Self::default()).state(overrides))
	}
}

/// Static factory accessor for target types.
///
/// Links a target to its canonical factory so call sites can write
/// `User::factory().make()`.
pub trait HasFactory: Sized {
	/// Canonical factory for this type.
	type Factory: Factory<Target = Self> + Default;

	/// Returns a fresh configured builder for this type.
	fn factory() -> Builder<Self::Factory> {
		Self::Factory::new()
	}
}

/// Whole-map construction entry point for array-based factories.
///
/// The constructor owns the resolved map; extra attributes beyond what it
/// reads are its own business.
pub trait FromAttributes: Sized {
	/// Builds an instance from the resolved attribute map.
	fn from_attributes(attrs: Attributes) -> FactoryResult<Self>;
}
