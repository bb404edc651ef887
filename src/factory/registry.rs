//! Process-wide factory registry and name resolution.
//!
//! Factories register under dotted names derived from their target type
//! (`"app.user"` for a `User` target under the default namespace), or
//! under an explicit name. Lookups go by name, by target type, or through
//! [`dispatch`] for string-driven call sites such as seed scripts.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::attrs::{Attributes, DynObject, ErasedFactory};
use crate::config;
use crate::error::{FactoryError, FactoryResult};
use crate::factory::builder::Builder;
use crate::factory::Factory;

static FACTORY_REGISTRY: Lazy<RwLock<HashMap<String, Arc<dyn DynBuilder>>>> =
	Lazy::new(|| RwLock::new(HashMap::new()));

static TARGET_INDEX: Lazy<RwLock<HashMap<TypeId, String>>> =
	Lazy::new(|| RwLock::new(HashMap::new()));

type NameResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

static NAME_RESOLVER: Lazy<RwLock<Option<NameResolver>>> = Lazy::new(|| RwLock::new(None));

/// Type-erased view of a [`Builder`], as stored in the registry.
///
/// Chain methods mirror the concrete builder's immutable style: each
/// returns a fresh erased builder and leaves the stored one untouched.
pub trait DynBuilder: Send + Sync + fmt::Debug {
	/// Name of the concrete target type.
	fn target_type(&self) -> &'static str;

	/// Returns a new erased builder with a state layer appended.
	fn with_state(&self, partial: Attributes) -> Arc<dyn DynBuilder>;

	/// Returns a new erased builder with the instance count replaced.
	fn with_count(&self, count: Option<usize>) -> Arc<dyn DynBuilder>;

	/// Makes instances and erases them into a dynamic object.
	///
	/// A single make erases the instance itself; a counted make erases
	/// the whole `Vec`.
	fn make_object(&self) -> FactoryResult<DynObject>;

	/// Downcast seam for callers that know the concrete builder type.
	fn as_any(&self) -> &dyn Any;
}

impl<F: Factory> DynBuilder for Builder<F> {
	fn target_type(&self) -> &'static str {
		Builder::target_type(self)
	}

	fn with_state(&self, partial: Attributes) -> Arc<dyn DynBuilder> {
		Arc::new(self.state(partial))
	}

	fn with_count(&self, count: Option<usize>) -> Arc<dyn DynBuilder> {
		Arc::new(self.count(count))
	}

	fn make_object(&self) -> FactoryResult<DynObject> {
		ErasedFactory::make_object(self)
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

fn short_name(type_name: &str) -> &str {
	type_name.rsplit("::").next().unwrap_or(type_name)
}

/// Computes the registry name a target type maps to.
///
/// Uses the installed resolver when one is set; otherwise joins the
/// configured namespace and the lowercased short type name with a dot.
pub fn resolve_factory_name(target_type: &str) -> String {
	let resolver = NAME_RESOLVER.read().clone();
	if let Some(resolver) = resolver {
		return resolver(target_type);
	}
	let short = short_name(target_type).to_lowercase();
	format!("{}.{}", config::config().namespace, short)
}

/// Registers `F` under the name resolved from its target type.
///
/// Also indexes the target's `TypeId` so [`factory_for`] and
/// [`make_for`] find it without guessing. Re-registering a name
/// replaces the stored builder.
pub fn register<F>()
where
	F: Factory + Default,
{
	let target = std::any::type_name::<F::Target>();
	let name = resolve_factory_name(target);
	FACTORY_REGISTRY
		.write()
		.insert(name.clone(), Arc::new(F::new()) as Arc<dyn DynBuilder>);
	TARGET_INDEX
		.write()
		.insert(TypeId::of::<F::Target>(), name.clone());
	tracing::debug!(factory = %name, target = %target, "Registered factory");
}

/// Registers `F` under an explicit name, skipping the type index.
///
/// Lookups by target type then fall back to the convention name, so use
/// this for secondary registrations (variants of a target that already
/// has a primary factory) or for names [`resolve_factory_name`] would
/// not produce.
pub fn register_as<F>(name: impl Into<String>)
where
	F: Factory + Default,
{
	let name = name.into();
	FACTORY_REGISTRY
		.write()
		.insert(name.clone(), Arc::new(F::new()) as Arc<dyn DynBuilder>);
	tracing::debug!(factory = %name, "Registered factory under explicit name");
}

/// Looks up a registered builder by name.
///
/// # Errors
///
/// Returns [`FactoryError::FactoryNotFound`] when nothing registered
/// under `name`.
pub fn factory_for_name(name: &str) -> FactoryResult<Arc<dyn DynBuilder>> {
	FACTORY_REGISTRY
		.read()
		.get(name)
		.cloned()
		.ok_or_else(|| FactoryError::FactoryNotFound(name.to_string()))
}

/// Looks up the builder registered for target type `T`.
///
/// Consults the type index first, then falls back to the name the
/// resolver would assign to `T`.
///
/// # Errors
///
/// Returns [`FactoryError::TargetNotFound`] when neither route finds a
/// registration.
pub fn factory_for<T: Send + Sync + 'static>() -> FactoryResult<Arc<dyn DynBuilder>> {
	let indexed = TARGET_INDEX.read().get(&TypeId::of::<T>()).cloned();
	if let Some(name) = indexed {
		return factory_for_name(&name);
	}
	let guessed = resolve_factory_name(std::any::type_name::<T>());
	FACTORY_REGISTRY
		.read()
		.get(&guessed)
		.cloned()
		.ok_or_else(|| FactoryError::TargetNotFound(std::any::type_name::<T>().to_string()))
}

/// Makes one `T` through its registered factory.
///
/// # Errors
///
/// Fails when no factory is registered for `T`, when the make itself
/// fails, or when the registered builder produces something other than
/// a single `T` (a counted builder produces a `Vec`, for instance).
pub fn make_for<T: Send + Sync + 'static>() -> FactoryResult<T> {
	let builder = factory_for::<T>()?;
	let object = builder.make_object()?;
	object.try_take::<T>().map_err(|object| FactoryError::Construction {
		target: std::any::type_name::<T>(),
		reason: format!("registered factory produced {}", object.type_name()),
	})
}

/// Installs a custom target-type-to-name resolver.
///
/// The resolver receives the full target type path and returns the
/// registry name. Affects registrations and guessed lookups made after
/// installation; existing entries keep their names.
pub fn guess_names_using<R>(resolver: R)
where
	R: Fn(&str) -> String + Send + Sync + 'static,
{
	*NAME_RESOLVER.write() = Some(Arc::new(resolver));
	tracing::debug!("Installed custom factory name resolver");
}

/// Removes any installed resolver, restoring the namespace convention.
pub fn reset_name_resolver() {
	*NAME_RESOLVER.write() = None;
}

/// Resolves a string-driven `target` / `method` invocation to a builder.
///
/// The method must canonicalize under the active configuration before
/// any name lookup happens, so a typo in the method fails as
/// [`FactoryError::UnknownMethod`] rather than a spurious missing
/// factory.
pub fn dispatch(target_name: &str, method: &str) -> FactoryResult<Arc<dyn DynBuilder>> {
	config::canonical_method(method)
		.ok_or_else(|| FactoryError::UnknownMethod(method.to_string()))?;
	factory_for_name(target_name)
}

/// Returns true when a factory is registered under `name`.
pub fn has_factory(name: &str) -> bool {
	FACTORY_REGISTRY.read().contains_key(name)
}

/// All registered factory names, sorted.
pub fn factory_names() -> Vec<String> {
	let mut names: Vec<String> = FACTORY_REGISTRY.read().keys().cloned().collect();
	names.sort();
	names
}

/// Number of registered factories.
pub fn factory_count() -> usize {
	FACTORY_REGISTRY.read().len()
}

/// Removes every registration and the whole type index.
///
/// The name resolver is left in place; call [`reset_name_resolver`]
/// separately.
pub fn clear_factories() {
	FACTORY_REGISTRY.write().clear();
	TARGET_INDEX.write().clear();
	tracing::debug!("Cleared factory registry");
}

/// Handle over the process-wide registry.
///
/// Every method delegates to the module-level functions; the struct
/// exists so registry access can be passed around as a value.
#[derive(Debug, Default, Clone, Copy)]
pub struct FactoryRegistry;

impl FactoryRegistry {
	/// Creates a registry handle.
	pub fn new() -> Self {
		Self
	}

	/// See [`register`].
	pub fn register<F: Factory + Default>(&self) {
		register::<F>();
	}

	/// See [`register_as`].
	pub fn register_as<F: Factory + Default>(&self, name: impl Into<String>) {
		register_as::<F>(name);
	}

	/// See [`factory_for_name`].
	pub fn get(&self, name: &str) -> FactoryResult<Arc<dyn DynBuilder>> {
		factory_for_name(name)
	}

	/// See [`has_factory`].
	pub fn contains(&self, name: &str) -> bool {
		has_factory(name)
	}

	/// See [`factory_names`].
	pub fn names(&self) -> Vec<String> {
		factory_names()
	}

	/// See [`factory_count`].
	pub fn len(&self) -> usize {
		factory_count()
	}

	/// Returns true when nothing is registered.
	pub fn is_empty(&self) -> bool {
		factory_count() == 0
	}

	/// See [`clear_factories`].
	pub fn clear(&self) {
		clear_factories();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::attrs;
	use crate::config::FactoryConfig;
	use crate::factory::construct::Construction;
	use crate::factory::faker::Faker;
	use crate::factory::FromAttributes;
	use rstest::rstest;
	use serial_test::serial;

	#[derive(Debug, Clone, PartialEq)]
	struct Widget {
		label: String,
	}

	impl FromAttributes for Widget {
		fn from_attributes(attrs: Attributes) -> FactoryResult<Self> {
			Ok(Self {
				label: attrs.string("label")?,
			})
		}
	}

	#[derive(Default)]
	struct WidgetFactory;

	impl Factory for WidgetFactory {
		type Target = Widget;

		fn definition(&self, _faker: &Faker) -> Attributes {
			attrs! { "label" => "widget" }
		}

		fn construction(&self) -> Construction<Widget> {
			Construction::from_map()
		}
	}

	fn fresh() {
		clear_factories();
		reset_name_resolver();
		config::reset_config();
	}

	#[rstest]
	#[serial]
	fn test_register_uses_convention_name() {
		fresh();
		register::<WidgetFactory>();
		assert!(has_factory("app.widget"));
		assert_eq!(factory_names(), vec!["app.widget".to_string()]);
	}

	#[rstest]
	#[serial]
	fn test_make_for_goes_through_type_index() {
		fresh();
		register::<WidgetFactory>();
		let widget = make_for::<Widget>().unwrap();
		assert_eq!(widget.label, "widget");
	}

	#[rstest]
	#[serial]
	fn test_explicit_name_falls_back_to_guessed_lookup() {
		fresh();
		register_as::<WidgetFactory>("app.widget");
		let widget = make_for::<Widget>().unwrap();
		assert_eq!(widget.label, "widget");
	}

	#[rstest]
	#[serial]
	fn test_unregistered_target_reports_type_name() {
		fresh();
		let err = make_for::<Widget>().unwrap_err();
		assert!(matches!(err, FactoryError::TargetNotFound(name) if name.contains("Widget")));
	}

	#[rstest]
	#[serial]
	fn test_missing_name_reports_factory_not_found() {
		fresh();
		let err = factory_for_name("app.ghost").unwrap_err();
		assert!(matches!(err, FactoryError::FactoryNotFound(name) if name == "app.ghost"));
	}

	#[rstest]
	#[serial]
	fn test_custom_resolver_controls_names() {
		fresh();
		guess_names_using(|target| format!("custom::{}", short_name(target).to_lowercase()));
		register::<WidgetFactory>();
		assert!(has_factory("custom::widget"));

		reset_name_resolver();
		register::<WidgetFactory>();
		assert!(has_factory("app.widget"));
	}

	#[rstest]
	#[serial]
	fn test_erased_builder_layers_state() {
		fresh();
		register::<WidgetFactory>();
		let builder = factory_for_name("app.widget").unwrap();
		let relabeled = builder.with_state(attrs! { "label" => "renamed" });
		let widget: Widget = relabeled.make_object().unwrap().try_take().unwrap();
		assert_eq!(widget.label, "renamed");

		// The stored builder is untouched.
		let original: Widget = builder.make_object().unwrap().try_take().unwrap();
		assert_eq!(original.label, "widget");
	}

	#[rstest]
	#[serial]
	fn test_erased_builder_counts_into_vec() {
		fresh();
		register::<WidgetFactory>();
		let builder = factory_for_name("app.widget").unwrap();
		let widgets: Vec<Widget> = builder
			.with_count(Some(2))
			.make_object()
			.unwrap()
			.try_take()
			.unwrap();
		assert_eq!(widgets.len(), 2);
	}

	#[rstest]
	#[serial]
	fn test_counted_builder_fails_single_take() {
		fresh();
		register::<WidgetFactory>();
		let counted = factory_for_name("app.widget").unwrap().with_count(Some(2));
		FACTORY_REGISTRY
			.write()
			.insert("app.widget".to_string(), counted);
		TARGET_INDEX
			.write()
			.insert(std::any::TypeId::of::<Widget>(), "app.widget".to_string());

		let err = make_for::<Widget>().unwrap_err();
		assert!(matches!(err, FactoryError::Construction { .. }));
	}

	#[rstest]
	#[serial]
	fn test_dispatch_validates_method_first() {
		fresh();
		register::<WidgetFactory>();
		assert!(dispatch("app.widget", "factory").is_ok());

		let err = dispatch("app.widget", "fabricate").unwrap_err();
		assert!(matches!(err, FactoryError::UnknownMethod(name) if name == "fabricate"));
	}

	#[rstest]
	#[serial]
	fn test_dispatch_honours_configured_alias() {
		fresh();
		register::<WidgetFactory>();
		config::configure(FactoryConfig {
			method_name: "fabricate".to_string(),
			..FactoryConfig::default()
		});
		assert!(dispatch("app.widget", "fabricate").is_ok());
		assert!(dispatch("app.widget", "factory").is_ok());
		config::reset_config();
	}

	#[rstest]
	#[serial]
	fn test_registry_handle_delegates() {
		fresh();
		let registry = FactoryRegistry::new();
		registry.register::<WidgetFactory>();
		assert_eq!(registry.len(), 1);
		assert!(registry.contains("app.widget"));
		registry.clear();
		assert!(registry.is_empty());
	}

	#[rstest]
	#[serial]
	fn test_as_any_downcasts_to_concrete_builder() {
		fresh();
		register::<WidgetFactory>();
		let erased = factory_for_name("app.widget").unwrap();
		assert!(erased.as_any().downcast_ref::<Builder<WidgetFactory>>().is_some());
	}
}
