//! Attribute maps and tagged attribute values.
//!
//! Factories describe instances as ordered, string-keyed attribute maps.
//! Each slot holds an [`AttrValue`]: plain JSON data, an already-built
//! instance, a lazy generator, or a nested factory. The tag decides what
//! expansion does with the slot; plain data is never invoked, no matter
//! how callable-like it looks.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{FactoryError, FactoryResult};

/// Ordered attribute map keyed by attribute name.
///
/// Insertion order is observable: folding preserves the position of the
/// first insertion of each key, and expansion walks entries in order.
#[derive(Clone, Default)]
pub struct Attributes {
	entries: IndexMap<String, AttrValue>,
}

impl Attributes {
	/// Creates an empty attribute map.
	pub fn new() -> Self {
		Self {
			entries: IndexMap::new(),
		}
	}

	/// Returns the number of attributes.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if the map holds no attributes.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns true if the map holds the given key.
	pub fn contains(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	/// Inserts an attribute, replacing any existing value.
	///
	/// An existing key keeps its original position in the map.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
		self.entries.insert(key.into(), value.into());
	}

	/// Chainable insert for building literal maps.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.insert(key, value);
		self
	}

	/// Removes an attribute, preserving the order of the remaining entries.
	pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
		self.entries.shift_remove(key)
	}

	/// Returns the raw value stored under the key.
	pub fn get(&self, key: &str) -> Option<&AttrValue> {
		self.entries.get(key)
	}

	/// Returns the entry at the given position in insertion order.
	pub fn get_index(&self, index: usize) -> Option<(&String, &AttrValue)> {
		self.entries.get_index(index)
	}

	/// Replaces the value at the given position, keeping the key.
	pub(crate) fn replace_index(&mut self, index: usize, value: AttrValue) {
		if let Some((_, slot)) = self.entries.get_index_mut(index) {
			*slot = value;
		}
	}

	/// Iterates over entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
		self.entries.iter()
	}

	/// Iterates over keys in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &String> {
		self.entries.keys()
	}

	/// Shallow-merges another map over this one.
	///
	/// Every key in `other` overwrites the value here; keys not mentioned
	/// by `other` are preserved. Existing keys keep their original
	/// position, new keys append in `other`'s order.
	pub fn merge(&mut self, other: Attributes) {
		for (key, value) in other.entries {
			self.entries.insert(key, value);
		}
	}

	/// Returns the JSON data stored under the key.
	pub fn value(&self, key: &str) -> FactoryResult<&Value> {
		match self.require(key)? {
			AttrValue::Data(value) => Ok(value),
			other => Err(type_error(key, "data", other)),
		}
	}

	/// Returns the string stored under the key.
	pub fn str(&self, key: &str) -> FactoryResult<&str> {
		match self.require(key)? {
			AttrValue::Data(Value::String(s)) => Ok(s),
			other => Err(type_error(key, "string", other)),
		}
	}

	/// Returns an owned copy of the string stored under the key.
	pub fn string(&self, key: &str) -> FactoryResult<String> {
		self.str(key).map(str::to_owned)
	}

	/// Returns the integer stored under the key.
	pub fn int(&self, key: &str) -> FactoryResult<i64> {
		match self.require(key)? {
			AttrValue::Data(value) => value
				.as_i64()
				.ok_or_else(|| type_error_kind(key, "integer", value_kind(value))),
			other => Err(type_error(key, "integer", other)),
		}
	}

	/// Returns the number stored under the key as a float.
	pub fn float(&self, key: &str) -> FactoryResult<f64> {
		match self.require(key)? {
			AttrValue::Data(value) => value
				.as_f64()
				.ok_or_else(|| type_error_kind(key, "number", value_kind(value))),
			other => Err(type_error(key, "number", other)),
		}
	}

	/// Returns the boolean stored under the key.
	pub fn boolean(&self, key: &str) -> FactoryResult<bool> {
		match self.require(key)? {
			AttrValue::Data(Value::Bool(b)) => Ok(*b),
			other => Err(type_error(key, "boolean", other)),
		}
	}

	/// Deserializes the JSON data stored under the key into `T`.
	pub fn decode<T: serde::de::DeserializeOwned>(&self, key: &str) -> FactoryResult<T> {
		let value = self.value(key)?.clone();
		Ok(serde_json::from_value(value)?)
	}

	/// Borrows the instance stored under the key, downcast to `T`.
	pub fn object_ref<T: Send + Sync + 'static>(&self, key: &str) -> FactoryResult<&T> {
		match self.require(key)? {
			AttrValue::Object(obj) => obj.downcast_ref::<T>().ok_or_else(|| {
				type_error_kind(key, std::any::type_name::<T>(), obj.type_name())
			}),
			other => Err(type_error(key, std::any::type_name::<T>(), other)),
		}
	}

	/// Removes the instance stored under the key and downcasts it to `T`.
	pub fn take_object<T: Send + Sync + 'static>(&mut self, key: &str) -> FactoryResult<T> {
		let value = self
			.remove(key)
			.ok_or_else(|| FactoryError::MissingAttribute { key: key.into() })?;
		match value {
			AttrValue::Object(obj) => {
				if !obj.is::<T>() {
					return Err(type_error_kind(
						key,
						std::any::type_name::<T>(),
						obj.type_name(),
					));
				}
				obj.try_take::<T>().map_err(|_| {
					FactoryError::message(format!(
						"Attribute '{key}': instance is still shared and cannot be taken"
					))
				})
			}
			other => {
				let found = other.kind();
				self.entries.insert(key.to_string(), other);
				Err(type_error_kind(key, std::any::type_name::<T>(), found))
			}
		}
	}

	fn require(&self, key: &str) -> FactoryResult<&AttrValue> {
		self.get(key)
			.ok_or_else(|| FactoryError::MissingAttribute { key: key.into() })
	}
}

impl FromIterator<(String, AttrValue)> for Attributes {
	fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
		Self {
			entries: iter.into_iter().collect(),
		}
	}
}

impl IntoIterator for Attributes {
	type Item = (String, AttrValue);
	type IntoIter = indexmap::map::IntoIter<String, AttrValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

impl PartialEq for Attributes {
	/// Order-sensitive equality: same keys, same values, same positions.
	fn eq(&self, other: &Self) -> bool {
		self.entries.len() == other.entries.len()
			&& self
				.entries
				.iter()
				.zip(other.entries.iter())
				.all(|((ka, va), (kb, vb))| ka == kb && va == vb)
	}
}

impl fmt::Debug for Attributes {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.entries.iter()).finish()
	}
}

fn type_error(key: &str, expected: &'static str, found: &AttrValue) -> FactoryError {
	type_error_kind(key, expected, found.kind())
}

fn type_error_kind(key: &str, expected: &'static str, found: &'static str) -> FactoryError {
	FactoryError::AttributeType {
		key: key.into(),
		expected,
		found,
	}
}

fn value_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// A single attribute slot.
///
/// The variant tag, not the value's shape, decides expansion behavior:
/// `Data` and `Object` pass through untouched, `Gen` is invoked with the
/// raw map, `Nested` is realized through its factory.
#[derive(Clone)]
pub enum AttrValue {
	/// Plain JSON data. Never invoked or expanded.
	Data(Value),
	/// An already-built instance carried by type-erased handle.
	Object(DynObject),
	/// A lazy generator invoked during expansion.
	Gen(Generator),
	/// A nested factory realized during expansion.
	Nested(NestedFactory),
}

impl AttrValue {
	/// Wraps plain JSON data.
	pub fn data(value: impl Into<Value>) -> Self {
		Self::Data(value.into())
	}

	/// The JSON null attribute.
	pub fn null() -> Self {
		Self::Data(Value::Null)
	}

	/// Wraps an already-built instance.
	pub fn object<T: Send + Sync + 'static>(value: T) -> Self {
		Self::Object(DynObject::new(value))
	}

	/// Wraps an infallible generator closure.
	///
	/// The closure receives the whole raw attribute map, with every
	/// earlier entry already resolved.
	pub fn lazy<F>(func: F) -> Self
	where
		F: Fn(&Attributes) -> AttrValue + Send + Sync + 'static,
	{
		Self::Gen(Generator::new(move |attrs| Ok(func(attrs))))
	}

	/// Wraps a fallible generator closure.
	pub fn try_lazy<F>(func: F) -> Self
	where
		F: Fn(&Attributes) -> FactoryResult<AttrValue> + Send + Sync + 'static,
	{
		Self::Gen(Generator::new(func))
	}

	/// Short kind name used in diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Data(value) => value_kind(value),
			Self::Object(_) => "instance",
			Self::Gen(_) => "generator",
			Self::Nested(_) => "factory",
		}
	}
}

impl fmt::Debug for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Data(value) => value.fmt(f),
			Self::Object(obj) => write!(f, "<{} instance>", obj.type_name()),
			Self::Gen(_) => write!(f, "<generator>"),
			Self::Nested(nested) => write!(f, "<{} factory>", nested.target_type()),
		}
	}
}

impl PartialEq for AttrValue {
	/// Data compares by value; handles compare by identity.
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Data(a), Self::Data(b)) => a == b,
			(Self::Object(a), Self::Object(b)) => Arc::ptr_eq(&a.inner, &b.inner),
			(Self::Gen(a), Self::Gen(b)) => Arc::ptr_eq(&a.func, &b.func),
			(Self::Nested(a), Self::Nested(b)) => Arc::ptr_eq(&a.inner, &b.inner),
			_ => false,
		}
	}
}

impl From<Value> for AttrValue {
	fn from(value: Value) -> Self {
		Self::Data(value)
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<i32> for AttrValue {
	fn from(value: i32) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<i64> for AttrValue {
	fn from(value: i64) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<u32> for AttrValue {
	fn from(value: u32) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<u64> for AttrValue {
	fn from(value: u64) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<usize> for AttrValue {
	fn from(value: usize) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<f64> for AttrValue {
	fn from(value: f64) -> Self {
		Self::Data(Value::from(value))
	}
}

impl From<Generator> for AttrValue {
	fn from(generator: Generator) -> Self {
		Self::Gen(generator)
	}
}

impl From<DynObject> for AttrValue {
	fn from(obj: DynObject) -> Self {
		Self::Object(obj)
	}
}

/// Type-erased handle to an already-built instance.
///
/// Records the concrete type name at creation time for diagnostics.
#[derive(Clone)]
pub struct DynObject {
	inner: Arc<dyn Any + Send + Sync>,
	type_name: &'static str,
}

impl DynObject {
	/// Erases a concrete instance.
	pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
		Self {
			inner: Arc::new(value),
			type_name: std::any::type_name::<T>(),
		}
	}

	/// Name of the erased concrete type.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Returns true if the handle holds a `T`.
	pub fn is<T: Send + Sync + 'static>(&self) -> bool {
		self.inner.as_ref().is::<T>()
	}

	/// Borrows the instance as `T`.
	pub fn downcast_ref<T: Send + Sync + 'static>(&self) -> Option<&T> {
		self.inner.downcast_ref::<T>()
	}

	/// Takes the instance out of the handle.
	///
	/// Fails (returning the handle) if the type does not match or the
	/// instance is still shared by another handle.
	pub fn try_take<T: Send + Sync + 'static>(self) -> Result<T, Self> {
		let type_name = self.type_name;
		match self.inner.downcast::<T>() {
			Ok(arc) => Arc::try_unwrap(arc).map_err(|arc| Self {
				inner: arc,
				type_name,
			}),
			Err(inner) => Err(Self { inner, type_name }),
		}
	}
}

impl fmt::Debug for DynObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "DynObject<{}>", self.type_name)
	}
}

/// A tagged lazy attribute generator.
///
/// Invoked during expansion with the whole raw attribute map; sees every
/// earlier sibling already resolved. The output replaces the slot as-is.
#[derive(Clone)]
pub struct Generator {
	func: Arc<dyn Fn(&Attributes) -> FactoryResult<AttrValue> + Send + Sync>,
}

impl Generator {
	/// Wraps a fallible generator function.
	pub fn new<F>(func: F) -> Self
	where
		F: Fn(&Attributes) -> FactoryResult<AttrValue> + Send + Sync + 'static,
	{
		Self {
			func: Arc::new(func),
		}
	}

	/// Invokes the generator with the map as resolved so far.
	pub fn evaluate(&self, attrs: &Attributes) -> FactoryResult<AttrValue> {
		(self.func)(attrs)
	}
}

impl fmt::Debug for Generator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Generator")
	}
}

/// Contract a nested-factory slot needs from a builder.
///
/// Implemented by `Builder`; kept object-safe so attribute maps can carry
/// sub-factories without knowing their factory type.
pub trait ErasedFactory: Send + Sync {
	/// Runs the builder's full make pipeline and erases the product.
	///
	/// A builder with a count set produces a `Vec` of instances as one
	/// erased object.
	fn make_object(&self) -> FactoryResult<DynObject>;

	/// Name of the target type the builder constructs.
	fn target_type(&self) -> &'static str;
}

/// A nested factory carried inside an attribute slot.
#[derive(Clone)]
pub struct NestedFactory {
	inner: Arc<dyn ErasedFactory>,
}

impl NestedFactory {
	/// Wraps an erased builder.
	pub fn new(inner: Arc<dyn ErasedFactory>) -> Self {
		Self { inner }
	}

	/// Realizes the nested factory into an erased instance.
	pub fn make_object(&self) -> FactoryResult<DynObject> {
		self.inner.make_object()
	}

	/// Name of the nested target type.
	pub fn target_type(&self) -> &'static str {
		self.inner.target_type()
	}
}

/// Builds a literal [`Attributes`] map.
///
/// # Example
///
/// ```
/// let point = warhol::attrs! { "x" => 1, "y" => 2 };
/// assert_eq!(point.int("x").unwrap(), 1);
/// assert_eq!(point.len(), 2);
/// ```
#[macro_export]
macro_rules! attrs {
	() => { $crate::attrs::Attributes::new() };
	($($key:expr => $value:expr),+ $(,)?) => {{
		let mut map = $crate::attrs::Attributes::new();
		$(map.insert($key, $value);)+
		map
	}};
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_insert_preserves_first_position() {
		let mut attrs = attrs! { "a" => 1, "b" => 2 };
		attrs.insert("a", 10);
		let keys: Vec<_> = attrs.keys().cloned().collect();
		assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
		assert_eq!(attrs.int("a").unwrap(), 10);
	}

	#[rstest]
	fn test_merge_overwrites_and_preserves() {
		let mut base = attrs! { "a" => 1, "b" => 2 };
		base.merge(attrs! { "b" => 3, "c" => 4 });
		assert_eq!(base.int("a").unwrap(), 1);
		assert_eq!(base.int("b").unwrap(), 3);
		assert_eq!(base.int("c").unwrap(), 4);
		let keys: Vec<_> = base.keys().cloned().collect();
		assert_eq!(keys, vec!["a", "b", "c"]);
	}

	#[rstest]
	fn test_missing_attribute_error() {
		let attrs = Attributes::new();
		let err = attrs.str("name").unwrap_err();
		assert!(matches!(err, FactoryError::MissingAttribute { key } if key == "name"));
	}

	#[rstest]
	#[case("string")]
	#[case("integer")]
	fn test_type_mismatch_error(#[case] expected: &str) {
		let attrs = attrs! { "flag" => true };
		let err = match expected {
			"string" => attrs.str("flag").unwrap_err(),
			_ => attrs.int("flag").unwrap_err(),
		};
		match err {
			FactoryError::AttributeType { key, found, .. } => {
				assert_eq!(key, "flag");
				assert_eq!(found, "boolean");
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[rstest]
	fn test_decode_json_value() {
		let attrs = attrs! { "tags" => json!(["a", "b"]) };
		let tags: Vec<String> = attrs.decode("tags").unwrap();
		assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
	}

	#[rstest]
	fn test_take_object_roundtrip() {
		#[derive(Debug, PartialEq)]
		struct Widget(u32);

		let mut attrs = Attributes::new();
		attrs.insert("widget", AttrValue::object(Widget(7)));
		let widget: Widget = attrs.take_object("widget").unwrap();
		assert_eq!(widget, Widget(7));
		assert!(!attrs.contains("widget"));
	}

	#[rstest]
	fn test_take_object_wrong_type_keeps_entry() {
		let mut attrs = attrs! { "widget" => 1 };
		let err = attrs.take_object::<String>("widget").unwrap_err();
		assert!(matches!(err, FactoryError::AttributeType { .. }));
		assert!(attrs.contains("widget"));
	}

	#[rstest]
	fn test_data_is_never_invoked_kind() {
		// Enum-like string data stays data; only the Gen tag marks a generator.
		let attrs = attrs! { "role" => "admin" };
		assert_eq!(attrs.get("role").unwrap().kind(), "string");
	}

	#[rstest]
	fn test_generator_sees_map() {
		let generator = Generator::new(|attrs| Ok(AttrValue::from(attrs.int("y")? + 1)));
		let out = generator.evaluate(&attrs! { "y" => 41 }).unwrap();
		assert_eq!(out, AttrValue::from(42));
	}

	#[rstest]
	fn test_order_sensitive_equality() {
		let a = attrs! { "x" => 1, "y" => 2 };
		let b = attrs! { "y" => 2, "x" => 1 };
		assert_ne!(a, b);
		assert_eq!(a, attrs! { "x" => 1, "y" => 2 });
	}
}
