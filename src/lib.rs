//! Composable object factories for test fixtures and seed data.
//!
//! Warhol builds plain Rust values from declarative factory definitions,
//! in the spirit of Factory Bot and Laravel's model factories:
//!
//! - **Factory definitions**: default attributes described as ordered maps
//! - **State composition**: immutable builders layering partial overrides
//! - **Lazy attributes**: generators and nested factories resolved at make time
//! - **Construction recipes**: map-consuming, parameter-mapped, or container-provided
//! - **Registry**: process-wide lookup by factory name or target type
//!
//! # Quick Start
//!
//! Define a factory for your type:
//!
//! ```ignore
//! use warhol::prelude::*;
//!
//! struct User {
//!     name: String,
//!     email: String,
//!     active: bool,
//! }
//!
//! impl FromAttributes for User {
//!     fn from_attributes(attrs: Attributes) -> FactoryResult<Self> {
//!         Ok(Self {
//!             name: attrs.string("name")?,
//!             email: attrs.string("email")?,
//!             active: attrs.boolean("active")?,
//!         })
//!     }
//! }
//!
//! #[derive(Default)]
//! struct UserFactory;
//!
//! impl Factory for UserFactory {
//!     type Target = User;
//!
//!     fn definition(&self, faker: &Faker) -> Attributes {
//!         attrs! {
//!             "name" => faker.name(),
//!             "email" => faker.email(),
//!             "active" => true,
//!         }
//!     }
//!
//!     fn construction(&self) -> Construction<User> {
//!         Construction::from_map()
//!     }
//! }
//!
//! // One instance with an override:
//! let user = UserFactory::new()
//!     .state(attrs! { "active" => false })
//!     .make_one()?;
//!
//! // A batch of three:
//! let users = UserFactory::new().count(3).make()?;
//! assert_eq!(users.len(), 3);
//! ```
//!
//! # Architecture
//!
//! ## Attribute maps
//!
//! - [`Attributes`](attrs::Attributes) - Ordered attribute map fed to construction
//! - [`AttrValue`](attrs::AttrValue) - Plain data, shared objects, generators, nested factories
//! - [`Generator`](attrs::Generator) - Lazy attribute computed from its siblings
//!
//! ## Factory system
//!
//! - [`Factory`](factory::Factory) trait - Definition, construction recipe, configuration
//! - [`Builder`](factory::builder::Builder) - Immutable fluent chain ending in a make
//! - [`Composer`](factory::compose::Composer) - Left-to-right state folding
//! - [`Construction`](factory::construct::Construction) - How an attribute map becomes a value
//! - [`Faker`](factory::faker::Faker) - Fake-value source handed to definitions
//!
//! ## Registry
//!
//! - [`register`](factory::registry::register) / [`make_for`](factory::registry::make_for) - Lookup by name or target type
//! - [`dispatch`](factory::registry::dispatch) - String-driven resolution for seed scripts
//! - [`FactoryConfig`](config::FactoryConfig) - Naming and method conventions

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod attrs;
pub mod config;
pub mod container;
pub mod error;
pub mod factory;
pub mod prelude;

// Re-export commonly used types at crate root
pub use attrs::{AttrValue, Attributes, DynObject, Generator};
pub use config::FactoryConfig;
pub use container::Container;
pub use error::{FactoryError, FactoryResult};
pub use factory::builder::{Builder, Made};
pub use factory::compose::{Composer, StateLayer};
pub use factory::construct::{Construction, ConstructionStrategy, ParamMap};
pub use factory::faker::Faker;
pub use factory::registry::FactoryRegistry;
pub use factory::{Factory, FromAttributes, HasFactory};
