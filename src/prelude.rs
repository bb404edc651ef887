//! Convenience re-exports for common usage.
//!
//! This module provides a single import for the most commonly used items
//! from the warhol crate.
//!
//! # Example
//!
//! ```ignore
//! use warhol::prelude::*;
//!
//! // Now you have access to:
//! // - Factory traits and builders
//! // - Attribute map types and the attrs! macro
//! // - Registry and configuration functions
//! // - Error types
//! ```

// Error types
pub use crate::error::{FactoryError, FactoryResult};

// Attribute types and the attrs! literal macro
pub use crate::attrs;
pub use crate::attrs::{AttrValue, Attributes, DynObject, Generator};

// Factory traits and builders
pub use crate::factory::builder::{Builder, Made};
pub use crate::factory::compose::{Composer, StateLayer};
pub use crate::factory::construct::{Construction, ConstructionStrategy, ParamMap};
pub use crate::factory::faker::Faker;
pub use crate::factory::registry::{DynBuilder, FactoryRegistry};
pub use crate::factory::{Factory, FromAttributes, HasFactory};

// Faker sequence functions
pub use crate::factory::faker::{next_sequence, reset_sequences, sequence};

// Registry functions
pub use crate::factory::registry::{
	clear_factories, dispatch, factory_for, factory_for_name, guess_names_using, has_factory,
	make_for, register, register_as, reset_name_resolver, resolve_factory_name,
};

// Configuration
pub use crate::config::{FactoryConfig, FactoryMethod, config, configure, reset_config};

// Container
pub use crate::container::Container;
