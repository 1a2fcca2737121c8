//! XML Schema validators
//!
//! Schema components, the compiler that builds them into a [`Grammar`],
//! and the evaluator that validates documents against it.

// Datatypes
mod helpers;
pub mod builtins;
pub mod facets;
pub mod simple_types;

// Structures
pub mod attributes;
pub mod complex_types;
pub mod elements;
pub mod groups;
pub mod particles;
pub mod wildcards;
pub mod grammar;

// Compilation
mod builders;
pub mod parsing;

// Validation
mod document_validation;
mod models;
pub mod validation;

// Re-exports
pub use builtins::{BuiltinType, XsdValue};
pub use grammar::{ElementId, Grammar, TypeDefinition, TypeId};
pub use parsing::{compile_schema, CompileOptions, SchemaSource};
pub use validation::{
    ContextState, ValidationContext, ValidationOptions, ValidationReport, ValidationSummary,
};
