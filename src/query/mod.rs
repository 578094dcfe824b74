//! Query construction
//!
//! Turns command-line selection criteria into an executable plan:
//!
//! 1. **FilterSpec**: validated city and vehicle-variant criteria
//! 2. **QueryBuilder**: renders the fixed driver-token statement
//! 3. **QueryPlan**: statement plus bound parameters, ready for an executor

pub mod builder;
pub mod city;
pub mod filter;
pub mod plan;
pub mod variant;

pub use builder::{DEFAULT_SCHEMA, QueryBuilder, is_identifier};
pub use city::{CityEntry, KNOWN_CITIES, resolve_city};
pub use filter::FilterSpec;
pub use plan::QueryPlan;
pub use variant::{
    ALL_VARIANTS, CATCH_ALL_VARIANT, EXACT_MATCH_VARIANTS, VariantBranch, matching_branches,
};
