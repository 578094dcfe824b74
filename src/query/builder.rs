//! Query builder
//!
//! Renders a [`FilterSpec`] into a [`QueryPlan`]. User-supplied values are
//! never written into the statement text; they travel as bound parameters
//! referenced through `{city:String}` and `{variant:String}`.

use std::collections::BTreeMap;

use tracing::debug;

use super::filter::FilterSpec;
use super::plan::QueryPlan;
use super::variant::render_condition;
use crate::error::{BuildError, Result};

/// Schema holding the driver tables
pub const DEFAULT_SCHEMA: &str = "atlas_driver_offer_bpp";

/// Placeholder name bound to the city
pub const CITY_PARAM: &str = "city";

/// Placeholder name bound to the requested variant
pub const VARIANT_PARAM: &str = "variant";

/// Whether a name can be used unescaped as a schema identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Builds driver token queries against one schema
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    schema: String,
}

impl QueryBuilder {
    /// Create a builder for the given schema.
    ///
    /// # Arguments
    /// * `schema` - Database holding `person`, `vehicle` and related tables
    ///
    /// # Returns
    /// * `Result<Self>` - Builder, or `BuildError::InvalidSchema`
    pub fn new(schema: &str) -> Result<Self> {
        if !is_identifier(schema) {
            return Err(BuildError::InvalidSchema(schema.to_string()).into());
        }
        Ok(Self {
            schema: schema.to_string(),
        })
    }

    /// Schema the statement reads from
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Build the plan for one export run.
    ///
    /// # Arguments
    /// * `spec` - Validated filter criteria
    ///
    /// # Returns
    /// * `Result<QueryPlan>` - Statement with `city` and `variant` bound
    pub fn build(&self, spec: &FilterSpec) -> Result<QueryPlan> {
        if !spec.is_valid() {
            return Err(BuildError::InvalidFilter(format!("{spec}")).into());
        }

        let mut parameters = BTreeMap::new();
        parameters.insert(CITY_PARAM.to_string(), spec.city().to_string());
        parameters.insert(VARIANT_PARAM.to_string(), spec.variant().to_string());

        let plan = QueryPlan::new(self.render_statement(), parameters)?;
        debug!("Built query plan for {}", spec);
        Ok(plan)
    }

    /// Render the fixed statement template for this schema.
    fn render_statement(&self) -> String {
        let s = &self.schema;
        let person = format!("`{s}`.`person`");
        let city = format!("{{{CITY_PARAM}:String}}");
        let variant = format!("{{{VARIANT_PARAM}:String}}");
        let variant_condition = render_condition("`Vehicle`.`variant`", &variant);

        format!(
            "SELECT
    {person}.`id` AS `driverId`,
    {person}.`device_token` AS `token`
FROM {person} FINAL
LEFT JOIN `{s}`.`driver_information` AS `Driver Information` FINAL
    ON {person}.`id` = `Driver Information`.`driver_id`
LEFT JOIN `{s}`.`merchant_operating_city` AS `Merchant Operating City`
    ON {person}.`merchant_operating_city_id` = `Merchant Operating City`.`id`
LEFT JOIN `{s}`.`vehicle` AS `Vehicle`
    ON {person}.`id` = `Vehicle`.`driver_id`
WHERE
    {person}.`device_token` IS NOT NULL
    AND {person}.`device_token` <> ''
    AND `Merchant Operating City`.`city` = {city}
    AND {variant_condition}"
        )
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }
}
