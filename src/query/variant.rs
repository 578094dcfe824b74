//! Vehicle-variant matching rules
//!
//! A requested variant selects vehicles through three branches joined with
//! OR. Each branch renders its own SQL fragment and can also be evaluated
//! in-process against a single vehicle variant, which keeps the SQL and the
//! documented semantics in one place.

/// Requested variant that selects every vehicle with a known variant
pub const ALL_VARIANTS: &str = "ALL";

/// Catch-all category covering every variant outside the exact-match set
pub const CATCH_ALL_VARIANT: &str = "CAB";

/// Variants that only match when requested by their exact name
pub const EXACT_MATCH_VARIANTS: &[&str] = &["AUTO_RICKSHAW", "BIKE"];

/// Whether a variant belongs to the exact-match set
pub fn is_exact_match(variant: &str) -> bool {
    EXACT_MATCH_VARIANTS.contains(&variant)
}

/// One arm of the variant condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantBranch {
    /// `ALL` requested and the vehicle has a variant
    Any,
    /// Vehicle is in the exact-match set and equals the request
    Exact,
    /// Vehicle is outside the exact-match set and `CAB` was requested
    CatchAll,
}

impl VariantBranch {
    /// All branches in render order
    pub const BRANCHES: [VariantBranch; 3] = [
        VariantBranch::Any,
        VariantBranch::Exact,
        VariantBranch::CatchAll,
    ];

    /// Render the branch as a parenthesised SQL predicate.
    ///
    /// # Arguments
    /// * `column` - Fully quoted vehicle variant column
    /// * `placeholder` - Bound parameter placeholder for the requested variant
    ///
    /// # Returns
    /// * `String` - SQL predicate containing no user-supplied text
    pub fn render(&self, column: &str, placeholder: &str) -> String {
        match self {
            VariantBranch::Any => {
                format!("({placeholder} = '{ALL_VARIANTS}' AND {column} IS NOT NULL)")
            }
            VariantBranch::Exact => format!(
                "({column} IN ({set}) AND {placeholder} = {column})",
                set = exact_match_list()
            ),
            VariantBranch::CatchAll => format!(
                "({column} NOT IN ({set}) AND {column} IS NOT NULL AND {placeholder} = '{CATCH_ALL_VARIANT}')",
                set = exact_match_list()
            ),
        }
    }

    /// Evaluate the branch for one vehicle.
    ///
    /// # Arguments
    /// * `requested` - Normalized requested variant
    /// * `vehicle` - The vehicle's variant, `None` when the join found no vehicle
    ///
    /// # Returns
    /// * `bool` - True if the SQL predicate would hold for this row
    pub fn holds(&self, requested: &str, vehicle: Option<&str>) -> bool {
        match (self, vehicle) {
            (_, None) => false,
            (VariantBranch::Any, Some(_)) => requested == ALL_VARIANTS,
            (VariantBranch::Exact, Some(v)) => is_exact_match(v) && requested == v,
            (VariantBranch::CatchAll, Some(v)) => {
                !is_exact_match(v) && requested == CATCH_ALL_VARIANT
            }
        }
    }
}

/// Render the full OR-combined variant condition.
pub fn render_condition(column: &str, placeholder: &str) -> String {
    let branches: Vec<String> = VariantBranch::BRANCHES
        .iter()
        .map(|branch| branch.render(column, placeholder))
        .collect();
    format!("({})", branches.join("\n                OR "))
}

/// Branches that hold for a vehicle; a row matches when this is non-empty.
pub fn matching_branches(requested: &str, vehicle: Option<&str>) -> Vec<VariantBranch> {
    VariantBranch::BRANCHES
        .into_iter()
        .filter(|branch| branch.holds(requested, vehicle))
        .collect()
}

fn exact_match_list() -> String {
    EXACT_MATCH_VARIANTS
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
