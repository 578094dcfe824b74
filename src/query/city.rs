//! City code resolution
//!
//! The operations dashboard identifies cities by telephone-style codes
//! (`std:080`) while the `merchant_operating_city` table stores display
//! names (`Bangalore`). This module maps one to the other so either form can
//! be passed on the command line.

/// A known operating city
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityEntry {
    /// Dashboard code, e.g. `std:011`
    pub code: &'static str,
    /// Name stored in the city column
    pub name: &'static str,
    /// Grouping used when listing cities
    pub region: &'static str,
}

const fn city(code: &'static str, name: &'static str, region: &'static str) -> CityEntry {
    CityEntry { code, name, region }
}

/// Prefix shared by all dashboard city codes
pub const CITY_CODE_PREFIX: &str = "std:";

/// Every city the dashboard knows about, grouped by region.
pub const KNOWN_CITIES: &[CityEntry] = &[
    city("std:080", "Bangalore", "South India"),
    city("std:040", "Hyderabad", "South India"),
    city("std:044", "Chennai", "South India"),
    city("std:0422", "Tamil Nadu Cities", "South India"),
    city("std:0816", "Tumakuru", "South India"),
    city("std:0821", "Mysore", "South India"),
    city("std:0413", "Pondicherry", "South India"),
    city("std:08192", "Davanagere", "South India"),
    city("std:08182", "Shivamogga", "South India"),
    city("std:0836", "Hubli", "South India"),
    city("std:0824", "Mangalore", "South India"),
    city("std:08200", "Udupi", "South India"),
    city("std:0431", "Trichy", "South India"),
    city("std:04344", "Hosur", "South India"),
    city("std:0427", "Salem", "South India"),
    city("std:0452", "Madurai", "South India"),
    city("std:0416", "Vellore", "South India"),
    city("std:04362", "Thanjavur", "South India"),
    city("std:0462", "Tirunelveli", "South India"),
    city("std:08682", "Nalgonda", "South India"),
    city("std:8482", "Bidar", "South India"),
    city("std:08472", "Gulbarga", "South India"),
    city("std:0870", "Warangal", "South India"),
    city("std:011", "Delhi", "North India"),
    city("std:0124", "Gurugram", "North India"),
    city("std:01189", "Noida", "North India"),
    city("std:0172", "Chandigarh", "North India"),
    city("std:0141", "Jaipur", "North India"),
    city("std:0194", "Srinagar", "North India"),
    city("std:022", "Mumbai", "West India"),
    city("std:020", "Pune", "West India"),
    city("std:033", "Kolkata", "East India"),
    city("std:0353", "Siliguri", "East India"),
    city("std:0341", "Asansol", "East India"),
    city("std:0342", "Durgapur", "East India"),
    city("std:03215", "Petrapole", "East India"),
    city("std:0674", "Bhubaneshwar", "East India"),
    city("std:0671", "Cuttack", "East India"),
    city("std:06752", "Puri", "East India"),
    city("std:0661", "Rourkela", "East India"),
    city("std:0484", "Kochi", "Kerala"),
    city("std:0495", "Kozhikode", "Kerala"),
    city("std:0487", "Thrissur", "Kerala"),
    city("std:0471", "Trivandrum", "Kerala"),
    city("std:001", "Paris", "International"),
    city("std:0820", "Minneapolis", "International"),
];

/// Look up a city by its dashboard code (case-insensitive prefix).
pub fn lookup_code(code: &str) -> Option<&'static CityEntry> {
    let code = code.trim();
    let digits = code
        .get(..CITY_CODE_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(CITY_CODE_PREFIX))
        .map(|_| &code[CITY_CODE_PREFIX.len()..])?;

    KNOWN_CITIES
        .iter()
        .find(|entry| &entry.code[CITY_CODE_PREFIX.len()..] == digits)
}

/// Resolve user input to the name stored in the city column.
///
/// Codes known to the table resolve to their display name; anything else,
/// including unknown codes, is returned unchanged.
pub fn resolve_city(input: &str) -> &str {
    match lookup_code(input) {
        Some(entry) => entry.name,
        None => input,
    }
}
