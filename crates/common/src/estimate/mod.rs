//! Short-term rental income estimation
//!
//! One heuristic shared by the interactive calculator and the application
//! pipeline: a nightly rate built from the property type plus fixed
//! premiums, scaled by a market multiplier and converted to a monthly
//! figure at a fixed booking and occupancy assumption.

use serde::{Deserialize, Serialize};

/// Nightly rate for property types missing from [`BASE_RATES`]
pub const DEFAULT_BASE_RATE: f64 = 120.0;

/// Base nightly rate by property type
pub const BASE_RATES: &[(&str, f64)] = &[
    ("apartment", 120.0),
    ("house", 200.0),
    ("condo", 150.0),
    ("townhouse", 180.0),
    ("villa", 350.0),
    ("studio", 80.0),
    ("loft", 160.0),
    ("other", 140.0),
];

/// Market multiplier by normalized city name
pub const CITY_MULTIPLIERS: &[(&str, f64)] = &[
    ("miami", 1.8),
    ("new york", 2.2),
    ("los angeles", 1.9),
    ("chicago", 1.5),
    ("houston", 1.3),
    ("phoenix", 1.4),
    ("philadelphia", 1.4),
    ("san antonio", 1.2),
];

pub const BEDROOM_PREMIUM: f64 = 30.0;
pub const BATHROOM_PREMIUM: f64 = 15.0;
pub const AMENITY_PREMIUM: f64 = 10.0;
pub const FURNISHED_PREMIUM: f64 = 50.0;

/// Nights booked per month at full demand
pub const BOOKED_DAYS_PER_MONTH: f64 = 25.0;

/// Share of booked nights actually occupied
pub const OCCUPANCY_RATE: f64 = 0.75;

/// Ceiling for any reported figure: exact in JSON numbers and in a BIGINT
pub const MAX_REPORTED_AMOUNT: u64 = 9_007_199_254_740_991;

/// Property attributes the estimate depends on
#[derive(Debug, Clone, Copy)]
pub struct PropertyProfile<'a> {
    pub property_type: &'a str,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub amenity_count: usize,
    pub furnished: bool,
    pub city: &'a str,
}

/// Projected income for one property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeEstimate {
    /// Market-adjusted nightly rate, rounded
    pub nightly_rate: u64,

    /// Short-term rental income per month, rounded
    pub monthly_income: u64,

    /// Twelve rounded months
    pub annual_income: u64,

    /// Comparable long-term lease income per month, rounded
    pub long_term_monthly: u64,

    /// Short-term over long-term uplift in percent, rounded
    pub increase_percent: i64,
}

/// Look up the base nightly rate for a property type
pub fn base_rate(property_type: &str) -> f64 {
    let key = property_type.trim().to_ascii_lowercase();
    BASE_RATES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, rate)| *rate)
        .unwrap_or(DEFAULT_BASE_RATE)
}

/// Look up the market multiplier for a city; unknown cities are neutral
pub fn city_multiplier(city: &str) -> f64 {
    let key = normalize_city(city);
    CITY_MULTIPLIERS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0)
}

/// `"San-Antonio, TX"` and `"san antonio"` share a key
fn normalize_city(city: &str) -> String {
    let name = city.split(',').next().unwrap_or_default();
    name.trim()
        .to_ascii_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Market-adjusted nightly rate before rounding, never negative
pub fn nightly_rate(profile: &PropertyProfile<'_>) -> f64 {
    let mut rate = base_rate(profile.property_type);
    rate += (profile.bedrooms - 1.0) * BEDROOM_PREMIUM;
    rate += (profile.bathrooms - 1.0) * BATHROOM_PREMIUM;
    rate += profile.amenity_count as f64 * AMENITY_PREMIUM;
    if profile.furnished {
        rate += FURNISHED_PREMIUM;
    }

    (rate * city_multiplier(profile.city)).max(0.0)
}

/// Round to whole currency units, capped at [`MAX_REPORTED_AMOUNT`]
fn whole(amount: f64) -> u64 {
    amount.round().clamp(0.0, MAX_REPORTED_AMOUNT as f64) as u64
}

/// Projected monthly income in whole currency units
pub fn monthly_income(profile: &PropertyProfile<'_>) -> u64 {
    whole(nightly_rate(profile) * BOOKED_DAYS_PER_MONTH * OCCUPANCY_RATE)
}

/// Full estimate including the long-term lease comparison
pub fn estimate(profile: &PropertyProfile<'_>) -> IncomeEstimate {
    let nightly = nightly_rate(profile);
    let monthly = nightly * BOOKED_DAYS_PER_MONTH * OCCUPANCY_RATE;
    let long_term = nightly * 30.0 * 0.6 / 3.0;
    let increase = if long_term > 0.0 {
        (monthly - long_term) / long_term * 100.0
    } else {
        0.0
    };

    let monthly_income = whole(monthly);

    IncomeEstimate {
        nightly_rate: whole(nightly),
        monthly_income,
        annual_income: monthly_income.saturating_mul(12).min(MAX_REPORTED_AMOUNT),
        long_term_monthly: whole(long_term),
        increase_percent: increase.round() as i64,
    }
}
