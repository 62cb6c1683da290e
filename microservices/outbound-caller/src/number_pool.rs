//! Caller-ID number pools and FROM number selection
//!
//! A destination is matched by country first, then by the first two
//! characters of its E.164 number (`+` plus the leading dialing digit), and
//! finally falls back to the regional default.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;
use voxpool_core::{NumberDetails, Result, VoxpoolError};

/// Key under which the regional pool carries its fallback number
pub const DEFAULT_KEY: &str = "default";

/// Which tier of the pool produced the FROM number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSource {
    Country,
    Regional,
    Default,
}

/// ISO country code -> originating number
#[derive(Debug, Clone, Default)]
pub struct CountryNumberPool {
    numbers: HashMap<String, String>,
}

impl CountryNumberPool {
    /// Entries with a blank number are ignored.
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            numbers: non_empty(entries).collect(),
        }
    }

    pub fn get(&self, country_code: &str) -> Option<&str> {
        self.numbers.get(country_code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }
}

/// Two-character dialing prefix -> originating number, plus a required default
#[derive(Debug, Clone)]
pub struct RegionalNumberPool {
    prefixes: HashMap<String, String>,
    default: String,
}

impl RegionalNumberPool {
    /// Build a pool with an explicit default. A `default` key inside
    /// `entries` is ignored in favour of `default`.
    pub fn new(entries: impl IntoIterator<Item = (String, String)>, default: impl Into<String>) -> Result<Self> {
        let default = default.into().trim().to_string();
        if default.is_empty() {
            return Err(VoxpoolError::Config(
                "regional number pool has no default number (set DEFAULT_FROM_NUMBER)".to_string(),
            ));
        }

        let prefixes = non_empty(entries)
            .filter(|(prefix, _)| prefix != DEFAULT_KEY)
            .collect();

        Ok(Self { prefixes, default })
    }

    /// Build a pool whose default is the `default` entry of `entries`.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut prefixes: HashMap<String, String> = non_empty(entries).collect();
        let default = prefixes.remove(DEFAULT_KEY).unwrap_or_default();
        Self::new(prefixes, default)
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn default_number(&self) -> &str {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }
}

/// Country and regional pools injected into FROM number selection
#[derive(Debug, Clone)]
pub struct NumberPool {
    country: CountryNumberPool,
    regional: RegionalNumberPool,
}

impl NumberPool {
    pub fn new(country: CountryNumberPool, regional: RegionalNumberPool) -> Self {
        Self { country, regional }
    }

    /// Best FROM number to present for a call to `details`
    pub fn select(&self, details: &NumberDetails) -> &str {
        self.select_with_source(details).0
    }

    pub fn select_with_source(&self, details: &NumberDetails) -> (&str, SelectionSource) {
        if let Some(number) = details
            .country_code
            .as_deref()
            .and_then(|code| self.country.get(code))
        {
            debug!(country_code = ?details.country_code, from = %number, "Found a country number to use");
            return (number, SelectionSource::Country);
        }

        let prefix = dialing_prefix(&details.phone_number);
        match self.regional.get(prefix) {
            Some(number) => {
                debug!(prefix = %prefix, from = %number, "Using a regional number");
                (number, SelectionSource::Regional)
            }
            None => {
                let number = self.regional.default_number();
                debug!(prefix = %prefix, from = %number, "Using the default number");
                (number, SelectionSource::Default)
            }
        }
    }

    pub fn country(&self) -> &CountryNumberPool {
        &self.country
    }

    pub fn regional(&self) -> &RegionalNumberPool {
        &self.regional
    }
}

/// First two characters of `phone_number`, or all of it when shorter
pub fn dialing_prefix(phone_number: &str) -> &str {
    match phone_number.char_indices().nth(2) {
        Some((end, _)) => &phone_number[..end],
        None => phone_number,
    }
}

fn non_empty(entries: impl IntoIterator<Item = (String, String)>) -> impl Iterator<Item = (String, String)> {
    entries
        .into_iter()
        .map(|(key, number)| (key.trim().to_string(), number.trim().to_string()))
        .filter(|(key, number)| !key.is_empty() && !number.is_empty())
}
