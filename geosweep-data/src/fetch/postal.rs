//! Postal-code validation and normalisation rules.
//!
//! GeoNames archives are tab-separated with the postal code in the second
//! column. Codes are despaced, standardised per country and validated
//! against the country's format; anything that does not match is dropped.
//! The result is deduplicated and sorted, so parsing the same archive twice
//! yields identical output.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

/// Countries whose postal codes are fetched by default — the ones that lean
/// heavily on postal-code search.
pub const DEFAULT_POSTAL_COUNTRIES: [&str; 10] =
    ["US", "CA", "GB", "DE", "JP", "FR", "IN", "AU", "NL", "IE"];

/// Countries GeoNames only publishes in the `_full` archive variant.
const FULL_ARCHIVE_COUNTRIES: [&str; 3] = ["NL", "CA", "GB"];

static POSTAL_FORMATS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    [
        ("US", r"^\d{5}$"),
        ("CA", r"^[A-Z]\d[A-Z]\s?\d[A-Z]\d$"),
        (
            "GB",
            r"^(?:[A-Z]{1,2}\d{1,2}[A-Z]?|[A-Z]{1,2}\d{1,2}[A-Z]?\s?\d[A-Z]{2})$",
        ),
        ("DE", r"^\d{5}$"),
        ("JP", r"^\d{3}-\d{4}$"),
        ("FR", r"^\d{5}$"),
        ("IN", r"^\d{6}$"),
        ("AU", r"^\d{4}$"),
        ("NL", r"^\d{4}[A-Z]{2}$"),
        ("IE", r"^[A-Z0-9]{3}$"),
    ]
    .into_iter()
    .map(|(country, pattern)| {
        (
            country,
            Regex::new(pattern).expect("postal format patterns are valid regexes"),
        )
    })
    .collect()
});

static JP_PLAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{7}$").expect("valid regex"));
static CA_PLAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]\d[A-Z]\d[A-Z]\d$").expect("valid regex"));
static GB_PLAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{1,2}\d{1,2}[A-Z]?)(\d[A-Z]{2})$").expect("valid regex")
});

/// Archive and entry names for a country's GeoNames download.
pub(crate) fn archive_names(country: &str) -> (String, String) {
    if FULL_ARCHIVE_COUNTRIES.contains(&country) {
        (format!("{country}_full.csv.zip"), format!("{country}_full.txt"))
    } else {
        (format!("{country}.zip"), format!("{country}.txt"))
    }
}

/// Bring a despaced code into the country's canonical written form.
fn standardise(code: String, country: &str) -> String {
    match country {
        "JP" if JP_PLAIN.is_match(&code) => {
            let (area, local) = code.split_at(3);
            format!("{area}-{local}")
        }
        "CA" if CA_PLAIN.is_match(&code) => {
            let (fsa, ldu) = code.split_at(3);
            format!("{fsa} {ldu}")
        }
        "GB" => GB_PLAIN.replace(&code, "$1 $2").into_owned(),
        _ => code,
    }
}

/// Parse the tab-separated archive entry into validated postal codes.
///
/// Countries without a format rule yield nothing, with a warning; a partial
/// dataset beats a failed bootstrap.
pub(crate) fn parse_archive_entry(data: &str, country: &str) -> Vec<String> {
    let Some(format) = POSTAL_FORMATS.get(country) else {
        log::warn!("no postal code format defined for {country}; skipping");
        return Vec::new();
    };

    let mut codes = BTreeSet::new();
    for line in data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(raw) = trimmed.split('\t').nth(1) else {
            continue;
        };
        let code = standardise(raw.trim().replace(' ', ""), country);
        if format.is_match(&code) {
            codes.insert(code);
        }
    }
    codes.into_iter().collect()
}
