//! Vacancy listing data structures.
//!
//! `RawListing` mirrors one item of the hh.ru `/vacancies` response and is
//! validated exactly once by [`Listing::from_raw`]; everything past the
//! ingestion boundary works with the typed [`Listing`].

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::utils::group_thousands;

/// Longest title kept in storage, in grapheme clusters.
pub const MAX_TITLE_LEN: usize = 500;

/// Canonical textual form of `Listing::published_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A `{ "name": ... }` object as used by hh.ru for employer, area and experience.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Named {
    #[serde(default)]
    pub name: Option<String>,
}

/// Salary range as supplied by the source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawSalary {
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub to: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// A listing exactly as the search source returned it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawListing {
    /// External identifier; hh.ru sends a string but numbers are accepted too
    pub id: Option<Value>,
    pub name: Option<String>,
    pub employer: Option<Named>,
    pub salary: Option<RawSalary>,
    pub alternate_url: Option<String>,
    pub published_at: Option<String>,
    pub area: Option<Named>,
    pub experience: Option<Named>,
}

impl RawListing {
    /// Canonical string key of the external identifier, if one is present.
    pub fn external_id(&self) -> Option<String> {
        let id = match self.id.as_ref()? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!id.is_empty()).then_some(id)
    }

    pub fn employer_name(&self) -> Option<&str> {
        self.employer.as_ref().and_then(|e| e.name.as_deref())
    }

    pub fn area_name(&self) -> Option<&str> {
        self.area.as_ref().and_then(|a| a.name.as_deref())
    }

    pub fn experience_name(&self) -> Option<&str> {
        self.experience.as_ref().and_then(|e| e.name.as_deref())
    }
}

/// A normalised, persisted listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    /// Natural key from the source; unique across the store
    pub external_id: String,
    pub title: String,
    pub organization: String,
    pub salary_display: String,
    pub url: String,
    /// Publication time in UTC, whole seconds
    pub published_at: NaiveDateTime,
}

impl Listing {
    /// Validate and normalise a raw listing.
    ///
    /// Fails only when the external identifier is missing; an unreadable
    /// publication time falls back to `now`.
    pub fn from_raw(raw: &RawListing, now: DateTime<Utc>) -> Result<Self> {
        let external_id = raw
            .external_id()
            .ok_or_else(|| AppError::contract("listing", "missing external id"))?;

        let title = raw
            .name
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled");

        Ok(Self {
            external_id,
            title: truncate_graphemes(title, MAX_TITLE_LEN),
            organization: raw
                .employer_name()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or("Not specified")
                .to_string(),
            salary_display: render_salary(raw.salary.as_ref()),
            url: raw.alternate_url.clone().unwrap_or_default(),
            published_at: normalize_published_at(raw.published_at.as_deref().unwrap_or(""), now),
        })
    }

    /// `published_at` in its canonical textual form.
    pub fn published_at_text(&self) -> String {
        self.published_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Normalise a source timestamp to UTC, falling back to `now`.
///
/// Accepts a `Z` suffix, a `+HHMM` offset, a `+HH:MM` offset or no offset at
/// all (read as UTC).
pub fn normalize_published_at(raw: &str, now: DateTime<Utc>) -> NaiveDateTime {
    parse_published_at(raw).unwrap_or_else(|| {
        if !raw.trim().is_empty() {
            log::debug!("Unparsable published_at {:?}, using current time", raw);
        }
        let now = now.naive_utc();
        now.with_nanosecond(0).unwrap_or(now)
    })
}

fn parse_published_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()?;

    parsed.with_nanosecond(0)
}

/// Display symbol for a currency code; unknown codes are returned unchanged.
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "RUR" | "RUB" => "₽",
        "USD" => "$",
        "EUR" => "€",
        "KZT" => "₸",
        "UAH" => "₴",
        "BYR" => "Br",
        "AZN" => "₼",
        "UZS" => "сўм",
        "GEL" => "₾",
        other => other,
    }
}

/// Human-readable salary summary.
pub fn render_salary(salary: Option<&RawSalary>) -> String {
    let Some(salary) = salary else {
        return "not specified".to_string();
    };

    let symbol = currency_symbol(salary.currency.as_deref().unwrap_or("RUR"));
    let from = salary.from.filter(|v| *v > 0);
    let to = salary.to.filter(|v| *v > 0);

    match (from, to) {
        (Some(from), Some(to)) => format!(
            "{} - {} {}",
            group_thousands(from),
            group_thousands(to),
            symbol
        ),
        (Some(from), None) => format!("from {} {}", group_thousands(from), symbol),
        (None, Some(to)) => format!("up to {} {}", group_thousands(to), symbol),
        (None, None) => "not specified".to_string(),
    }
}

fn truncate_graphemes(text: &str, max: usize) -> String {
    text.graphemes(true).take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    fn salary(from: Option<i64>, to: Option<i64>, currency: &str) -> RawSalary {
        RawSalary {
            from,
            to,
            currency: Some(currency.to_string()),
        }
    }

    #[test]
    fn test_offset_shapes_normalize_to_same_instant() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        for raw in [
            "2024-01-01T10:00:00Z",
            "2024-01-01T13:00:00+0300",
            "2024-01-01T13:00:00+03:00",
        ] {
            assert_eq!(normalize_published_at(raw, now()), expected, "input {raw}");
        }
    }

    #[test]
    fn test_canonical_text_has_no_offset() {
        let raw = RawListing {
            id: Some(Value::String("1".into())),
            published_at: Some("2024-01-01T13:00:00+0300".into()),
            ..RawListing::default()
        };
        let listing = Listing::from_raw(&raw, now()).unwrap();
        assert_eq!(listing.published_at_text(), "2024-01-01T10:00:00");
    }

    #[test]
    fn test_unparsable_timestamp_falls_back_to_now() {
        assert_eq!(
            normalize_published_at("yesterday", now()),
            now().naive_utc()
        );
        assert_eq!(normalize_published_at("", now()), now().naive_utc());
    }

    #[test]
    fn test_salary_open_lower_bound() {
        let s = salary(Some(100_000), None, "RUR");
        assert_eq!(render_salary(Some(&s)), "from 100,000 ₽");
    }

    #[test]
    fn test_salary_open_upper_bound() {
        let s = salary(None, Some(80_000), "KZT");
        assert_eq!(render_salary(Some(&s)), "up to 80,000 ₸");
    }

    #[test]
    fn test_salary_closed_range() {
        let s = salary(Some(100_000), Some(150_000), "USD");
        assert_eq!(render_salary(Some(&s)), "100,000 - 150,000 $");
    }

    #[test]
    fn test_salary_not_specified() {
        let s = salary(None, None, "RUR");
        assert_eq!(render_salary(Some(&s)), "not specified");
        assert_eq!(render_salary(None), "not specified");
    }

    #[test]
    fn test_unknown_currency_is_kept() {
        let s = salary(Some(5_000), None, "CHF");
        assert_eq!(render_salary(Some(&s)), "from 5,000 CHF");
    }

    #[test]
    fn test_external_id_normalization() {
        let mut raw = RawListing {
            id: Some(Value::String(" 93453 ".into())),
            ..RawListing::default()
        };
        assert_eq!(raw.external_id().as_deref(), Some("93453"));

        raw.id = Some(serde_json::json!(93453));
        assert_eq!(raw.external_id().as_deref(), Some("93453"));

        raw.id = Some(Value::String("   ".into()));
        assert!(raw.external_id().is_none());

        raw.id = None;
        assert!(Listing::from_raw(&raw, now()).is_err());
    }

    #[test]
    fn test_from_hh_payload() {
        let raw: RawListing = serde_json::from_value(serde_json::json!({
            "id": "101",
            "name": "Rust developer",
            "employer": { "name": "Acme", "trusted": true },
            "salary": { "from": 200000, "to": null, "currency": "RUR", "gross": false },
            "alternate_url": "https://hh.ru/vacancy/101",
            "published_at": "2024-03-05T09:30:00+0300",
            "area": { "id": "1", "name": "Москва" },
            "snippet": { "requirement": "..." }
        }))
        .unwrap();

        let listing = Listing::from_raw(&raw, now()).unwrap();
        assert_eq!(listing.external_id, "101");
        assert_eq!(listing.title, "Rust developer");
        assert_eq!(listing.organization, "Acme");
        assert_eq!(listing.salary_display, "from 200,000 ₽");
        assert_eq!(listing.published_at_text(), "2024-03-05T06:30:00");
        assert_eq!(raw.area_name(), Some("Москва"));
    }

    #[test]
    fn test_missing_fields_get_placeholders() {
        let raw = RawListing {
            id: Some(Value::String("7".into())),
            employer: Some(Named { name: None }),
            ..RawListing::default()
        };
        let listing = Listing::from_raw(&raw, now()).unwrap();
        assert_eq!(listing.title, "Untitled");
        assert_eq!(listing.organization, "Not specified");
        assert_eq!(listing.salary_display, "not specified");
        assert!(listing.url.is_empty());
    }

    #[test]
    fn test_long_title_is_truncated() {
        let raw = RawListing {
            id: Some(Value::String("8".into())),
            name: Some("я".repeat(MAX_TITLE_LEN + 20)),
            ..RawListing::default()
        };
        let listing = Listing::from_raw(&raw, now()).unwrap();
        assert_eq!(listing.title.chars().count(), MAX_TITLE_LEN);
    }
}
