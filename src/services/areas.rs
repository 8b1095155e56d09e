//! City name to hh.ru area id lookup.

/// Known cities; keys are lowercase.
const AREAS: &[(&str, u32)] = &[
    ("москва", 1),
    ("санкт-петербург", 2),
    ("петербург", 2),
    ("спб", 2),
    ("екатеринбург", 3),
    ("новосибирск", 4),
    ("волгоград", 24),
    ("воронеж", 26),
    ("краснодар", 53),
    ("красноярск", 54),
    ("нижний новгород", 66),
    ("омск", 68),
    ("пермь", 70),
    ("ростов-на-дону", 76),
    ("самара", 78),
    ("саратов", 79),
    ("казань", 88),
    ("челябинск", 96),
    ("тюмень", 97),
    ("уфа", 99),
];

/// Resolve a location filter to an hh.ru area id.
///
/// Numeric input is taken as an area id already; unknown names yield `None`
/// and the search runs without an area restriction.
pub fn resolve_area(location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    if location.chars().all(|c| c.is_ascii_digit()) {
        return Some(location.to_string());
    }

    let needle = location.to_lowercase();
    AREAS
        .iter()
        .find(|(name, _)| *name == needle)
        .map(|(_, id)| id.to_string())
}
