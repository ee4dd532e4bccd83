//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a 1-5 rating as filled and hollow stars.
///
/// Usage in templates: `{{ review.rating|stars }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let filled = rating.to_string().parse::<usize>().unwrap_or(0).min(5);
    let mut out = "★".repeat(filled);
    out.push_str(&"☆".repeat(5 - filled));
    Ok(out)
}
