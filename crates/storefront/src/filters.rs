//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the swatch color for a product color name.
///
/// Unknown names fall back to a neutral grey.
///
/// Usage in templates: `{{ color|color_hex }}`
#[askama::filter_fn]
pub fn color_hex(color: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(swatch(&color.to_string()))
}

/// Renders a rating as five stars, e.g. `4.6` becomes `★★★★★` and `3.2`
/// becomes `★★★☆☆`.
///
/// Usage in templates: `{{ product.rating|stars }}`
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let rating: f64 = rating.to_string().parse().unwrap_or(0.0);
    let filled = (1..=5).filter(|star| f64::from(*star) <= rating.round()).count();
    Ok("★".repeat(filled) + &"☆".repeat(5 - filled))
}

fn swatch(color: &str) -> &'static str {
    match color.to_ascii_lowercase().as_str() {
        "black" => "#000000",
        "white" => "#ffffff",
        "silver" | "stainless" => "#c0c0c0",
        "blue" => "#3b82f6",
        "navy" => "#1e3a8a",
        "red" => "#ef4444",
        "green" => "#22c55e",
        "pink" => "#ec4899",
        "purple" => "#a855f7",
        "brown" => "#92400e",
        "tan" => "#d2b48c",
        "gray" | "grey" => "#6b7280",
        "charcoal" => "#36454f",
        "cream" => "#fffdd0",
        "rose-gold" => "#b76e79",
        "terracotta" => "#e2725b",
        "burgundy" => "#800020",
        "natural" => "#e8d8b8",
        _ => "#9ca3af",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swatch_is_case_insensitive() {
        assert_eq!(swatch("Black"), "#000000");
        assert_eq!(swatch("stainless"), swatch("silver"));
        assert_eq!(swatch("plaid"), "#9ca3af");
    }
}
