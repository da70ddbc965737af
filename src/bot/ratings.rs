use regex::Regex;
use std::sync::OnceLock;

/// Ratings above this value are discarded as off-scale, never clamped.
pub const MAX_RATING: f64 = 10.0;

fn rating_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Leading number, optionally a hyphen-range: "7", "6.5", "7-8", "5.0-5.5".
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d+(\.\d+)?(-\d+(\.\d+)?)?").expect("rating pattern is valid")
    })
}

/// Extract zero-or-one rating from a comment body.
///
/// All whitespace is stripped first, then the pattern is matched at the
/// start of the text; trailing content is ignored. A hyphen-range collapses
/// to the arithmetic mean of its endpoints. Values above [`MAX_RATING`]
/// (after range collapse) produce `None`, as does any non-matching body.
pub fn extract_rating(body: &str) -> Option<f64> {
    let stripped: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let token = rating_pattern().find(&stripped)?.as_str();

    let rating = match token.split_once('-') {
        Some((low, high)) => {
            let low: f64 = low.parse().ok()?;
            let high: f64 = high.parse().ok()?;
            (low + high) / 2.0
        }
        None => token.parse().ok()?,
    };

    (rating <= MAX_RATING).then_some(rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_numbers() {
        assert_eq!(extract_rating("7"), Some(7.0));
        assert_eq!(extract_rating("0"), Some(0.0));
        assert_eq!(extract_rating("10"), Some(10.0));
    }

    #[test]
    fn parses_decimals() {
        assert_eq!(extract_rating("6.5"), Some(6.5));
        assert_eq!(extract_rating("8.25, very solid"), Some(8.25));
    }

    #[test]
    fn ranges_collapse_to_their_mean() {
        assert_eq!(extract_rating("7-8"), Some(7.5));
        assert_eq!(extract_rating("5.0-5.5"), Some(5.25));
        assert_eq!(extract_rating("5.0 - 5.5 imo"), Some(5.25));
    }

    #[test]
    fn whitespace_is_stripped_before_matching() {
        assert_eq!(extract_rating("  7 . 5  "), Some(7.5));
        assert_eq!(extract_rating("\n8\n"), Some(8.0));
    }

    #[test]
    fn trailing_text_is_ignored() {
        assert_eq!(extract_rating("9/10 would recommend"), Some(9.0));
        assert_eq!(extract_rating("6.5 but the lighting is bad"), Some(6.5));
    }

    #[test]
    fn off_scale_values_are_discarded() {
        assert_eq!(extract_rating("15"), None);
        assert_eq!(extract_rating("10.1"), None);
        // Range mean above the scale is rejected too.
        assert_eq!(extract_rating("11-13"), None);
        // ...but a range whose mean lands on the scale survives.
        assert_eq!(extract_rating("15-5"), Some(10.0));
    }

    #[test]
    fn non_numeric_leading_text_yields_nothing() {
        assert_eq!(extract_rating("not a number"), None);
        assert_eq!(extract_rating("about a 7"), None);
        assert_eq!(extract_rating(""), None);
        assert_eq!(extract_rating("-5"), None);
    }
}
