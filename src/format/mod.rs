//! Pure formatting helpers for the report renderer.
//!
//! Everything here is a total function over its inputs: no provider calls,
//! no shared state. Prices arrive as decimal strings because on-chain quotes
//! can carry more significant digits than an f64 holds.

use num_format::{Locale, ToFormattedString};

const SUFFIXES: [&str; 5] = ["", "k", "M", "B", "T"];
const CAPPED: &str = ">999T";

/// Significant digits kept when slicing a sub-unit decimal string.
const PRICE_SIG_DIGITS: usize = 4;

/// Semantic category of a percent change. Zero is neutral, absence is
/// neutral, never "0%".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    pub fn of(change: Option<f64>) -> Self {
        match change {
            Some(v) if v > 0.0 => Tone::Positive,
            Some(v) if v < 0.0 => Tone::Negative,
            _ => Tone::Neutral,
        }
    }

    fn color(self) -> &'static str {
        match self {
            Tone::Positive => "green",
            Tone::Negative => "red",
            Tone::Neutral => "grey",
        }
    }
}

/// Compact magnitude with k/M/B/T suffixes.
///
/// Values below 1 come back as their plain decimal string so sub-unit token
/// prices keep their precision. 1000 promotes exactly once ("1k"). Beyond
/// the suffix table (>= 10^15) the result is a capped placeholder.
pub fn format_compact(value: f64) -> String {
    if value < 1.0 {
        return value.to_string();
    }
    let mut scaled = value;
    let mut suffix = 0usize;
    while scaled >= 1000.0 && suffix + 1 < SUFFIXES.len() {
        scaled /= 1000.0;
        suffix += 1;
    }
    if scaled >= 1000.0 {
        return CAPPED.to_string();
    }
    format!("{}{}", three_significant(scaled), SUFFIXES[suffix])
}

/// Truncate a scaled value to 3 significant digits by cutting the decimal
/// string at the position implied by the decimal point: "1.234" and "12.34"
/// keep 4 characters, "123.4" keeps 3.
fn three_significant(value: f64) -> String {
    let s = value.to_string();
    let cut = match s.find('.') {
        Some(i) if i <= 2 => s.len().min(4),
        Some(i) => i,
        None => s.len(),
    };
    s[..cut].trim_end_matches('.').to_string()
}

/// Fixed-precision price string.
///
/// Above 1 the value gets thousands separators and exactly 2 fractional
/// digits. At or below 1 the input is treated as a decimal string and sliced
/// to its leading zeros plus the first 4 significant digits, unrounded, so
/// tiny token prices never collapse to "0.00". No digits are fabricated when
/// fewer than 4 are present.
pub fn format_price(raw: &str) -> String {
    if let Ok(value) = raw.trim().parse::<f64>() {
        if value > 1.0 {
            return thousands_2dp(value);
        }
    }
    let s = raw.trim();
    for (i, c) in s.char_indices() {
        if c == '0' || c == '.' {
            continue;
        }
        return s[..s.len().min(i + PRICE_SIG_DIGITS)].to_string();
    }
    "0.0".to_string()
}

/// Thousands-separated value with exactly 2 fractional digits.
pub fn thousands_2dp(value: f64) -> String {
    let cents = (value * 100.0).round() as i128;
    let whole = cents / 100;
    let frac = (cents % 100).abs();
    format!("{}.{:02}", whole.to_formatted_string(&Locale::en), frac)
}

/// Dollar-prefixed thousands-separated amount.
pub fn format_money(value: f64) -> String {
    format!("${}", thousands_2dp(value))
}

/// Lark font markup for a signed percent change. Positive is green,
/// negative red, zero grey; absence renders a grey placeholder glyph.
pub fn percent_tag(change: Option<f64>) -> String {
    let tone = Tone::of(change);
    let text = match change {
        Some(v) if v > 0.0 => format!("+{:.2}%", v),
        Some(v) => format!("{:.2}%", v),
        None => "-".to_string(),
    };
    font(&text, tone.color())
}

/// Wrap provider-supplied percent strings ("+750.66%", "-20.57%", "0%") in
/// the color markup implied by their sign character.
pub fn percent_str_tag(change: &str) -> String {
    let tone = match change.chars().next() {
        Some('+') => Tone::Positive,
        Some('-') => Tone::Negative,
        _ => Tone::Neutral,
    };
    font(change, tone.color())
}

fn font(text: &str, color: &str) -> String {
    format!("<font color='{}'>{}</font>", color, text)
}

/// Parse a GeckoTerminal percent-change string ("+750.66%") to a signed f64.
pub fn percent_str_to_f64(change: &str) -> Option<f64> {
    change.trim().trim_end_matches('%').parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_keeps_values_below_one_thousand() {
        assert_eq!(format_compact(999.0), "999");
        assert_eq!(format_compact(1.0), "1");
        assert_eq!(format_compact(12.34), "12.3");
    }

    #[test]
    fn compact_promotes_at_exactly_one_thousand() {
        assert_eq!(format_compact(1000.0), "1k");
        assert_eq!(format_compact(1500.0), "1.5k");
        assert_eq!(format_compact(1234.0), "1.23k");
    }

    #[test]
    fn compact_walks_the_suffix_table() {
        assert_eq!(format_compact(12_345.0), "12.3k");
        assert_eq!(format_compact(123_456.0), "123k");
        assert_eq!(format_compact(1_000_000.0), "1M");
        assert_eq!(format_compact(2_500_000_000.0), "2.5B");
        assert_eq!(format_compact(7.2e12), "7.2T");
    }

    #[test]
    fn compact_caps_beyond_the_table() {
        assert_eq!(format_compact(1e15), ">999T");
        assert_eq!(format_compact(999.0e12), "999T");
    }

    #[test]
    fn compact_passes_sub_unit_values_through() {
        assert_eq!(format_compact(0.0005), "0.0005");
        assert_eq!(format_compact(0.25), "0.25");
    }

    #[test]
    fn compact_is_monotone_across_suffix_boundaries() {
        let implied = |s: &str| -> f64 {
            let mult = match s.chars().last().unwrap() {
                'k' => 1e3,
                'M' => 1e6,
                'B' => 1e9,
                'T' => 1e12,
                _ => 1.0,
            };
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse::<f64>().unwrap() * mult
        };
        let inputs = [1.0, 999.0, 1000.0, 1001.0, 999_999.0, 1e6, 5e7, 1e9, 1e12];
        for pair in inputs.windows(2) {
            assert!(implied(&format_compact(pair[0])) <= implied(&format_compact(pair[1])));
        }
    }

    #[test]
    fn price_above_one_gets_separators_and_two_decimals() {
        assert_eq!(format_price("1234.5"), "1,234.50");
        assert_eq!(format_price("96.21072492112380322"), "96.21");
        assert_eq!(format_price("1000000"), "1,000,000.00");
    }

    #[test]
    fn price_below_one_keeps_significant_digits_unrounded() {
        assert_eq!(format_price("0.000123"), "0.000123");
        assert_eq!(format_price("0.00012345"), "0.0001234");
        assert_eq!(
            format_price("0.0000035787470186645913"),
            "0.000003578"
        );
    }

    #[test]
    fn price_handles_degenerate_strings() {
        assert_eq!(format_price("0"), "0.0");
        assert_eq!(format_price("0.0000"), "0.0");
        assert_eq!(format_price("1"), "1");
    }

    #[test]
    fn tone_maps_sign_to_category() {
        assert_eq!(Tone::of(Some(3.1)), Tone::Positive);
        assert_eq!(Tone::of(Some(-5.2)), Tone::Negative);
        assert_eq!(Tone::of(Some(0.0)), Tone::Neutral);
        assert_eq!(Tone::of(None), Tone::Neutral);
    }

    #[test]
    fn percent_tag_colors_by_sign() {
        assert_eq!(percent_tag(Some(3.1)), "<font color='green'>+3.10%</font>");
        assert_eq!(percent_tag(Some(-5.2)), "<font color='red'>-5.20%</font>");
        assert_eq!(percent_tag(Some(0.0)), "<font color='grey'>0.00%</font>");
    }

    #[test]
    fn absent_percent_renders_placeholder_not_zero() {
        let tag = percent_tag(None);
        assert_eq!(tag, "<font color='grey'>-</font>");
        assert!(!tag.contains("0%"));
    }

    #[test]
    fn provider_percent_strings_keep_their_text() {
        assert_eq!(
            percent_str_tag("+750.66%"),
            "<font color='green'>+750.66%</font>"
        );
        assert_eq!(
            percent_str_tag("-20.57%"),
            "<font color='red'>-20.57%</font>"
        );
        assert_eq!(percent_str_tag("0%"), "<font color='grey'>0%</font>");
    }

    #[test]
    fn percent_strings_parse_to_signed_floats() {
        assert_eq!(percent_str_to_f64("+750.66%"), Some(750.66));
        assert_eq!(percent_str_to_f64("-20.57%"), Some(-20.57));
        assert_eq!(percent_str_to_f64("0%"), Some(0.0));
        assert_eq!(percent_str_to_f64("n/a"), None);
    }

    #[test]
    fn money_is_dollar_prefixed() {
        assert_eq!(format_money(36843550.91), "$36,843,550.91");
        assert_eq!(format_money(150.0), "$150.00");
    }
}
