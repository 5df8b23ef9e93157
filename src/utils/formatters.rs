/// Magnitude suffixes for the Korean large-number scale, smallest to largest.
/// Each step is a factor of 10,000 (not 1,000): 만 = 10^4, 억 = 10^8,
/// 조 = 10^12, 경 = 10^16.
const SCALE_SUFFIXES: [&str; 5] = ["", "만", "억", "조", "경"];

/// Formats an integer-like value as a compact Korean-scale string with a unit.
///
/// Accepts anything stringly-numeric: the YouTube API reports counts as JSON
/// strings. Values that do not parse as an integer are returned unchanged, so
/// already-formatted or malformed input passes through instead of erroring.
///
/// Below 10,000 the value is rendered with thousands separators ("9,999회");
/// above, it is divided down the 만/억/조/경 ladder and rendered with at most
/// one decimal place, trailing ".0" stripped ("173만회", "-1.5만명").
pub fn format_compact(value: impl ToString, unit: &str) -> String {
    let raw = value.to_string();
    let parsed: i64 = match raw.trim().parse() {
        Ok(n) => n,
        Err(_) => return raw,
    };

    let mut value = parsed as f64;
    let mut idx = 0;
    while value.abs() >= 10_000.0 && idx < SCALE_SUFFIXES.len() - 1 {
        value /= 10_000.0;
        idx += 1;
    }

    if idx == 0 {
        return format!("{}{}", group_thousands(parsed), unit);
    }

    // One decimal place, with "173.0" collapsing to "173"
    let compact = format!("{:.1}", value);
    let compact = compact.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}{}", compact, SCALE_SUFFIXES[idx], unit)
}

/// Formats a view count ("1,234회" / "173만회")
pub fn format_views(value: impl ToString) -> String {
    format_compact(value, "회")
}

/// Formats a like/comment count ("9,999개" / "2.1만개")
pub fn format_count(value: impl ToString) -> String {
    format_compact(value, "개")
}

/// Formats a subscriber count ("173만명")
pub fn format_subscribers(value: impl ToString) -> String {
    format_compact(value, "명")
}

/// Inserts thousands separators into an integer, keeping the sign
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
