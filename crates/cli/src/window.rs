//! Recency window parsing for `--since`.
//!
//! Accepts `<n>d`, `<n>w`, `<n>m` or `<n>y` (days, weeks, 30-day months,
//! 365-day years), or a bare number of days.

/// Parse a compact window such as `3d` or `2w` into days.
pub fn parse_window(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    let (digits, days_per_unit) = match raw.char_indices().last() {
        Some((idx, unit)) if unit.is_ascii_alphabetic() => {
            let per_unit = match unit.to_ascii_lowercase() {
                'd' => 1,
                'w' => 7,
                'm' => 30,
                'y' => 365,
                other => return Err(format!("unknown window unit '{other}' (use d, w, m or y)")),
            };
            (&raw[..idx], per_unit)
        }
        Some(_) => (raw, 1),
        None => return Err("window must not be empty".to_string()),
    };

    let count: u32 = digits
        .parse()
        .map_err(|_| format!("invalid window '{raw}' (expected e.g. 3d, 2w, 1m)"))?;
    count
        .checked_mul(days_per_unit)
        .ok_or_else(|| format!("window '{raw}' is too large"))
}
