//! Label and tick formatting helpers

/// `speed_metrics.units_per_second` → `Speed Metrics.Units Per Second`.
///
/// Underscores become spaces and every letter that starts a word is
/// upper-cased; other characters are left alone.
pub fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut at_word_start = true;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Escape text for inclusion in HTML or SVG markup
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Y-axis tick label: `M` above a million, `K` above a thousand, otherwise
/// the value at the precision of the tick step
pub fn compact_tick(value: f64, step: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{}M", trim_number(value / 1_000_000.0))
    } else if value >= 1_000.0 {
        format!("{}K", trim_number(value / 1_000.0))
    } else {
        format_tick_with_step(value, step)
    }
}

/// Format `v` with just enough decimals to distinguish multiples of `step`
pub fn format_tick_with_step(v: f64, step: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }

    let decimals = decimals_for_step(step);
    let v = round_to_decimals(v, decimals);
    let v = if v == 0.0 { 0.0 } else { v };

    format!("{v:.decimals$}")
}

/// Shortest decimal rendering, at most three fractional digits
pub fn trim_number(v: f64) -> String {
    let text = format!("{:.3}", round_to_decimals(v, 3));
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// A 1/2/5 × 10ⁿ step dividing `[0, max]` into roughly `target` intervals
pub fn nice_step(max: f64, target: usize) -> f64 {
    if !max.is_finite() || max <= 0.0 || target == 0 {
        return 1.0;
    }
    let raw = max / target as f64;
    let magnitude = 10_f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn decimals_for_step(step: f64) -> usize {
    let step = step.abs();
    if step == 0.0 || !step.is_finite() {
        return 0;
    }
    (0..=6)
        .find(|&decimals| is_approx_integer(step * 10_f64.powi(decimals as i32)))
        .unwrap_or(6)
}

fn is_approx_integer(x: f64) -> bool {
    if !x.is_finite() {
        return false;
    }
    (x - x.round()).abs() <= 1e-9 * x.abs().max(1.0)
}

fn round_to_decimals(x: f64, decimals: usize) -> f64 {
    if decimals == 0 {
        return x.round();
    }
    let factor = 10_f64.powi(decimals.min(9) as i32);
    (x * factor).round() / factor
}
