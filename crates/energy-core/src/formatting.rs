/// Format a kWh value with its shortest round-trip representation, always
/// showing at least one fractional digit.
///
/// This is the single policy for per-building totals, summary-table cells and
/// the peak reading.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::format_kwh;
///
/// assert_eq!(format_kwh(15.0), "15.0");
/// assert_eq!(format_kwh(7.5), "7.5");
/// assert_eq!(format_kwh(0.1 + 0.2), "0.30000000000000004");
/// ```
pub fn format_kwh(value: f64) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains('.') && !s.contains('e') {
        format!("{}.0", s)
    } else {
        s
    }
}

/// Format `value` with exactly `decimals` fractional digits and no grouping.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::format_fixed;
///
/// assert_eq!(format_fixed(22.0, 2), "22.00");
/// assert_eq!(format_fixed(1234.567, 2), "1234.57");
/// assert_eq!(format_fixed(0.0, 0), "0");
/// ```
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.prec$}", value, prec = decimals)
}

/// Format a campus total in kWh with two decimals, e.g. `"22.00 kWh"`.
pub fn format_total_kwh(value: f64) -> String {
    format!("{} kWh", format_fixed(value, 2))
}
