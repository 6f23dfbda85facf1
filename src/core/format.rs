//! Display formatting for metric readings.

/// Renders readings as whole numbers.
///
/// Values are truncated toward zero, never rounded. Readings are expected to
/// be non-negative; negative and NaN inputs clamp to `0`, and values beyond
/// `u64::MAX` saturate.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricFormatter;

impl MetricFormatter {
    pub fn format(value: f64) -> String {
        truncate(value).to_string()
    }
}

fn truncate(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= u64::MAX as f64 {
        u64::MAX
    } else {
        value.trunc() as u64
    }
}

/// Shorthand for [`MetricFormatter::format`].
pub fn format_metric(value: f64) -> String {
    MetricFormatter::format(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_instead_of_rounding() {
        assert_eq!(format_metric(72.9), "72");
        assert_eq!(format_metric(72.1), "72");
        assert_eq!(format_metric(0.0), "0");
        assert_eq!(format_metric(0.99), "0");
    }

    #[test]
    fn test_no_thousands_separator() {
        assert_eq!(format_metric(12345.6), "12345");
    }

    #[test]
    fn test_out_of_range_inputs_clamp() {
        assert_eq!(format_metric(-5.0), "0");
        assert_eq!(format_metric(f64::NAN), "0");
        assert_eq!(format_metric(f64::INFINITY), u64::MAX.to_string());
    }

    #[test]
    fn test_integer_part_for_many_values() {
        for whole in [1u64, 9, 10, 61, 100, 9_999, 1_000_000] {
            for frac in [0.0, 0.25, 0.5, 0.999] {
                assert_eq!(format_metric(whole as f64 + frac), whole.to_string());
            }
        }
    }
}
