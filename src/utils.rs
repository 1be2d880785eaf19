use crate::pricing::HOURS_PER_MONTH;

/// Changes smaller than half a cent are reported as "no change"
pub const SIGNIFICANT_CHANGE: f64 = 0.005;

pub fn format_cost(amount: f64) -> String {
    format!("${:.2}", amount.abs())
}

/// `+$1.23`, `-$1.23`, or `$0.00` for changes below a cent
pub fn format_signed_cost(amount: f64) -> String {
    if amount.abs() < SIGNIFICANT_CHANGE {
        "$0.00".to_string()
    } else if amount > 0.0 {
        format!("+${:.2}", amount)
    } else {
        format!("-${:.2}", -amount)
    }
}

pub fn is_significant(amount: f64) -> bool {
    amount.abs() >= SIGNIFICANT_CHANGE
}

pub fn hourly_to_monthly(hourly: f64) -> f64 {
    hourly * HOURS_PER_MONTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(0.0), "$0.00");
        assert_eq!(format_cost(7.592), "$7.59");
        assert_eq!(format_cost(-10.0), "$10.00");
    }

    #[test]
    fn test_format_signed_cost() {
        assert_eq!(format_signed_cost(7.592), "+$7.59");
        assert_eq!(format_signed_cost(-10.0), "-$10.00");
        assert_eq!(format_signed_cost(0.0), "$0.00");
        assert_eq!(format_signed_cost(0.004), "$0.00");
        assert_eq!(format_signed_cost(-0.004), "$0.00");
    }

    #[test]
    fn test_is_significant() {
        assert!(!is_significant(0.0));
        assert!(!is_significant(1e-12));
        assert!(is_significant(0.01));
        assert!(is_significant(-0.01));
    }

    #[test]
    fn test_hourly_to_monthly() {
        assert_eq!(hourly_to_monthly(0.0), 0.0);
        assert!((hourly_to_monthly(0.0104) - 7.592).abs() < 1e-9);
    }
}
