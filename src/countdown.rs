//! Remaining-time label for the next coupon claim.

/// Human-readable remaining duration plus whether the claim is open now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub label: String,
    pub available: bool,
}

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_DAY: u64 = 86_400;

/// Describe the time remaining until `next_claim` as seen from `now`
/// (both unix timestamps in seconds).
///
/// A `next_claim` of zero means the claim schedule was never
/// initialized. Whole days/hours/minutes by integer division; seconds
/// are dropped, not rounded.
pub fn describe_remaining(next_claim: u64, now: u64) -> Countdown {
    if next_claim == 0 {
        return Countdown {
            label: "Not initialized".to_string(),
            available: false,
        };
    }

    if next_claim <= now {
        return Countdown {
            label: "Available now!".to_string(),
            available: true,
        };
    }

    let remaining = next_claim - now;
    let days = remaining / SECS_PER_DAY;
    let hours = (remaining % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (remaining % SECS_PER_HOUR) / SECS_PER_MINUTE;

    Countdown {
        label: format!("{days}d {hours}h {minutes}m remaining"),
        available: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_claim_time_is_uninitialized_for_any_now() {
        for now in [0, 1, 1_700_000_000, u64::MAX] {
            let countdown = describe_remaining(0, now);
            assert_eq!(countdown.label, "Not initialized");
            assert!(!countdown.available);
        }
    }

    #[test]
    fn exact_deadline_is_available() {
        let countdown = describe_remaining(1_700_000_000, 1_700_000_000);
        assert_eq!(countdown.label, "Available now!");
        assert!(countdown.available);
    }

    #[test]
    fn past_deadline_is_available() {
        let countdown = describe_remaining(1_699_999_999, 1_700_000_000);
        assert!(countdown.available);
    }

    #[test]
    fn future_deadline_decomposes_into_days_hours_minutes() {
        // 2 days, 3 hours, 4 minutes, 5 seconds ahead
        let remaining = 2 * 86_400 + 3 * 3_600 + 4 * 60 + 5;
        let now = 1_700_000_000;

        let countdown = describe_remaining(now + remaining, now);

        assert_eq!(countdown.label, "2d 3h 4m remaining");
        assert!(!countdown.available);
    }

    #[test]
    fn sub_minute_remainder_truncates_to_zero_minutes() {
        let now = 1_700_000_000;
        let countdown = describe_remaining(now + 59, now);
        assert_eq!(countdown.label, "0d 0h 0m remaining");
    }
}
