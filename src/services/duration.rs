//! Human-readable charge durations

const SECS_PER_DAY: i64 = 86_400;

/// Format fractional hours as `"<days> days HH:MM:SS"`, rounded to the
/// nearest whole second (ties to even).
///
/// Negative durations keep a positive clock part with negative days, e.g.
/// -1 hour is `"-1 days +23:00:00"`.
///
/// # Examples
/// ```
/// use zaptec_reporter::services::duration::format_hours;
///
/// assert_eq!(format_hours(279.0285275), "11 days 15:01:43");
/// assert_eq!(format_hours(10.500001), "0 days 10:30:00");
/// ```
pub fn format_hours(hours: f64) -> String {
    let total = (hours * 3600.0).round_ties_even();
    if !total.is_finite() {
        return "NaT".to_string();
    }
    let total = total as i64;

    let days = total.div_euclid(SECS_PER_DAY);
    let rem = total.rem_euclid(SECS_PER_DAY);
    let clock = format!("{:02}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);

    if days < 0 {
        format!("{} days +{}", days, clock)
    } else {
        format!("{} days {}", days, clock)
    }
}
