use chrono::{DateTime, Local, Utc};

/// "just now", "5 minutes ago", "3 hours ago", "2 days ago". Anything older than
/// a week, or in the future, is shown as a local date.
pub fn relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(then).num_seconds();
    if secs < 0 || secs >= 7 * 86400 {
        let local: DateTime<Local> = then.into();
        return local.format("%Y-%m-%d %H:%M").to_string();
    }

    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "just now".to_string()
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
