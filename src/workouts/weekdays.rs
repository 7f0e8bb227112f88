//! Week-day label interpretation.
//!
//! Plans keep their labels as free text. These helpers map the labels
//! the app produces (English and Portuguese names) onto calendar days;
//! anything else is left uninterpreted.

use chrono::Weekday;

/// Resolve a single label to a week day, ignoring case and surrounding
/// whitespace. Returns `None` for labels that name no day.
pub fn parse_weekday_label(label: &str) -> Option<Weekday> {
    let normalized = label.trim().to_lowercase();
    let normalized = normalized
        .strip_suffix("-feira")
        .unwrap_or(&normalized);

    let day = match normalized {
        "monday" | "mon" | "segunda" | "seg" => Weekday::Mon,
        "tuesday" | "tue" | "tues" | "terça" | "terca" | "ter" => Weekday::Tue,
        "wednesday" | "wed" | "quarta" | "qua" => Weekday::Wed,
        "thursday" | "thu" | "thurs" | "quinta" | "qui" => Weekday::Thu,
        "friday" | "fri" | "sexta" | "sex" => Weekday::Fri,
        "saturday" | "sat" | "sábado" | "sabado" | "sáb" | "sab" => Weekday::Sat,
        "sunday" | "sun" | "domingo" | "dom" => Weekday::Sun,
        _ => return None,
    };

    Some(day)
}

/// Resolve labels to the distinct days they name, Monday first.
pub fn resolve_weekdays(labels: &[String]) -> Vec<Weekday> {
    let mut days: Vec<Weekday> = labels
        .iter()
        .filter_map(|label| {
            let day = parse_weekday_label(label);
            if day.is_none() {
                tracing::debug!(label = %label, "Unrecognized week-day label");
            }
            day
        })
        .collect();

    days.sort_by_key(|day| day.num_days_from_monday());
    days.dedup();
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_english_labels() {
        assert_eq!(parse_weekday_label("Monday"), Some(Weekday::Mon));
        assert_eq!(parse_weekday_label("  wed "), Some(Weekday::Wed));
        assert_eq!(parse_weekday_label("SUNDAY"), Some(Weekday::Sun));
    }

    #[test]
    fn test_parse_portuguese_labels() {
        assert_eq!(parse_weekday_label("Segunda"), Some(Weekday::Mon));
        assert_eq!(parse_weekday_label("Terça-feira"), Some(Weekday::Tue));
        assert_eq!(parse_weekday_label("Sábado"), Some(Weekday::Sat));
        assert_eq!(parse_weekday_label("domingo"), Some(Weekday::Sun));
    }

    #[test]
    fn test_unknown_labels() {
        assert_eq!(parse_weekday_label(""), None);
        assert_eq!(parse_weekday_label("Leg day"), None);
        assert_eq!(parse_weekday_label("-feira"), None);
    }

    #[test]
    fn test_resolve_dedups_and_orders() {
        let labels: Vec<String> = ["Sexta", "Monday", "Friday", "Quarta", "??"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            resolve_weekdays(&labels),
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
        );
    }
}
