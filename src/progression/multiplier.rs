use crate::models::ExperienceEvent;

/// Compose the XP multiplier from the events active for a user on a date.
/// Each event contributes its bonus over the 1.00 baseline; overlapping
/// events stack additively, never multiplicatively.
pub fn resolve_multiplier(active_events: &[ExperienceEvent]) -> f64 {
    active_events
        .iter()
        .fold(1.0, |acc, event| acc + (event.multiplier - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(multiplier: f64) -> ExperienceEvent {
        ExperienceEvent {
            id: format!("event-{multiplier}"),
            name: "bonus".to_string(),
            multiplier,
            starts_on: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            ends_on: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            user_id: None,
        }
    }

    #[test]
    fn test_no_events_is_exactly_one() {
        assert_eq!(resolve_multiplier(&[]), 1.0);
    }

    #[test]
    fn test_single_event_bonus() {
        assert_eq!(resolve_multiplier(&[event(1.5)]), 1.5);
    }

    #[test]
    fn test_overlapping_events_stack_additively() {
        // 1.0 + 0.5 + 1.0 = 2.5, not 1.5 * 2.0 = 3.0
        assert_eq!(resolve_multiplier(&[event(1.5), event(2.0)]), 2.5);
    }

    #[test]
    fn test_three_way_stack() {
        let m = resolve_multiplier(&[event(1.25), event(1.25), event(1.5)]);
        assert!((m - 2.0).abs() < 1e-9);
    }
}
