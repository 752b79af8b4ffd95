use std::collections::BTreeSet;

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    pub last_activity: Option<NaiveDate>,
}

/// Current and longest runs of consecutive activity days.
///
/// The current streak is alive while the latest activity is today or
/// yesterday. Duplicate dates count once and future dates are ignored.
pub fn compute_streak(dates: &[NaiveDate], today: NaiveDate) -> StreakState {
    let days: BTreeSet<NaiveDate> = dates.iter().copied().filter(|d| *d <= today).collect();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &day in &days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }

    let last_activity = days.last().copied();
    let alive = last_activity
        .map(|last| last == today || last.succ_opt() == Some(today))
        .unwrap_or(false);

    StreakState {
        current: if alive { run } else { 0 },
        longest,
        last_activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(compute_streak(&[], d(10)), StreakState::default());
    }

    #[test]
    fn test_streak_ending_today() {
        let state = compute_streak(&[d(8), d(9), d(10)], d(10));
        assert_eq!(state.current, 3);
        assert_eq!(state.longest, 3);
        assert_eq!(state.last_activity, Some(d(10)));
    }

    #[test]
    fn test_streak_ending_yesterday_still_counts() {
        let state = compute_streak(&[d(7), d(8), d(9)], d(10));
        assert_eq!(state.current, 3);
    }

    #[test]
    fn test_broken_streak_resets_current_only() {
        let state = compute_streak(&[d(1), d(2), d(3), d(4), d(7)], d(10));
        assert_eq!(state.current, 0);
        assert_eq!(state.longest, 4);
    }

    #[test]
    fn test_duplicates_and_unsorted_input() {
        let state = compute_streak(&[d(10), d(9), d(9), d(8), d(10)], d(10));
        assert_eq!(state.current, 3);
        assert_eq!(state.longest, 3);
    }

    #[test]
    fn test_month_boundary() {
        let dates = [NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(), d(1)];
        assert_eq!(compute_streak(&dates, d(1)).current, 2);
    }

    #[test]
    fn test_future_dates_ignored() {
        let state = compute_streak(&[d(9), d(10), d(11)], d(10));
        assert_eq!(state.current, 2);
        assert_eq!(state.last_activity, Some(d(10)));
    }
}
