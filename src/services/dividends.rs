// src/services/dividends.rs
//
// Dividend cadence estimation and forward date projection. Both are pure;
// the projector is recomputed per expiration because each has its own
// horizon.
use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::models::{CadenceEstimate, DividendRecord};

const DAYS_PER_YEAR: f64 = 365.25;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Infer the payment cadence from the trailing 12 months of history.
///
/// Frequency is floored at 1 so every downstream division stays defined; a
/// stock with no history gets a zero yearly dividend and the floor.
pub fn estimate_cadence(history: &[DividendRecord], purchase: DateTime<Utc>) -> CadenceEstimate {
    let window_start = purchase - Duration::days(365);
    let recent: Vec<&DividendRecord> =
        history.iter().filter(|r| r.date >= window_start).collect();

    let frequency = recent.len().max(1) as u32;
    let yearly_dividend: f64 = recent.iter().map(|r| r.amount).sum();

    // Average the raw gaps between trailing-year payments when we have at
    // least two; otherwise fall back to an even split of the year. The
    // linear average is deliberate: it holds up against sparse or irregular
    // histories where schedule detection would not.
    let fallback = DAYS_PER_YEAR / frequency as f64;
    let average_interval_days = if recent.len() >= 2 {
        let gaps: Vec<f64> = recent
            .windows(2)
            .map(|pair| (pair[1].date - pair[0].date).num_days() as f64)
            .collect();
        let avg = gaps.iter().sum::<f64>() / gaps.len() as f64;
        if avg > 0.0 { avg } else { fallback }
    } else {
        fallback
    };

    let last_payment = history.last().map(|r| r.date);

    // First known payment after purchase; failing that, step out from the
    // last payment by the nominal gap for the observed frequency.
    let next_payment = history
        .iter()
        .map(|r| r.date)
        .find(|d| *d > purchase)
        .or_else(|| {
            last_payment.map(|last| {
                let step = if frequency >= 12 {
                    30 // monthly
                } else if frequency == 6 {
                    180 // semiannual
                } else {
                    90 // quarterly by default
                };
                last + Duration::days(step)
            })
        });

    debug!(
        "cadence: frequency={} yearly={:.4} interval={:.1}d",
        frequency, yearly_dividend, average_interval_days
    );

    CadenceEstimate {
        frequency,
        yearly_dividend,
        average_interval_days,
        last_payment,
        next_payment,
    }
}

/// Extrapolate payment dates forward from the last known payment at a fixed
/// interval, stopping at the horizon. Strictly increasing, all strictly
/// after `last_known`, all at or before `horizon`. Deterministic for a given
/// input triple.
pub fn project_payment_dates(
    last_known: DateTime<Utc>,
    interval_days: f64,
    horizon: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let step = Duration::milliseconds((interval_days * MS_PER_DAY) as i64);
    let mut dates = Vec::new();
    if step <= Duration::zero() {
        return dates;
    }

    let mut next = last_known + step;
    while next <= horizon {
        dates.push(next);
        next = next + step;
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::to_utc_midnight;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        to_utc_midnight(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn quarterly_history() -> Vec<DividendRecord> {
        vec![
            DividendRecord { date: day(2023, 3, 17), amount: 0.80 },
            DividendRecord { date: day(2023, 6, 16), amount: 0.80 },
            DividendRecord { date: day(2023, 9, 15), amount: 0.80 },
            DividendRecord { date: day(2023, 12, 15), amount: 0.80 },
        ]
    }

    #[test]
    fn empty_history_hits_the_frequency_floor() {
        let cadence = estimate_cadence(&[], day(2024, 1, 1));
        assert_eq!(cadence.frequency, 1);
        assert_eq!(cadence.yearly_dividend, 0.0);
        assert!(cadence.average_interval_days > 0.0);
        assert!((cadence.average_interval_days - DAYS_PER_YEAR).abs() < 1e-9);
        assert!(cadence.last_payment.is_none());
        assert!(cadence.next_payment.is_none());
    }

    #[test]
    fn quarterly_history_yields_four_payments_and_91_day_gaps() {
        let cadence = estimate_cadence(&quarterly_history(), day(2024, 1, 1));
        assert_eq!(cadence.frequency, 4);
        assert!((cadence.yearly_dividend - 3.20).abs() < 1e-9);
        assert!((cadence.average_interval_days - 91.0).abs() < 1e-9);
        assert!((cadence.single_dividend() - 0.80).abs() < 1e-9);
        assert_eq!(cadence.last_payment, Some(day(2023, 12, 15)));
    }

    #[test]
    fn single_recent_payment_falls_back_to_even_split() {
        let history = vec![DividendRecord { date: day(2023, 11, 1), amount: 1.50 }];
        let cadence = estimate_cadence(&history, day(2024, 1, 1));
        assert_eq!(cadence.frequency, 1);
        assert!((cadence.average_interval_days - DAYS_PER_YEAR).abs() < 1e-9);
    }

    #[test]
    fn stale_history_outside_the_window_still_floors_frequency() {
        // Payments older than a year contribute nothing to the estimate.
        let history = vec![
            DividendRecord { date: day(2021, 6, 1), amount: 1.00 },
            DividendRecord { date: day(2021, 9, 1), amount: 1.00 },
        ];
        let cadence = estimate_cadence(&history, day(2024, 1, 1));
        assert_eq!(cadence.frequency, 1);
        assert_eq!(cadence.yearly_dividend, 0.0);
        // Next payment falls back to last known + 90 days.
        assert_eq!(cadence.next_payment, Some(day(2021, 11, 30)));
    }

    #[test]
    fn next_payment_prefers_a_known_future_date() {
        let mut history = quarterly_history();
        history.push(DividendRecord { date: day(2024, 3, 15), amount: 0.80 });
        let cadence = estimate_cadence(&history, day(2024, 1, 1));
        assert_eq!(cadence.next_payment, Some(day(2024, 3, 15)));
    }

    #[test]
    fn projection_is_strictly_increasing_and_bounded() {
        let dates = project_payment_dates(day(2023, 12, 15), 91.0, day(2025, 6, 1));
        assert!(!dates.is_empty());
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for d in &dates {
            assert!(*d > day(2023, 12, 15));
            assert!(*d <= day(2025, 6, 1));
        }
    }

    #[test]
    fn projection_matches_the_quarterly_example() {
        let dates = project_payment_dates(day(2023, 12, 15), 91.0, day(2024, 10, 1));
        let expected = vec![day(2024, 3, 15), day(2024, 6, 14), day(2024, 9, 13)];
        assert_eq!(dates, expected);
    }

    #[test]
    fn projection_is_deterministic() {
        let a = project_payment_dates(day(2023, 12, 15), 30.44, day(2024, 12, 31));
        let b = project_payment_dates(day(2023, 12, 15), 30.44, day(2024, 12, 31));
        assert_eq!(a, b);
    }

    #[test]
    fn projection_past_horizon_is_empty() {
        let dates = project_payment_dates(day(2024, 1, 1), 365.25, day(2024, 6, 1));
        assert!(dates.is_empty());
    }

    #[test]
    fn non_positive_interval_projects_nothing() {
        let dates = project_payment_dates(day(2024, 1, 1), 0.0, day(2025, 1, 1));
        assert!(dates.is_empty());
    }
}
