use chrono::Datelike;
use hb_common::series::{DisplayPoint, SeriesPoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DownsampleOptions {
    /// Series with at most this many points are returned unchanged.
    pub threshold: usize,
    /// Number of most recent points always kept at full resolution.
    pub tail: usize,
}

impl Default for DownsampleOptions {
    fn default() -> Self {
        Self {
            threshold: 30,
            tail: 20,
        }
    }
}

/// Reduces a chronological series for charting without losing any balance
/// transition.
///
/// Besides the first and the last point, a point is kept when it starts a
/// month, when it is one of the last `tail` points, or when its balance
/// differs from the last kept balance. In the last case the point before it is emitted too
/// (with the balance carried so far) if it was not already kept, so the
/// chart shows a step instead of a ramp.
pub fn downsample<P: SeriesPoint>(series: &[P], options: DownsampleOptions) -> Vec<DisplayPoint> {
    if series.len() <= options.threshold {
        return series.iter().map(SeriesPoint::to_display_point).collect();
    }

    let last_index = series.len() - 1;
    let tail_start = series.len().saturating_sub(options.tail);
    let mut kept: Vec<DisplayPoint> = Vec::new();
    let mut previous_kept = false;

    for (index, point) in series.iter().enumerate() {
        let keep = match kept.last() {
            None => true,
            Some(last) if last.balance != point.balance() => {
                if !previous_kept {
                    let step = DisplayPoint {
                        date: series[index - 1].date(),
                        balance: last.balance.clone(),
                    };
                    kept.push(step);
                }
                true
            }
            Some(_) => point.date().day() == 1 || index >= tail_start || index == last_index,
        };

        if keep {
            kept.push(point.to_display_point());
        }
        previous_kept = keep;
    }

    kept
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};

    use super::*;
    use crate::testutils::day;

    fn series(start: NaiveDate, balances: &[&str]) -> Vec<DisplayPoint> {
        balances
            .iter()
            .enumerate()
            .map(|(i, balance)| DisplayPoint {
                date: start + TimeDelta::days(i as i64),
                balance: balance.to_string(),
            })
            .collect()
    }

    fn constant_then<'a>(len: usize, change_at: usize, before: &'a str, after: &'a str) -> Vec<&'a str> {
        (0..len)
            .map(|i| if i < change_at { before } else { after })
            .collect()
    }

    #[test]
    fn test_short_series_is_unchanged() {
        let input = series(day(2024, 1, 1), &["1", "2", "2", "3"]);
        assert_eq!(downsample(&input, DownsampleOptions::default()), input);

        let input = series(day(2024, 1, 1), &vec!["5"; 30]);
        assert_eq!(downsample(&input, DownsampleOptions::default()), input);
    }

    #[test]
    fn test_step_before_jump() {
        // 40 days from Jan 1, constant for 35 days then a jump on day 36
        let balances = constant_then(40, 35, "10", "25");
        let input = series(day(2024, 1, 1), &balances);

        let output = downsample(&input, DownsampleOptions::default());

        let jump = output
            .iter()
            .position(|p| p.date == day(2024, 2, 5))
            .unwrap();
        assert_eq!(output[jump - 1].date, day(2024, 2, 4));
        assert_eq!(output[jump - 1].balance, "10");
        assert_eq!(output[jump].balance, "25");

        // first point plus the last 20 days (Jan 21 .. Feb 9, including Feb 1)
        let mut expected = vec![input[0].clone()];
        expected.extend_from_slice(&input[20..]);
        assert_eq!(output, expected);
    }

    #[test]
    fn test_transition_outside_tail_gets_a_step() {
        let balances = constant_then(90, 40, "1", "2");
        let input = series(day(2024, 1, 1), &balances);

        let output = downsample(&input, DownsampleOptions::default());

        let dates = output.iter().map(|p| (p.date, p.balance.as_str())).collect::<Vec<_>>();
        assert_eq!(
            &dates[..4],
            &[
                (day(2024, 1, 1), "1"),
                (day(2024, 2, 1), "1"),
                (day(2024, 2, 9), "1"),
                (day(2024, 2, 10), "2"),
            ]
        );
        assert_eq!(dates[4], (day(2024, 3, 1), "2"));
        assert_eq!(output.len(), 5 + 20);
        assert_eq!(output.last(), input.last());
    }

    #[test]
    fn test_no_duplicate_step_when_previous_point_was_kept() {
        // change right after a month start which is already kept
        let balances = constant_then(70, 32, "1", "2");
        let input = series(day(2024, 1, 1), &balances);

        let output = downsample(&input, DownsampleOptions::default());

        let feb: Vec<_> = output
            .iter()
            .filter(|p| p.date.month() == 2 && p.date.day() <= 2)
            .map(|p| (p.date, p.balance.as_str()))
            .collect();
        assert_eq!(feb, vec![(day(2024, 2, 1), "1"), (day(2024, 2, 2), "2")]);
    }

    #[test]
    fn test_keeps_every_transition() {
        let balances: Vec<&str> = (0..120)
            .map(|i| match i % 17 {
                0..=5 => "0",
                6..=11 => "7.5",
                _ => "3",
            })
            .collect();
        let input = series(day(2023, 11, 20), &balances);

        let output = downsample(&input, DownsampleOptions::default());

        assert_eq!(output.first(), input.first());
        assert_eq!(output.last(), input.last());

        // replaying the kept points yields the balance of every input day
        for point in &input {
            let shown = output
                .iter()
                .rev()
                .find(|kept| kept.date <= point.date)
                .unwrap();
            assert_eq!(shown.balance, point.balance, "on {}", point.date);
        }
    }

    #[test]
    fn test_idempotent() {
        let options = DownsampleOptions::default();
        for (len, change_at) in [(40, 35), (90, 40), (200, 3), (365, 180)] {
            let balances = constant_then(len, change_at, "4", "9");
            let input = series(day(2023, 6, 15), &balances);

            let once = downsample(&input, options);
            let twice = downsample(&once, options);
            assert_eq!(once, twice, "len {len}, change at {change_at}");
        }
    }

    #[test]
    fn test_last_point_kept_without_tail() {
        let options = DownsampleOptions {
            threshold: 30,
            tail: 0,
        };
        let input = series(day(2024, 1, 1), &vec!["3"; 40]);

        let output = downsample(&input, options);

        assert_eq!(
            output.iter().map(|p| p.date).collect::<Vec<_>>(),
            vec![day(2024, 1, 1), day(2024, 2, 1), day(2024, 2, 9)]
        );
        assert_eq!(output.last(), input.last());
        assert_eq!(downsample(&output, options), output);
    }

    #[test]
    fn test_custom_options() {
        let input = series(day(2024, 1, 2), &vec!["1"; 12]);
        let output = downsample(
            &input,
            DownsampleOptions {
                threshold: 5,
                tail: 3,
            },
        );
        assert_eq!(
            output.iter().map(|p| p.date).collect::<Vec<_>>(),
            vec![
                day(2024, 1, 2),
                day(2024, 1, 11),
                day(2024, 1, 12),
                day(2024, 1, 13)
            ]
        );
    }
}
