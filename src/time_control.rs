//! Canadian byo-yomi clock.
//!
//! Data-only: `TimeControl` tracks remaining main time and byo-yomi state
//! and `advance_clock` applies a single move's elapsed time per spec.md
//! §6's transition rules (main time first, then byo-yomi periods with a
//! stone-count reset). Nothing here is wired into the UCT outer loop's
//! stop conditions — the search already consumes its own `Instant`-based
//! deadline; this module exists for callers that need to track a game
//! clock alongside it.

use std::time::Duration;

/// Canadian byo-yomi parameters and live counters for one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeControl {
    /// Seconds of main time remaining.
    pub main_time_remaining: Duration,
    /// Stones that must be played before the current byo-yomi period
    /// expires.
    pub byo_yomi_stones_remaining: u32,
    /// Time remaining in the current byo-yomi period.
    pub byo_yomi_time_remaining: Duration,
    /// Byo-yomi periods left after the current one expires.
    pub byo_yomi_periods_remaining: u32,
    pub byo_yomi_stones: u32,
    pub byo_yomi_time: Duration,
}

/// Outcome of consuming one move's elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockResult {
    /// Still within main time.
    InMainTime,
    /// Now in (or still in) byo-yomi, with periods left.
    InByoYomi,
    /// All byo-yomi periods are exhausted; the side is out of time.
    TimedOut,
}

impl TimeControl {
    pub fn new(main_time: Duration, byo_yomi_stones: u32, byo_yomi_time: Duration, byo_yomi_periods: u32) -> TimeControl {
        TimeControl {
            main_time_remaining: main_time,
            byo_yomi_stones_remaining: byo_yomi_stones,
            byo_yomi_time_remaining: byo_yomi_time,
            byo_yomi_periods_remaining: byo_yomi_periods,
            byo_yomi_stones,
            byo_yomi_time,
        }
    }

    /// Consume `elapsed` for one move. Main time is drawn down first; once
    /// it is exhausted the clock falls into byo-yomi, decrementing the
    /// stone counter per move and resetting both the stone counter and the
    /// period's time budget whenever the counter reaches zero without
    /// running out the period's clock. Running out of time within a period
    /// consumes one of the remaining periods; exhausting the last period
    /// times the side out.
    pub fn advance_clock(&mut self, elapsed: Duration) -> ClockResult {
        if !self.main_time_remaining.is_zero() {
            if elapsed <= self.main_time_remaining {
                self.main_time_remaining -= elapsed;
                return ClockResult::InMainTime;
            }
            let overflow = elapsed - self.main_time_remaining;
            self.main_time_remaining = Duration::ZERO;
            return self.spend_byo_yomi(overflow);
        }

        self.spend_byo_yomi(elapsed)
    }

    fn spend_byo_yomi(&mut self, elapsed: Duration) -> ClockResult {
        loop {
            if elapsed <= self.byo_yomi_time_remaining {
                self.byo_yomi_time_remaining -= elapsed;
                if self.byo_yomi_stones_remaining <= 1 {
                    self.byo_yomi_stones_remaining = self.byo_yomi_stones;
                    self.byo_yomi_time_remaining = self.byo_yomi_time;
                } else {
                    self.byo_yomi_stones_remaining -= 1;
                }
                return ClockResult::InByoYomi;
            }

            if self.byo_yomi_periods_remaining == 0 {
                self.byo_yomi_time_remaining = Duration::ZERO;
                return ClockResult::TimedOut;
            }
            self.byo_yomi_periods_remaining -= 1;
            self.byo_yomi_stones_remaining = self.byo_yomi_stones;
            self.byo_yomi_time_remaining = self.byo_yomi_time;
            return ClockResult::InByoYomi;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumes_main_time_first() {
        let mut tc = TimeControl::new(Duration::from_secs(60), 5, Duration::from_secs(30), 3);
        assert_eq!(tc.advance_clock(Duration::from_secs(10)), ClockResult::InMainTime);
        assert_eq!(tc.main_time_remaining, Duration::from_secs(50));
    }

    #[test]
    fn falls_into_byo_yomi_on_main_time_exhaustion() {
        let mut tc = TimeControl::new(Duration::from_secs(10), 5, Duration::from_secs(30), 3);
        let result = tc.advance_clock(Duration::from_secs(15));
        assert_eq!(result, ClockResult::InByoYomi);
        assert_eq!(tc.main_time_remaining, Duration::ZERO);
        assert_eq!(tc.byo_yomi_time_remaining, Duration::from_secs(25));
        assert_eq!(tc.byo_yomi_stones_remaining, 4);
    }

    #[test]
    fn stone_counter_resets_the_period_without_consuming_a_period() {
        let mut tc = TimeControl::new(Duration::ZERO, 1, Duration::from_secs(30), 3);
        assert_eq!(tc.advance_clock(Duration::from_secs(5)), ClockResult::InByoYomi);
        assert_eq!(tc.byo_yomi_stones_remaining, 1);
        assert_eq!(tc.byo_yomi_time_remaining, Duration::from_secs(30));
        assert_eq!(tc.byo_yomi_periods_remaining, 3);
    }

    #[test]
    fn running_out_a_period_consumes_one_period_and_resets() {
        let mut tc = TimeControl::new(Duration::ZERO, 5, Duration::from_secs(30), 2);
        let result = tc.advance_clock(Duration::from_secs(45));
        assert_eq!(result, ClockResult::InByoYomi);
        assert_eq!(tc.byo_yomi_periods_remaining, 1);
        assert_eq!(tc.byo_yomi_time_remaining, Duration::from_secs(30));
        assert_eq!(tc.byo_yomi_stones_remaining, 5);
    }

    #[test]
    fn exhausting_the_last_period_times_out() {
        let mut tc = TimeControl::new(Duration::ZERO, 5, Duration::from_secs(30), 0);
        let result = tc.advance_clock(Duration::from_secs(45));
        assert_eq!(result, ClockResult::TimedOut);
        assert_eq!(tc.byo_yomi_time_remaining, Duration::ZERO);
    }
}
