//! Game clock.
//!
//! Real seconds are converted into game minutes at a configurable rate. A day
//! lasts `day_length` minutes; reaching it rolls over to the next day at
//! minute zero.

use serde::{Deserialize, Serialize};

/// Default length of a day in game minutes.
pub const DEFAULT_DAY_LENGTH: u32 = 900;
/// Default game minutes per real second.
pub const DEFAULT_MINUTES_PER_SECOND: f64 = 1.0;

const MINUTES_PER_HOUR: u64 = 60;
const HOURS_PER_DAY: u64 = 24;

/// Day counter plus minutes into the current day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameClock {
    day: u32,
    time_minutes: f64,
    day_length: u32,
    minutes_per_second: f64,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(DEFAULT_DAY_LENGTH, DEFAULT_MINUTES_PER_SECOND)
    }
}

impl GameClock {
    /// A clock at day 1, minute 0.
    #[must_use]
    pub fn new(day_length: u32, minutes_per_second: f64) -> Self {
        Self {
            day: 1,
            time_minutes: 0.0,
            day_length: day_length.max(1),
            minutes_per_second: minutes_per_second.max(0.0),
        }
    }

    /// Current day, starting at 1.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Minutes into the current day.
    #[must_use]
    pub const fn time_minutes(&self) -> f64 {
        self.time_minutes
    }

    /// Length of a day in minutes.
    #[must_use]
    pub const fn day_length(&self) -> u32 {
        self.day_length
    }

    /// Game minutes per real second.
    #[must_use]
    pub const fn minutes_per_second(&self) -> f64 {
        self.minutes_per_second
    }

    /// Whole minutes into the day. This is the tick number.
    #[must_use]
    pub fn current_tick(&self) -> u32 {
        // time_minutes is kept in 0..day_length, which fits in u32.
        self.time_minutes.floor() as u32
    }

    /// Move time forward by `seconds` of real time.
    ///
    /// Returns `true` when the day boundary was reached. The new day starts
    /// at minute zero; any excess is dropped. Negative and NaN deltas do
    /// nothing.
    pub fn advance(&mut self, seconds: f64) -> bool {
        if seconds.is_nan() || seconds <= 0.0 {
            return false;
        }
        self.time_minutes += seconds * self.minutes_per_second;
        if self.time_minutes >= f64::from(self.day_length) {
            self.day = self.day.saturating_add(1);
            self.time_minutes = 0.0;
            return true;
        }
        false
    }

    /// Set the day and time directly, clamping into range.
    pub fn set(&mut self, day: u32, time_minutes: f64) {
        self.day = day.max(1);
        self.time_minutes = if time_minutes.is_finite() {
            time_minutes.clamp(0.0, f64::from(self.day_length))
        } else {
            0.0
        };
        if self.time_minutes >= f64::from(self.day_length) {
            self.time_minutes = 0.0;
        }
    }

    /// Display string in the form `Day D - HH:MM`.
    #[must_use]
    pub fn time_string(&self) -> String {
        let total = self.time_minutes.max(0.0) as u64;
        let hours = (total / MINUTES_PER_HOUR) % HOURS_PER_DAY;
        let minutes = total % MINUTES_PER_HOUR;
        format!("Day {} - {hours:02}:{minutes:02}", self.day)
    }

    /// Fraction of the day elapsed, in `0.0..1.0`.
    #[must_use]
    pub fn day_progress(&self) -> f64 {
        self.time_minutes / f64::from(self.day_length)
    }
}
