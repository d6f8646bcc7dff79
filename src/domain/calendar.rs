//! Trading calendar and intraday session phases.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};
use std::collections::BTreeSet;

/// Exchange calendar: weekends plus an explicit holiday list.
#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    pub fn new<I: IntoIterator<Item = NaiveDate>>(holidays: I) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    pub fn next_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut d = date + Duration::days(1);
        while !self.is_trading_day(d) {
            d += Duration::days(1);
        }
        d
    }

    pub fn previous_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut d = date - Duration::days(1);
        while !self.is_trading_day(d) {
            d -= Duration::days(1);
        }
        d
    }

    /// Number of trading days in `(from, to]`. Zero when `to <= from`.
    pub fn trading_days_between(&self, from: NaiveDate, to: NaiveDate) -> usize {
        if to <= from {
            return 0;
        }
        let mut count = 0;
        let mut d = from + Duration::days(1);
        while d <= to {
            if self.is_trading_day(d) {
                count += 1;
            }
            d += Duration::days(1);
        }
        count
    }

    pub fn holiday_count(&self) -> usize {
        self.holidays.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    PreOpen,
    Morning,
    Lunch,
    Afternoon,
    Closed,
}

const MORNING_OPEN: (u32, u32) = (9, 30);
const MORNING_CLOSE: (u32, u32) = (11, 30);
const AFTERNOON_OPEN: (u32, u32) = (13, 0);
const AFTERNOON_CLOSE: (u32, u32) = (15, 0);

pub const SESSION_MINUTES: u32 = 240;

fn minute_of_day(h: u32, m: u32) -> u32 {
    h * 60 + m
}

impl SessionPhase {
    pub fn at(time: NaiveTime) -> Self {
        let t = minute_of_day(time.hour(), time.minute());
        if t < minute_of_day(MORNING_OPEN.0, MORNING_OPEN.1) {
            SessionPhase::PreOpen
        } else if t < minute_of_day(MORNING_CLOSE.0, MORNING_CLOSE.1) {
            SessionPhase::Morning
        } else if t < minute_of_day(AFTERNOON_OPEN.0, AFTERNOON_OPEN.1) {
            SessionPhase::Lunch
        } else if t < minute_of_day(AFTERNOON_CLOSE.0, AFTERNOON_CLOSE.1) {
            SessionPhase::Afternoon
        } else {
            SessionPhase::Closed
        }
    }

    pub fn is_trading(self) -> bool {
        matches!(self, SessionPhase::Morning | SessionPhase::Afternoon)
    }
}

/// Continuous-auction minutes elapsed at `time`, 0..=240.
pub fn elapsed_trading_minutes(time: NaiveTime) -> u32 {
    let t = minute_of_day(time.hour(), time.minute());
    let morning_open = minute_of_day(MORNING_OPEN.0, MORNING_OPEN.1);
    let morning_close = minute_of_day(MORNING_CLOSE.0, MORNING_CLOSE.1);
    let afternoon_open = minute_of_day(AFTERNOON_OPEN.0, AFTERNOON_OPEN.1);
    let afternoon_close = minute_of_day(AFTERNOON_CLOSE.0, AFTERNOON_CLOSE.1);
    let morning_len = morning_close - morning_open;

    if t <= morning_open {
        0
    } else if t <= morning_close {
        t - morning_open
    } else if t <= afternoon_open {
        morning_len
    } else if t <= afternoon_close {
        morning_len + (t - afternoon_open)
    } else {
        SESSION_MINUTES
    }
}
