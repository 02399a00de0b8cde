use chrono::{Datelike, Months, NaiveDate};

use crate::model::BusinessHours;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Past days and the closed weekday cannot be picked.
    pub disabled: bool,
    pub is_today: bool,
}

/// One month of the booking calendar, weeks starting on Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    /// First day of the month.
    pub first: NaiveDate,
    /// Empty cells before day 1.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
    /// False when the previous month lies before today's month.
    pub can_go_back: bool,
}

impl CalendarMonth {
    pub fn previous(&self) -> Option<NaiveDate> {
        self.first.checked_sub_months(Months::new(1))
    }

    pub fn next(&self) -> Option<NaiveDate> {
        self.first.checked_add_months(Months::new(1))
    }
}

/// Build the grid for `year`/`month`. `None` for an invalid month.
pub fn month_view(hours: &BusinessHours, year: i32, month: u32, today: NaiveDate) -> Option<CalendarMonth> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = first.checked_add_months(Months::new(1))?;

    let days = first
        .iter_days()
        .take_while(|d| *d < next_first)
        .map(|date| CalendarDay {
            date,
            disabled: date < today || hours.is_closed_on(date),
            is_today: date == today,
        })
        .collect();

    let this_month = (today.year(), today.month());
    let prev = first.checked_sub_months(Months::new(1))?;
    let can_go_back = (prev.year(), prev.month()) >= this_month;

    Some(CalendarMonth {
        first,
        leading_blanks: first.weekday().num_days_from_sunday(),
        days,
        can_go_back,
    })
}
