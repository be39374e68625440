use std::iter::successors;
use time::{Date, Month};

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// `date` followed by every later date, until the end of time
pub(super) fn iter_days_from(date: Date) -> impl Iterator<Item = Date> {
    successors(Some(date), |&d| d.next_day())
}

pub(super) fn first_of_month(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

pub(super) fn same_month(a: Date, b: Date) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// The title for `month`: the matching entry of `names` if exactly twelve
/// names are given, otherwise the month's English name in upper case
pub(crate) fn month_title(month: Month, names: Option<&[String]>) -> String {
    names
        .filter(|names| names.len() == 12)
        .and_then(|names| names.get(usize::from(u8::from(month)) - 1))
        .cloned()
        .unwrap_or_else(|| month.to_string().to_uppercase())
}
