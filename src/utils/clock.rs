use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};

/// Business day in the server's local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// `[start, end)` of a local calendar day, expressed in UTC.
pub fn local_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_of = |day: NaiveDate| {
        let midnight = day.and_time(NaiveTime::MIN);
        midnight
            .and_local_timezone(Local)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    };
    let next = date.succ_opt().unwrap_or(date);
    (start_of(date), start_of(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_span_one_day() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let (start, end) = local_day_bounds(day);
        assert!(start < end);
        assert!((23..=25).contains(&(end - start).num_hours()));
    }
}
