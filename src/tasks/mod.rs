//! Background scheduled tasks.
//!
//! Call `spawn_all` once during startup; tasks are detached with `tokio::spawn`.

use crate::config::TasksConfig;
use crate::services::ReportService;
use crate::utils::local_today;
use chrono::{Days, NaiveDate};

/// Days whose reports are refreshed on each run: today, then yesterday.
pub fn report_dates(today: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = vec![today];
    if let Some(yesterday) = today.checked_sub_days(Days::new(1)) {
        dates.push(yesterday);
    }
    dates
}

pub fn spawn_all(report_service: ReportService, config: &TasksConfig) {
    let interval = std::time::Duration::from_secs(config.daily_report_interval_secs.max(60));

    tokio::spawn(async move {
        loop {
            for date in report_dates(local_today()) {
                match report_service.generate(None, date).await {
                    Ok(reports) => {
                        log::info!("Daily sales reports for {date}: {} store(s)", reports.len())
                    }
                    Err(e) => log::error!("Failed to generate daily sales reports for {date}: {e:?}"),
                }
            }
            tokio::time::sleep(interval).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refreshes_today_and_yesterday() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(
            report_dates(today),
            vec![today, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()]
        );
    }
}
