use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::service::{Ledger, ServiceError};
use crate::storage::Database;
use crate::AppState;

/// Meta key holding the last month (`YYYY-MM`) spendings were created for
pub const LAST_MONTH_KEY: &str = "recurrence:last_month";

/// Prefix of the per-month meta keys holding materialized periodical ids
pub const PROGRESS_KEY_PREFIX: &str = "recurrence:progress:";

/// Start the background task creating each month's spendings once
pub fn start_recurrence_scheduler(state: Arc<AppState>) -> JoinHandle<()> {
    let interval = Duration::from_secs(state.config.recurrence.interval_seconds);

    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(interval);

        loop {
            interval_timer.tick().await;
            run_tick(&state).await;
        }
    })
}

async fn run_tick(state: &AppState) {
    debug!("Checking for monthly spendings");

    let db = state.db.clone();
    let ledger = state.ledger.clone();
    let result = tokio::task::spawn_blocking(move || run_if_due(&db, &ledger, Utc::now())).await;

    match result {
        Ok(Ok(Some(count))) => info!(spendings = count, "Monthly spendings created"),
        Ok(Ok(None)) => {}
        Ok(Err(e)) => error!(error = %e, "Failed to create monthly spendings"),
        Err(e) => error!(error = %e, "Monthly spendings task panicked"),
    }
}

/// Run the command for the month of `now` unless it already ran for it.
/// Returns the number of spendings created, `None` if nothing was due.
///
/// Each materialized periodical is recorded under the month's progress key,
/// so a run that fails halfway resumes with the remaining periodicals.
pub fn run_if_due(
    db: &Database,
    ledger: &Ledger,
    now: DateTime<Utc>,
) -> Result<Option<usize>, ServiceError> {
    let month = now.format("%Y-%m").to_string();
    if db.get_meta(LAST_MONTH_KEY)?.as_deref() == Some(month.as_str()) {
        return Ok(None);
    }

    let start = month_start(now)
        .ok_or_else(|| ServiceError::Internal(format!("no first instant for month {month}")))?;
    let key = progress_key(&month);
    let mut done: Vec<String> = db
        .get_meta(&key)?
        .map(|ids| ids.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    if !done.is_empty() {
        info!(month = %month, already_created = done.len(), "Resuming monthly spendings");
    }

    let command = ledger.monthly_spendings();
    let mut created = 0;
    for periodical in command.due(start)? {
        if done.contains(&periodical.meta.id) {
            continue;
        }
        if let Err(e) = command.materialize(&periodical, start) {
            warn!(
                month = %month,
                created,
                aggregate_id = %periodical.meta.id,
                error = %e,
                "Monthly spendings interrupted"
            );
            return Err(e.into());
        }
        done.push(periodical.meta.id);
        db.put_meta(&key, &done.join(" "))?;
        created += 1;
    }
    db.put_meta(LAST_MONTH_KEY, &month)?;

    Ok(Some(created))
}

/// Meta key listing the periodicals already materialized for `month`
fn progress_key(month: &str) -> String {
    format!("{PROGRESS_KEY_PREFIX}{month}")
}

fn month_start(at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(at.year(), at.month(), 1, 0, 0, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::NewPeriodical;
    use crate::testutil::{make_new_periodical, test_state, utc};

    fn setup() -> (Arc<AppState>, tempfile::TempDir, String) {
        let (state, temp) = test_state();
        let account = state
            .ledger
            .create_checking_account("Private", "alice")
            .unwrap();
        let periodical: NewPeriodical = make_new_periodical("Rent", -80_000);
        state
            .ledger
            .create_periodical("alice", &account.meta.id, periodical)
            .unwrap();
        (state, temp, account.meta.id)
    }

    #[test]
    fn test_runs_once_per_month() {
        let (state, _temp, account) = setup();
        let at = |day| utc(2017, 3, day);

        assert_eq!(run_if_due(&state.db, &state.ledger, at(1)).unwrap(), Some(1));
        assert_eq!(run_if_due(&state.db, &state.ledger, at(15)).unwrap(), None);
        assert_eq!(state.db.get_meta(LAST_MONTH_KEY).unwrap().as_deref(), Some("2017-03"));

        assert_eq!(
            run_if_due(&state.db, &state.ledger, utc(2017, 4, 2)).unwrap(),
            Some(1)
        );

        let page = state
            .ledger
            .find_spendings("alice", &account, "", crate::pagination::Pagination::new(0, 10))
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].booked_at, Some(utc(2017, 3, 1)));
        assert_eq!(page.items[1].booked_at, Some(utc(2017, 4, 1)));
    }

    #[test]
    fn test_resumes_after_an_interrupted_run() {
        let (state, _temp, account) = setup();
        let second = state
            .ledger
            .create_periodical("alice", &account, make_new_periodical("Insurance", -12_000))
            .unwrap();
        let first_run = state.ledger.monthly_spendings().due(utc(2017, 3, 1)).unwrap();
        assert_eq!(first_run.len(), 2);

        // A previous run materialized the rent before failing
        let rent = first_run
            .iter()
            .find(|p| p.meta.id != second.meta.id)
            .unwrap();
        state
            .ledger
            .monthly_spendings()
            .materialize(rent, utc(2017, 3, 1))
            .unwrap();
        state.db.put_meta(&progress_key("2017-03"), &rent.meta.id).unwrap();

        assert_eq!(run_if_due(&state.db, &state.ledger, utc(2017, 3, 9)).unwrap(), Some(1));
        assert_eq!(state.db.get_meta(LAST_MONTH_KEY).unwrap().as_deref(), Some("2017-03"));

        let page = state
            .ledger
            .find_spendings("alice", &account, "", crate::pagination::Pagination::new(0, 10))
            .unwrap();
        let mut titles: Vec<_> = page.items.iter().map(|s| s.title.as_str()).collect();
        titles.sort();
        assert_eq!(titles, vec!["Insurance", "Rent"]);

        let recorded = state.db.get_meta(&progress_key("2017-03")).unwrap().unwrap();
        assert_eq!(recorded.split_whitespace().count(), 2);
    }

    #[test]
    fn test_month_start() {
        let at = Utc.with_ymd_and_hms(2017, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(month_start(at), Some(utc(2017, 12, 1)));
    }

    #[tokio::test]
    async fn test_scheduler_creates_spendings() {
        let (state, _temp, account) = setup();

        let handle = start_recurrence_scheduler(Arc::clone(&state));
        for _ in 0..50 {
            if state.db.get_meta(LAST_MONTH_KEY).unwrap().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        let page = state
            .ledger
            .find_spendings("alice", &account, "", crate::pagination::Pagination::new(0, 10))
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(!page.items[0].booked);
    }
}
