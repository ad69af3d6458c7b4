use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::{interval_at, Duration, Instant};

use crate::{service::project_service::start_of_day, AppState};

/// Time left until the next midnight UTC.
fn until_next_midnight(now: DateTime<Utc>) -> Duration {
    let next = start_of_day(now) + chrono::Duration::days(1);
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Periodically notifies clients whose project deadline has passed. The first
/// run waits for midnight UTC so restarts do not repeat the day's notices.
/// Errors are logged and the loop keeps going.
pub async fn start_deadline_sweep_job(app_state: Arc<AppState>) {
    let period = Duration::from_secs(app_state.env.deadline_sweep_interval_seconds.max(1));
    let first_run = until_next_midnight(Utc::now());
    tracing::info!("Deadline sweep scheduled in {}s", first_run.as_secs());
    let mut interval = interval_at(Instant::now() + first_run, period);

    loop {
        interval.tick().await;

        let cutoff = start_of_day(Utc::now());
        tracing::info!("Running deadline sweep for deadlines before {}", cutoff);

        match app_state.project_service.run_deadline_sweep(cutoff).await {
            Ok(count) => tracing::info!("Deadline sweep completed: {} projects overdue", count),
            Err(e) => tracing::error!("Deadline sweep failed: {}", e),
        }
    }
}
