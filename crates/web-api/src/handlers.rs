use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use oi_alert_core::HealthState;
use serde::Serialize;
use std::sync::Arc;

/// Shared state for the liveness routes.
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<HealthState>,
    pub interval_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" while the scheduler is alive, "unavailable" after it stopped.
    pub status: &'static str,
    /// "running" or "stopped".
    pub bot: &'static str,
    pub run_in_progress: bool,
    pub runs_completed: u64,
    pub runs_skipped: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<&'static str>,
    pub last_alerts: Option<usize>,
    /// Symbols the last run had to skip after per-symbol failures.
    pub last_skipped_symbols: Option<usize>,
}

/// Human description of the check interval.
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!(
            "OI bot active - checks every {}",
            describe_interval(state.interval_secs)
        ),
    })
}

/// Liveness check.
///
/// Returns `503 Service Unavailable` once the scheduler has stopped so that the
/// hosting platform can restart the process.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let snapshot = state.health.snapshot();
    let running = snapshot.scheduler_running;

    let body = HealthResponse {
        status: if running { "ok" } else { "unavailable" },
        bot: if running { "running" } else { "stopped" },
        run_in_progress: snapshot.run_in_progress,
        runs_completed: snapshot.runs_completed,
        runs_skipped: snapshot.runs_skipped,
        last_run_at: snapshot.last_run.as_ref().map(|r| r.finished_at),
        last_outcome: snapshot.last_run.as_ref().map(|r| r.outcome),
        last_alerts: snapshot.last_run.as_ref().map(|r| r.alerts),
        last_skipped_symbols: snapshot.last_run.as_ref().map(|r| r.skipped_symbols),
    };

    let status = if running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

fn describe_interval(secs: u64) -> String {
    match secs {
        s if s >= 60 && s % 60 == 0 => format!("{} min", s / 60),
        s => format!("{s} s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_interval() {
        assert_eq!(describe_interval(300), "5 min");
        assert_eq!(describe_interval(60), "1 min");
        assert_eq!(describe_interval(90), "90 s");
        assert_eq!(describe_interval(30), "30 s");
    }
}
