// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley doctor`: probes every configured adapter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::Colorize;
use futures::future::join_all;
use parley_core::{HealthStatus, PluginAdapter};

use crate::commands::CliError;

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: HealthStatus,
    pub duration: Duration,
}

/// Runs all health checks concurrently, in adapter order.
pub async fn check_all(adapters: &[Arc<dyn PluginAdapter>]) -> Vec<CheckResult> {
    let checks = adapters.iter().map(|adapter| async move {
        let started = Instant::now();
        let status = adapter
            .health_check()
            .await
            .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
        CheckResult {
            name: adapter.name().to_string(),
            status,
            duration: started.elapsed(),
        }
    });
    join_all(checks).await
}

pub async fn run_doctor(adapters: &[Arc<dyn PluginAdapter>], color: bool) -> Result<(), CliError> {
    let results = check_all(adapters).await;

    println!();
    println!("  parley doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", check_line(result, color));
    }
    println!();

    let failed = results
        .iter()
        .filter(|r| matches!(r.status, HealthStatus::Unhealthy(_)))
        .count();
    if failed > 0 {
        return Err(CliError::Unhealthy {
            failed,
            total: results.len(),
        });
    }
    println!("  All checks passed.");
    Ok(())
}

fn check_line(result: &CheckResult, color: bool) -> String {
    let ms = result.duration.as_millis();
    let (tag, symbol, message) = match &result.status {
        HealthStatus::Healthy => ("[OK]  ", "✓".green(), "reachable".normal()),
        HealthStatus::Degraded(why) => ("[WARN]", "!".yellow(), why.yellow()),
        HealthStatus::Unhealthy(why) => ("[FAIL]", "✗".red(), why.red()),
    };
    if color {
        format!("    {symbol} {:<18} {message} ({ms}ms)", result.name)
    } else {
        format!("    {tag} {:<18} {} ({ms}ms)", result.name, message.clear())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn plain_lines_use_tags() {
        let result = CheckResult {
            name: "sms".into(),
            status: HealthStatus::Unhealthy("connection refused".into()),
            duration: Duration::from_millis(12),
        };
        let line = check_line(&result, false);
        assert!(line.starts_with("    [FAIL] sms "));
        assert!(line.ends_with(" connection refused (12ms)"));
    }

    #[tokio::test]
    async fn failing_backend_fails_the_doctor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let transport = parley_backend::HttpTransport::new(
            &server.uri(),
            None,
            Duration::from_secs(2),
            Duration::from_secs(30),
        )
        .unwrap();
        let adapters: Vec<Arc<dyn PluginAdapter>> =
            vec![Arc::new(parley_backend::BackendClient::new(transport))];

        let results = check_all(&adapters).await;
        assert_eq!(results[0].name, "backend");
        assert!(matches!(results[0].status, HealthStatus::Unhealthy(_)));

        let err = run_doctor(&adapters, false).await.unwrap_err();
        assert!(matches!(err, CliError::Unhealthy { failed: 1, total: 1 }));
    }
}
