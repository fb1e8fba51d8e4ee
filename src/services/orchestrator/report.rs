//! Orchestrator Reports
//!
//! Human-readable Markdown summaries of the registered gates, thresholds and
//! recorded runs, plus the plain-text run log used for console output.

use chrono::Utc;
use gatekeeper_quality_gates::{CompositeRunResult, ExecutionRecord, RunOutcome};

use super::engine::GateOrchestrator;

/// Final run-log line when no critical gate failed.
///
/// Gates are not limited to performance checks, so the banner carries no
/// `PERFORMANCE` qualifier; log scrapers should match these constants.
pub const RUN_LOG_PASSED_BANNER: &str = "ALL GATES PASSED";

/// Final run-log line when at least one critical gate failed.
pub const RUN_LOG_FAILED_BANNER: &str = "GATES FAILED";

/// Render the plain-text log of one run.
///
/// ```text
/// Build ID: <id>
/// [Critical] Gate 'Compile': PASS
/// [Advisory] Gate 'Docs': FAIL
/// <summary>
/// ALL GATES PASSED | GATES FAILED
/// ```
pub fn render_run_log(build_identifier: &str, result: &CompositeRunResult) -> String {
    let mut lines = vec![format!("Build ID: {}", build_identifier)];

    for gate in &result.gate_results {
        lines.push(format!(
            "[{}] Gate '{}': {}",
            if gate.is_critical { "Critical" } else { "Advisory" },
            gate.gate_name,
            if gate.success { "PASS" } else { "FAIL" }
        ));
    }
    for error in &result.error_messages {
        lines.push(format!("  error: {}", error));
    }
    for warning in &result.warning_messages {
        lines.push(format!("  warning: {}", warning));
    }

    lines.push(result.summary.clone());
    lines.push(
        if result.success {
            RUN_LOG_PASSED_BANNER
        } else {
            RUN_LOG_FAILED_BANNER
        }
        .to_string(),
    );
    lines.join("\n")
}

/// Generate the Markdown report for an orchestrator.
pub fn generate_report(orchestrator: &GateOrchestrator) -> String {
    let gates = orchestrator.execution_order();
    let thresholds = orchestrator.failure_threshold();
    let ledger = orchestrator.history_ledger();
    let latest = ledger.latest();

    let mut report = String::new();
    report.push_str("# Gate Orchestrator Report\n\n");
    report.push_str(&format!("Generated: {}\n", Utc::now().to_rfc3339()));
    report.push_str(&format!("Current phase: {}\n\n", orchestrator.phase()));

    let status = match &latest {
        Some(record) if record.outcome.success() => "PASSED",
        Some(_) => "FAILED",
        None => "NO RUNS RECORDED",
    };
    report.push_str(&format!("## Overall Status: {}\n\n", status));

    // Statistics
    report.push_str("## Summary Statistics\n\n");
    report.push_str(&format!("- **Registered Gates**: {}\n", gates.len()));
    report.push_str(&format!(
        "- **Critical Gates**: {}\n",
        gates.iter().filter(|g| g.is_critical()).count()
    ));
    report.push_str(&format!(
        "- **Recorded Runs**: {} (capacity {})\n",
        ledger.len(),
        ledger.capacity()
    ));
    if let Some(rate) = ledger.success_rate() {
        report.push_str(&format!("- **Success Rate**: {:.1}%\n", rate * 100.0));
    }
    report.push('\n');

    // Gates
    report.push_str("## Registered Gates\n\n");
    if gates.is_empty() {
        report.push_str("No gates registered.\n\n");
    } else {
        report.push_str("| Gate | Priority | Critical | Expected Time | Status | Description |\n");
        report.push_str("|------|----------|----------|---------------|--------|-------------|\n");
        for gate in &gates {
            report.push_str(&format!(
                "| {} | {} | {} | {}s | {} | {} |\n",
                gate.name(),
                gate.priority(),
                if gate.is_critical() { "yes" } else { "no" },
                gate.expected_execution_time().as_secs(),
                gate.status(),
                gate.description()
            ));
        }
        report.push('\n');
    }

    // Thresholds
    report.push_str("## Failure Thresholds\n\n");
    report.push_str(&format!("- **Min FPS**: {:.1}\n", thresholds.min_fps));
    report.push_str(&format!(
        "- **Max Frame Time**: {:.1} ms\n",
        thresholds.max_frame_time_ms
    ));
    report.push_str(&format!("- **Max Memory**: {:.1} MB\n", thresholds.max_memory_mb));
    report.push_str(&format!(
        "- **Max Build Time**: {:.0}s\n",
        thresholds.max_build_time_secs
    ));
    report.push_str(&format!(
        "- **Max Test Time**: {:.0}s\n",
        thresholds.max_test_time_secs
    ));
    report.push_str(&format!(
        "- **Fail On Warnings**: {}\n",
        thresholds.fail_on_warnings
    ));
    for (key, value) in &thresholds.custom {
        report.push_str(&format!("- **{}**: {}\n", key, value));
    }
    report.push('\n');

    // History
    report.push_str("## Recent History\n\n");
    let recent = ledger.recent(orchestrator.report_history_limit());
    if recent.is_empty() {
        report.push_str("No runs recorded yet.\n\n");
    } else {
        report.push_str("| Executed At | Build | Environment | Scope | Gates | Result | Time (ms) |\n");
        report.push_str("|-------------|-------|-------------|-------|-------|--------|-----------|\n");
        for record in recent.iter().rev() {
            report.push_str(&history_row(record));
        }
        report.push('\n');
    }

    // Trends
    let trends = ledger.gate_trends();
    if !trends.is_empty() {
        report.push_str("## Gate Trends\n\n");
        report.push_str("| Gate | Runs | Passed | Failed | Pass Rate | Avg Time (ms) |\n");
        report.push_str("|------|------|--------|--------|-----------|---------------|\n");
        for trend in &trends {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {:.1}% | {:.1} |\n",
                trend.gate_name,
                trend.runs,
                trend.passes,
                trend.failures,
                trend.pass_rate() * 100.0,
                trend.average_execution_time_ms
            ));
        }
        report.push('\n');
    }

    // Latest run
    if let Some(record) = &latest {
        if let RunOutcome::Composite(result) = &record.outcome {
            report.push_str("## Latest Run Log\n\n```text\n");
            report.push_str(&render_run_log(&record.build_identifier, result));
            report.push_str("\n```\n\n");
        }
    }

    // Recommendations
    report.push_str("## Recommendations\n\n");
    let failed: Vec<String> = latest
        .as_ref()
        .map(|record| {
            record
                .outcome
                .gate_results()
                .iter()
                .filter(|r| !r.success)
                .map(|r| {
                    format!(
                        "- Fix {} gate '{}': {}\n",
                        if r.is_critical { "critical" } else { "advisory" },
                        r.gate_name,
                        r.error_messages
                            .first()
                            .map(String::as_str)
                            .unwrap_or(r.summary.as_str())
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    if latest.is_none() {
        report.push_str("- Run the gates to establish a baseline.\n");
    } else if failed.is_empty() {
        report.push_str("- All gates passed in the latest run. No action needed.\n");
    } else {
        for line in failed {
            report.push_str(&line);
        }
    }

    report
}

fn history_row(record: &ExecutionRecord) -> String {
    let scope = match &record.outcome {
        RunOutcome::Composite(_) => "all".to_string(),
        RunOutcome::SingleGate(result) => result.gate_name.clone(),
    };
    format!(
        "| {} | {} | {} | {} | {} | {} | {} |\n",
        record.executed_at.format("%Y-%m-%d %H:%M:%S"),
        record.build_identifier,
        record.environment,
        scope,
        record.outcome.gate_results().len(),
        if record.outcome.success() { "PASS" } else { "FAIL" },
        record.outcome.execution_time_ms()
    )
}
