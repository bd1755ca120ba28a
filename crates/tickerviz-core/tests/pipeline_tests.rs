//! End-to-end pipeline tests over scripted collaborators
//!
//! The backend and sandbox are scripted fakes that replay queued responses
//! and record what they were asked, so every stage contract is observable:
//! prompt content, delegation order, and the retry bound.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::num::NonZeroU32;
use tickerviz_artifact::ArtifactStatus;
use tickerviz_core::{Pipeline, PipelineConfig, PipelineError};
use tickerviz_inference::InferenceError;
use tickerviz_sandbox::SandboxError;
use tickerviz_test_utils::{
    failure_outcome, google_ytd_json, success_outcome, ScriptedBackend, ScriptedSandbox,
};

const QUERY: &str = "Plot YTD stock gain of Google";

fn pipeline(
    backend: &ScriptedBackend,
    sandbox: &ScriptedSandbox,
    config: PipelineConfig,
) -> Pipeline<ScriptedBackend, ScriptedSandbox> {
    Pipeline::new(backend.clone(), sandbox.clone(), config)
}

#[tokio::test]
async fn happy_path_single_attempt() {
    let backend = ScriptedBackend::new()
        .respond(google_ytd_json())
        .respond("```python\nimport yfinance as yf\nprint('ok')\n```");
    let sandbox = ScriptedSandbox::new().outcome(success_outcome());

    let artifact = pipeline(&backend, &sandbox, PipelineConfig::new())
        .run(QUERY)
        .await
        .unwrap();

    assert_eq!(artifact.status, ArtifactStatus::Succeeded);
    assert_eq!(artifact.attempt, 1);
    assert!(artifact.errors.is_empty());
    // Fences are stripped before execution.
    assert!(!artifact.code.contains("```"));
    assert!(artifact.code.contains("yfinance"));

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].json, "interpretation is JSON-constrained");
    assert!(!requests[1].json, "synthesis is free text");
    assert_eq!(sandbox.submissions().len(), 1);
}

#[tokio::test]
async fn prose_then_json_retries_interpretation_once() {
    // Scenario B: first response is prose, second parses.
    let backend = ScriptedBackend::new()
        .respond("Sure! You want Google year-to-date, plotted.")
        .respond(google_ytd_json())
        .respond("print('ok')");
    let sandbox = ScriptedSandbox::new().outcome(success_outcome());

    let artifact = pipeline(&backend, &sandbox, PipelineConfig::new())
        .run(QUERY)
        .await
        .unwrap();

    assert_eq!(artifact.status, ArtifactStatus::Succeeded);

    let requests = backend.requests();
    assert_eq!(requests.len(), 3);
    // Retry prompt carries the rejection feedback.
    assert!(requests[1].prompt.contains("previous answer was rejected"));
    assert!(requests[1].prompt.contains("not valid JSON"));
}

#[tokio::test]
async fn domain_violation_retried_with_field_feedback() {
    // Schema-valid but domain-invalid: empty symbol set.
    let backend = ScriptedBackend::new()
        .respond(r#"{"symbols":[],"timeframe":"ytd","action":"plot"}"#)
        .respond(google_ytd_json())
        .respond("print('ok')");
    let sandbox = ScriptedSandbox::new().outcome(success_outcome());

    let artifact = pipeline(&backend, &sandbox, PipelineConfig::new())
        .run(QUERY)
        .await
        .unwrap();

    assert_eq!(artifact.status, ArtifactStatus::Succeeded);
    assert!(backend.requests()[1].prompt.contains("field 'symbols'"));
}

#[tokio::test]
async fn repair_loop_fixes_failure_on_second_attempt() {
    // Scenario C: missing dependency on attempt 1, fixed on attempt 2.
    let missing = "ModuleNotFoundError: No module named 'yfinance'";
    let backend = ScriptedBackend::new()
        .respond(google_ytd_json())
        .respond("import yfinance as yf\nplot()")
        .respond("import subprocess\nimport yfinance as yf\nplot()");
    let sandbox = ScriptedSandbox::new()
        .outcome(failure_outcome(missing))
        .outcome(success_outcome());

    let artifact = pipeline(&backend, &sandbox, PipelineConfig::new())
        .run(QUERY)
        .await
        .unwrap();

    assert_eq!(artifact.status, ArtifactStatus::Succeeded);
    assert_eq!(artifact.attempt, 2);
    assert_eq!(artifact.errors, vec![missing.to_string()]);

    // The repair prompt embedded the prior failure verbatim.
    let requests = backend.requests();
    assert_eq!(requests.len(), 3);
    assert!(!requests[2].json);
    assert!(requests[2].prompt.contains(missing));
    assert_eq!(sandbox.submissions().len(), 2);
}

#[tokio::test]
async fn exhausted_budget_returns_full_history() {
    // Scenario D: max_attempts = 2, both attempts fail.
    let first = "ModuleNotFoundError: No module named 'yfinance'";
    let second = "ValueError: no data for symbol";
    let backend = ScriptedBackend::new()
        .respond(google_ytd_json())
        .respond("attempt one")
        .respond("attempt two");
    let sandbox = ScriptedSandbox::new()
        .outcome(failure_outcome(first))
        .outcome(failure_outcome(second));

    let config = PipelineConfig::new().with_max_attempts(NonZeroU32::new(2).unwrap());
    let err = pipeline(&backend, &sandbox, config)
        .run(QUERY)
        .await
        .unwrap_err();

    assert!(err.is_retry_exhausted());
    assert_eq!(err.error_history(), [first, second]);

    let artifact = err.last_artifact().unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Failed);
    assert_eq!(artifact.attempt, 2);
    // No third synthesis ever happened.
    assert_eq!(backend.requests().len(), 3);
    assert_eq!(sandbox.submissions().len(), 2);
}

#[tokio::test]
async fn empty_synthesis_consumed_as_failed_attempt() {
    let backend = ScriptedBackend::new()
        .respond(google_ytd_json())
        .respond("   \n")
        .respond("print('ok')");
    let sandbox = ScriptedSandbox::new().outcome(success_outcome());

    let artifact = pipeline(&backend, &sandbox, PipelineConfig::new())
        .run(QUERY)
        .await
        .unwrap();

    assert_eq!(artifact.status, ArtifactStatus::Succeeded);
    assert_eq!(artifact.attempt, 2);
    assert_eq!(artifact.errors.len(), 1);
    assert!(artifact.errors[0].contains("empty artifact"));
    // Empty drafts never reach the sandbox.
    assert_eq!(sandbox.submissions().len(), 1);
}

#[tokio::test]
async fn sandbox_timeout_is_recoverable() {
    let backend = ScriptedBackend::new()
        .respond(google_ytd_json())
        .respond("while True: pass")
        .respond("print('ok')");
    let sandbox = ScriptedSandbox::new()
        .fail(SandboxError::TimedOut { limit_secs: 5 })
        .outcome(success_outcome());

    let artifact = pipeline(&backend, &sandbox, PipelineConfig::new())
        .run(QUERY)
        .await
        .unwrap();

    assert_eq!(artifact.status, ArtifactStatus::Succeeded);
    assert_eq!(artifact.attempt, 2);
    assert!(artifact.errors[0].contains("5s sandbox time limit"));
}

#[tokio::test]
async fn interpreter_retry_bound_is_fatal_and_fail_fast() {
    let backend = ScriptedBackend::new()
        .respond("still prose")
        .respond("more prose");
    let sandbox = ScriptedSandbox::new();

    let config = PipelineConfig::new().with_interpreter_retries(1);
    let err = pipeline(&backend, &sandbox, config)
        .run(QUERY)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Interpretation(InferenceError::SchemaViolation { .. })
    ));
    // Later stages were never invoked.
    assert_eq!(backend.requests().len(), 2);
    assert!(sandbox.submissions().is_empty());
}

#[tokio::test]
async fn backend_outage_is_not_retried() {
    let backend = ScriptedBackend::new().fail(InferenceError::BackendUnavailable(
        "connection refused".to_string(),
    ));
    let sandbox = ScriptedSandbox::new();

    let err = pipeline(&backend, &sandbox, PipelineConfig::new())
        .run(QUERY)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Interpretation(InferenceError::BackendUnavailable(_))
    ));
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn unreachable_sandbox_is_fatal() {
    let backend = ScriptedBackend::new()
        .respond(google_ytd_json())
        .respond("print('ok')");
    let sandbox = ScriptedSandbox::new().fail(SandboxError::Unavailable(
        "failed to spawn interpreter".to_string(),
    ));

    let err = pipeline(&backend, &sandbox, PipelineConfig::new())
        .run(QUERY)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::SandboxUnavailable(_)));
}

#[tokio::test]
async fn concurrent_runs_share_no_state() {
    // Two pipelines, two independent scripts; outcomes do not bleed across.
    let backend_a = ScriptedBackend::new()
        .respond(google_ytd_json())
        .respond("print('a')");
    let sandbox_a = ScriptedSandbox::new().outcome(success_outcome());

    let backend_b = ScriptedBackend::new()
        .respond(r#"{"symbols":["TSLA"],"timeframe":"1y","action":"fetch"}"#)
        .respond("print('b')");
    let sandbox_b = ScriptedSandbox::new().outcome(failure_outcome("ValueError: boom"));

    let config = PipelineConfig::new().with_max_attempts(NonZeroU32::new(1).unwrap());
    let pipe_a = pipeline(&backend_a, &sandbox_a, config.clone());
    let pipe_b = pipeline(&backend_b, &sandbox_b, config);

    let (a, b) = tokio::join!(pipe_a.run(QUERY), pipe_b.run("fetch tesla over a year"));

    let a = a.unwrap();
    assert_eq!(a.status, ArtifactStatus::Succeeded);
    assert!(a.errors.is_empty());

    let b = b.unwrap_err();
    assert!(b.is_retry_exhausted());
    assert_eq!(b.error_history(), ["ValueError: boom"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// With every attempt failing, the run makes exactly `max_attempts`
    /// sandbox submissions: the attempt counter never exceeds the bound and
    /// `Failed -> Delegated` never fires at the bound.
    #[test]
    fn attempt_counter_bounded_by_budget(max in 1u32..6) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let mut backend = ScriptedBackend::new().respond(google_ytd_json());
            let mut sandbox = ScriptedSandbox::new();
            for i in 0..max {
                backend = backend.respond(format!("print({i})"));
                sandbox = sandbox.outcome(failure_outcome("ValueError: boom"));
            }

            let config = PipelineConfig::new()
                .with_max_attempts(NonZeroU32::new(max).unwrap());
            let err = pipeline(&backend, &sandbox, config)
                .run(QUERY)
                .await
                .unwrap_err();

            let artifact = err.last_artifact().unwrap();
            assert_eq!(artifact.attempt, max);
            assert_eq!(artifact.errors.len(), max as usize);
            assert_eq!(sandbox.submissions().len(), max as usize);
            // One interpretation plus one synthesis per attempt.
            assert_eq!(backend.requests().len(), (max + 1) as usize);
        });
    }
}
