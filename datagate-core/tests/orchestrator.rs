use async_trait::async_trait;
use datagate_core::domain::{Dataset, Options, Role, Sample};
use datagate_core::logging::{BufferedEventLogger, NoopEventLogger};
use datagate_core::metrics::{InMemoryMetrics, Metrics};
use datagate_core::orchestrator::Orchestrator;
use datagate_core::progress::Reporter;
use datagate_core::validation::{ValidationErrorDetail, ValidationStatus, Validator};
use datagate_core::validators::{self, ChatStructureValidator, DeduplicationValidator};
use std::sync::Arc;
use std::time::Duration;

fn qa(question: &str, answer: &str) -> Sample {
    Sample::from_turns([(Role::User, question), (Role::Assistant, answer)])
}

fn dataset() -> Dataset {
    vec![qa("hi", "hello"), qa("bye", "goodbye")]
}

struct PanickyBody;

#[async_trait]
impl Validator for PanickyBody {
    fn name(&self) -> &str {
        "panicky_body"
    }

    async fn run(&self, _data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        anyhow::bail!("validator blew up")
    }
}

struct SlowCheck;

#[async_trait]
impl Validator for SlowCheck {
    fn name(&self) -> &str {
        "slow_check"
    }

    async fn run(&self, _data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn run_yields_one_result_per_check_in_submission_order() {
    let metrics = Arc::new(InMemoryMetrics::new());
    let checks: Vec<Arc<dyn Validator>> = vec![
        Arc::new(ChatStructureValidator::new(Reporter::disabled(
            "chat_structure",
        ))),
        Arc::new(DeduplicationValidator::new(Reporter::disabled(
            "deduplication",
        ))),
    ];
    let orchestrator = Orchestrator::new(checks, metrics.clone(), Arc::new(NoopEventLogger));

    let report = orchestrator.run(&dataset()).await;
    let names: Vec<&str> = report
        .results
        .iter()
        .map(|r| r.validator_name.as_str())
        .collect();
    assert_eq!(names, vec!["chat_structure", "deduplication"]);
    assert!(report.all_passed());

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.checks_started, 2);
    assert_eq!(snapshot.checks_passed, 2);
    assert_eq!(snapshot.checks_failed, 0);
}

#[tokio::test]
async fn a_misbehaving_check_never_aborts_its_siblings() {
    let metrics = Arc::new(InMemoryMetrics::new());
    let checks: Vec<Arc<dyn Validator>> = vec![
        Arc::new(PanickyBody),
        Arc::new(ChatStructureValidator::new(Reporter::disabled(
            "chat_structure",
        ))),
    ];
    let orchestrator = Orchestrator::new(checks, metrics.clone(), Arc::new(NoopEventLogger));

    let report = orchestrator.run(&dataset()).await;
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].status, ValidationStatus::Fail);
    assert!(report.results[0].errors[0].error.contains("validator blew up"));
    assert_eq!(report.results[1].status, ValidationStatus::Pass);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.checks_failed, 1);
    assert_eq!(snapshot.checks_passed, 1);
    assert_eq!(snapshot.error_details, 1);
}

#[tokio::test(start_paused = true)]
async fn timed_out_check_is_reported_as_cancelled() {
    let metrics = Arc::new(InMemoryMetrics::new());
    let checks: Vec<Arc<dyn Validator>> = vec![
        Arc::new(SlowCheck),
        Arc::new(ChatStructureValidator::new(Reporter::disabled(
            "chat_structure",
        ))),
    ];
    let orchestrator = Orchestrator::new(checks, metrics.clone(), Arc::new(NoopEventLogger))
        .with_check_timeout(Duration::from_millis(100));

    let report = orchestrator.run(&dataset()).await;
    assert_eq!(report.results[0].validator_name, "slow_check");
    assert_eq!(report.results[0].status, ValidationStatus::Fail);
    assert_eq!(
        report.results[0].errors[0].code.as_deref(),
        Some("cancelled")
    );
    assert_eq!(report.results[1].status, ValidationStatus::Pass);
    assert_eq!(metrics.snapshot().checks_cancelled, 1);
}

#[tokio::test]
async fn orchestrator_logs_per_check_lifecycle() {
    let logger = Arc::new(BufferedEventLogger::new(64, 16));
    let checks: Vec<Arc<dyn Validator>> = vec![Arc::new(ChatStructureValidator::new(
        Reporter::disabled("chat_structure"),
    ))];
    let orchestrator = Orchestrator::new(checks, Arc::new(InMemoryMetrics::new()), logger.clone());
    orchestrator.run(&dataset()).await;

    let tail = logger.validator_events_tail("chat_structure", 8);
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].message, "orchestrator.check.started");
    assert_eq!(tail[1].message, "orchestrator.check.completed");
    assert_eq!(tail[1].fields.get("status").map(String::as_str), Some("pass"));
}

#[tokio::test]
async fn registry_builds_every_local_gate() {
    for name in validators::GATE_NAMES {
        let v = validators::create_validator(name, Options::new(), Reporter::disabled(*name))
            .unwrap();
        assert_eq!(v.name(), *name);
    }
    assert!(
        validators::create_validator("no_such_gate", Options::new(), Reporter::disabled("x"))
            .is_err()
    );
    // Remote gates refuse to build without an endpoint.
    assert!(validators::create_validator(
        "remote",
        Options::new(),
        Reporter::disabled("remote")
    )
    .is_err());
    assert!(validators::create_validator(
        "remote",
        Options::new().with("endpoint", "http://localhost:8080/validate"),
        Reporter::disabled("remote")
    )
    .is_ok());
}
