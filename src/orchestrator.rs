//! Concurrent reconciliation of every configured domain.

use crate::config::{DomainConfig, GlobalDefaults};
use crate::detector::ResolvedAddress;
use crate::error::Result;
use crate::providers::DnsProvider;
use crate::reconciler::{reconcile, ReconcileAction};
use crate::retry::RetryPolicy;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Result of one domain's task.
#[derive(Debug, Clone)]
pub struct ReconciliationOutcome {
    pub domain: String,
    pub success: bool,
    pub error: Option<String>,
}

impl ReconciliationOutcome {
    fn succeeded(domain: String) -> Self {
        Self {
            domain,
            success: true,
            error: None,
        }
    }

    fn failed(domain: String, error: impl ToString) -> Self {
        Self {
            domain,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Process-level verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::SUCCESS,
            ExitStatus::Failure => ExitCode::FAILURE,
        }
    }
}

/// Outcomes of a run, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<ReconciliationOutcome>,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &ReconciliationOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// Success only if every domain succeeded.
    pub fn status(&self) -> ExitStatus {
        if self.failed().next().is_none() {
            ExitStatus::Success
        } else {
            ExitStatus::Failure
        }
    }
}

enum Task {
    Spawned(JoinHandle<Result<ReconcileAction>>),
    Rejected(String),
}

/// Fans out one task per domain and waits for all of them.
pub struct Orchestrator {
    provider: Arc<dyn DnsProvider>,
    policy: RetryPolicy,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn DnsProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Reconcile every domain against `address`. A failing domain never
    /// prevents or cancels the others.
    pub async fn run(
        &self,
        address: ResolvedAddress,
        domains: &[DomainConfig],
        defaults: GlobalDefaults,
    ) -> RunReport {
        let mut tasks = Vec::with_capacity(domains.len());

        for domain in domains {
            let name = domain.domain.clone();
            let target = match domain.resolve(defaults) {
                Ok(target) => target,
                Err(e) => {
                    tracing::error!("skipping {}: {}", name, e);
                    tasks.push((name, Task::Rejected(e.to_string())));
                    continue;
                }
            };

            let provider = Arc::clone(&self.provider);
            let policy = self.policy;
            let handle = tokio::spawn(async move {
                let description = format!("configuring DNS for {}", target.name);
                policy
                    .run(&description, || reconcile(&address, &target, provider.as_ref()))
                    .await
            });
            tasks.push((name, Task::Spawned(handle)));
        }

        let mut report = RunReport::default();
        for (name, task) in tasks {
            let outcome = match task {
                Task::Spawned(handle) => match handle.await {
                    Ok(Ok(_)) => ReconciliationOutcome::succeeded(name),
                    Ok(Err(e)) => ReconciliationOutcome::failed(name, e),
                    Err(e) => {
                        tracing::error!("task for {} did not complete: {}", name, e);
                        ReconciliationOutcome::failed(name, e)
                    }
                },
                Task::Rejected(error) => ReconciliationOutcome::failed(name, error),
            };
            report.outcomes.push(outcome);
        }

        report
    }
}
