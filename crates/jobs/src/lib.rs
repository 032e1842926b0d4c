use parking_lot::RwLock;
use sched_core::{Instance, SolveEnvelope, SolveResult, Solver};
use std::collections::HashMap;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status")]
pub enum JobStatus {
    Queued,
    Running,
    /// `instance` is kept so the report route can render the Markdown
    /// report on demand without the caller having to resend it.
    Solved { result: SolveResult, instance: Instance },
    Failed { message: String },
}

#[derive(Clone)]
pub struct InMemJobs<S: Solver> {
    inner: std::sync::Arc<RwLock<HashMap<String, JobStatus>>>,
    solver: std::sync::Arc<S>,
}

impl<S: Solver> InMemJobs<S> {
    pub fn new(solver: S) -> Self {
        Self {
            inner: Default::default(),
            solver: std::sync::Arc::new(solver),
        }
    }

    pub fn enqueue(&self, env: SolveEnvelope) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner.write().insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let solver = self.solver.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            {
                let mut w = map.write();
                w.insert(id_for_task.clone(), JobStatus::Running);
            }
            let instance = env.instance.clone();
            match solver.solve(env).await {
                Ok(res) => {
                    map.write().insert(
                        id_for_task,
                        JobStatus::Solved {
                            result: res,
                            instance,
                        },
                    );
                }
                Err(e) => {
                    error!(?e, "job failed");
                    map.write().insert(
                        id_for_task,
                        JobStatus::Failed {
                            message: e.to_string(),
                        },
                    );
                }
            }
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use types::{Instance, SolveParams, Statistics};

    struct AlwaysSolves;

    #[async_trait]
    impl Solver for AlwaysSolves {
        async fn solve(&self, _env: SolveEnvelope) -> anyhow::Result<SolveResult> {
            Ok(SolveResult {
                status: "optimal".into(),
                objective: 0.0,
                assignments: vec![],
                stats: Statistics::default(),
            })
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Solver for AlwaysFails {
        async fn solve(&self, _env: SolveEnvelope) -> anyhow::Result<SolveResult> {
            anyhow::bail!("boom")
        }
    }

    fn empty_envelope() -> SolveEnvelope {
        SolveEnvelope {
            instance: Instance::default(),
            params: SolveParams::default(),
        }
    }

    #[tokio::test]
    async fn enqueue_transitions_to_solved() {
        let jobs = InMemJobs::new(AlwaysSolves);
        let id = jobs.enqueue(empty_envelope());
        for _ in 0..50 {
            if matches!(jobs.get(&id.0), Some(JobStatus::Solved { .. })) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("job never reached Solved status");
    }

    #[tokio::test]
    async fn enqueue_transitions_to_failed() {
        let jobs = InMemJobs::new(AlwaysFails);
        let id = jobs.enqueue(empty_envelope());
        for _ in 0..50 {
            if matches!(jobs.get(&id.0), Some(JobStatus::Failed { .. })) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("job never reached Failed status");
    }

    #[test]
    fn unknown_job_id_returns_none() {
        let jobs = InMemJobs::new(AlwaysSolves);
        assert!(jobs.get("does-not-exist").is_none());
    }
}
