use async_trait::async_trait;
use jobs::InMemJobs;
use sched_core::{SolveEnvelope, SolveResult, Solver};
use solver_heur::HeurSolver;
use solver_milp::MilpSolver;
use std::sync::Arc;
use types::SolverKind;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<DispatchSolver>>,
}

/// Routes an incoming envelope to the solver named by `params.solver`.
#[derive(Clone)]
pub struct DispatchSolver {
    milp: Arc<MilpSolver>,
    heur: Arc<HeurSolver>,
}

impl DispatchSolver {
    pub fn new() -> Self {
        Self {
            milp: Arc::new(MilpSolver::new()),
            heur: Arc::new(HeurSolver::new()),
        }
    }
}

impl Default for DispatchSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Solver for DispatchSolver {
    async fn solve(&self, env: SolveEnvelope) -> anyhow::Result<SolveResult> {
        match env.params.solver {
            SolverKind::Milp => self.milp.solve(env).await,
            SolverKind::Greedy => self.heur.solve(env).await,
        }
    }
}

impl AppState {
    pub fn new_default() -> Self {
        let jobs = InMemJobs::new(DispatchSolver::new());
        Self {
            jobs: Arc::new(jobs),
        }
    }
}
