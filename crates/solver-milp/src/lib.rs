#[cfg(feature = "with-milp")]
mod milp_core;

use async_trait::async_trait;
use sched_core::{Instance, SolveEnvelope, SolveResult, Solver};
use tracing::info;

pub const OPTIMAL_STATUS: &str = "optimal";

pub struct MilpSolver;

impl MilpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MilpSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Solver for MilpSolver {
    async fn solve(&self, env: SolveEnvelope) -> anyhow::Result<SolveResult> {
        info!(
            students = env.instance.students.len(),
            courses = env.instance.courses.len(),
            "received instance"
        );

        #[cfg(feature = "with-milp")]
        {
            match solve_with_milp(&env) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    info!(error = %e, "MILP solve did not reach optimal; falling back to greedy");
                }
            }
        }
        #[cfg(not(feature = "with-milp"))]
        {
            info!("with-milp feature disabled; using greedy fallback");
        }

        Ok(solve_via_fallback(&env.instance))
    }
}

fn solve_via_fallback(inst: &Instance) -> SolveResult {
    let assignments = solver_heur::solve_greedy(inst);
    let objective = sched_core::materialize::objective(inst, &assignments);
    let report = sched_core::materialize::materialize(inst, &assignments);
    SolveResult {
        status: solver_heur::FALLBACK_STATUS.to_string(),
        objective,
        assignments,
        stats: report.stats,
    }
}

#[cfg(feature = "with-milp")]
fn solve_with_milp(env: &SolveEnvelope) -> anyhow::Result<SolveResult> {
    use good_lp::{default_solver, ProblemVariables, Solution, SolverModel};
    use milp_core::*;

    let inst = &env.instance;
    let prep = build_prep(inst);

    let mut pvars = ProblemVariables::new();
    let xs = declare_x_vars(&prep, &mut pvars);
    let zs = declare_z_vars(&prep, &mut pvars);

    if xs.is_empty() {
        anyhow::bail!("no feasible (student, course, block) triples to solve over");
    }

    let objective = build_objective(&prep, &xs);
    let mut model = pvars.maximise(objective.clone()).using(default_solver);
    model = model.set_option("threads", 1);
    model = model.set_option("random_seed", env.params.seed as i32);
    if let Some(limit) = env.params.time_limit_secs {
        model = model.set_option("time_limit", limit as f64);
    }

    model = add_student_block_constraints(model, &xs);
    model = add_student_course_constraints(model, &xs);
    model = add_course_capacity_constraints(model, &prep, &xs);
    model = add_teacher_exclusivity_constraints(model, &prep, &xs, &zs);

    let solution = model
        .solve()
        .map_err(|e| anyhow::anyhow!("solver did not reach an optimal solution: {e}"))?;

    let assignments = extract_solution(&xs, &solution);
    let objective_value = solution.eval(objective);
    let report = sched_core::materialize::materialize(inst, &assignments);

    Ok(SolveResult {
        status: OPTIMAL_STATUS.to_string(),
        objective: objective_value,
        assignments,
        stats: report.stats,
    })
}

#[cfg(all(test, feature = "with-milp"))]
mod tests {
    use super::*;
    use sched_core::check_output_invariants;
    use types::{Block, CourseId, Priority, StudentId, TeacherId};

    fn instance_with(
        courses: Vec<(&str, Vec<Block>, u32, &str)>,
        requests: Vec<(&str, &str, Priority)>,
    ) -> Instance {
        let mut inst = Instance::default();
        for (name, blocks, capacity, teacher) in courses {
            let id = CourseId::from(name);
            inst.courses.push(id.clone());
            inst.permitted.insert(id.clone(), blocks);
            inst.capacity.insert(id.clone(), capacity);
            inst.teacher.insert(id, TeacherId::from(teacher));
        }
        for (student, course, priority) in requests {
            let sid = StudentId::from(student);
            if !inst.students.contains(&sid) {
                inst.students.push(sid.clone());
            }
            let entry = inst.requests.entry(sid).or_default();
            entry.courses_mut(priority).push(CourseId::from(course));
        }
        inst
    }

    #[tokio::test]
    async fn trivial_feasibility_solves_optimally() {
        let inst = instance_with(
            vec![("C", vec![Block::B1A], 10, "T")],
            vec![("S1", "C", Priority::Required)],
        );
        let env = SolveEnvelope {
            instance: inst.clone(),
            params: Default::default(),
        };
        let result = MilpSolver::new().solve(env).await.unwrap();
        assert_eq!(result.status, OPTIMAL_STATUS);
        assert_eq!(result.stats.fulfilled_required, 1);
        assert!(check_output_invariants(&inst, &result.assignments).is_empty());
    }

    #[tokio::test]
    async fn capacity_cap_bounds_enrollment() {
        let inst = instance_with(
            vec![("C", vec![Block::B1A], 3, "T")],
            vec![
                ("S1", "C", Priority::Required),
                ("S2", "C", Priority::Required),
                ("S3", "C", Priority::Required),
                ("S4", "C", Priority::Required),
                ("S5", "C", Priority::Required),
            ],
        );
        let env = SolveEnvelope {
            instance: inst.clone(),
            params: Default::default(),
        };
        let result = MilpSolver::new().solve(env).await.unwrap();
        assert_eq!(result.stats.fulfilled_required, 3);
        assert_eq!(result.stats.unfulfilled_required, 2);
        assert!(check_output_invariants(&inst, &result.assignments).is_empty());
    }

    #[tokio::test]
    async fn teacher_exclusivity_holds_at_optimum() {
        let inst = instance_with(
            vec![
                ("C1", vec![Block::B1A, Block::B1B], 10, "T"),
                ("C2", vec![Block::B1A, Block::B1B], 10, "T"),
            ],
            vec![
                ("S1", "C1", Priority::Required),
                ("S2", "C2", Priority::Required),
            ],
        );
        let env = SolveEnvelope {
            instance: inst.clone(),
            params: Default::default(),
        };
        let result = MilpSolver::new().solve(env).await.unwrap();
        assert_eq!(result.stats.fulfilled_required, 2);
        assert!(check_output_invariants(&inst, &result.assignments).is_empty());
    }

    #[tokio::test]
    async fn priority_dominance_prefers_required() {
        let inst = instance_with(
            vec![
                ("C1", vec![Block::B1A], 10, "T1"),
                ("C2", vec![Block::B1A], 10, "T2"),
            ],
            vec![
                ("S1", "C1", Priority::Required),
                ("S1", "C2", Priority::Recommended),
            ],
        );
        let env = SolveEnvelope {
            instance: inst,
            params: Default::default(),
        };
        let result = MilpSolver::new().solve(env).await.unwrap();
        assert_eq!(result.stats.fulfilled_required, 1);
        assert_eq!(result.stats.unfulfilled_recommended, 1);
    }
}
