//! Deterministic, priority-ordered constructive fallback. Trades optimality
//! for guaranteed termination and is also directly selectable as a cheap
//! always-terminating strategy, not only as the MILP's fallback.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sched_core::{materialize, Instance, SolveEnvelope, SolveResult, Solver};
use types::{Assignment, Block, CourseId, StudentId, ALL_PRIORITIES};

pub const FALLBACK_STATUS: &str = "fallback";

/// Runs the three-pass greedy construction and returns the raw assignments.
/// Exposed standalone so the MILP solver can call into the same single
/// source of truth for its own fallback path.
pub fn solve_greedy(inst: &Instance) -> Vec<Assignment> {
    let mut assignments: Vec<Assignment> = Vec::new();

    // (course, block) -> current enrollment count
    let mut enrollment: HashMap<(&CourseId, Block), u32> = HashMap::new();
    // teacher id -> block -> the single course currently active there
    let mut teacher_busy: HashMap<(&types::TeacherId, Block), &CourseId> = HashMap::new();
    // student -> blocks already occupied this student
    let mut student_used: HashMap<&StudentId, HashSet<Block>> = HashMap::new();

    for priority in ALL_PRIORITIES {
        for student in &inst.students {
            let Some(reqs) = inst.requests_for(student) else {
                continue;
            };
            let used = student_used.entry(student).or_default();
            for course in reqs.courses(priority) {
                let permitted = inst.permitted_blocks(course);
                let capacity = inst.capacity_of(course);
                let teacher = inst.teacher_of(course);

                let placement = permitted.iter().copied().find(|block| {
                    if used.contains(block) {
                        return false;
                    }
                    let enrolled = enrollment.get(&(course, *block)).copied().unwrap_or(0);
                    if enrolled >= capacity {
                        return false;
                    }
                    if let Some(t) = teacher {
                        if let Some(&active) = teacher_busy.get(&(t, *block)) {
                            if active != course {
                                return false;
                            }
                        }
                    }
                    true
                });

                if let Some(block) = placement {
                    used.insert(block);
                    *enrollment.entry((course, block)).or_insert(0) += 1;
                    if let Some(t) = teacher {
                        teacher_busy.insert((t, block), course);
                    }
                    assignments.push(Assignment {
                        student: student.clone(),
                        course: course.clone(),
                        block,
                    });
                }
            }
        }
    }

    assignments
}

pub struct HeurSolver;

impl HeurSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeurSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Solver for HeurSolver {
    async fn solve(&self, env: SolveEnvelope) -> anyhow::Result<SolveResult> {
        let inst = env.instance;
        let assignments = solve_greedy(&inst);
        let objective = sched_core::materialize::objective(&inst, &assignments);
        let report = materialize(&inst, &assignments);
        Ok(SolveResult {
            status: FALLBACK_STATUS.to_string(),
            objective,
            assignments,
            stats: report.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sched_core::check_output_invariants;
    use types::{Priority, StudentRequests, TeacherId};

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

    #[test]
    fn trivial_feasibility() {
        let inst = instance_with(
            vec![("C", vec![Block::B1A], 10, "T")],
            vec![("S1", "C", Priority::Required)],
        );
        let assignments = solve_greedy(&inst);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].block, Block::B1A);
        assert!(check_output_invariants(&inst, &assignments).is_empty());
    }

    #[test]
    fn capacity_cap_limits_enrollment() {
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
        let assignments = solve_greedy(&inst);
        assert_eq!(assignments.len(), 3);
        assert!(check_output_invariants(&inst, &assignments).is_empty());
    }

    #[test]
    fn teacher_exclusivity_respected() {
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
        let assignments = solve_greedy(&inst);
        assert_eq!(assignments.len(), 2);
        assert!(check_output_invariants(&inst, &assignments).is_empty());
    }

    #[test]
    fn priority_dominance_within_a_student() {
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
        let assignments = solve_greedy(&inst);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].course, CourseId::from("C1"));
    }

    #[test]
    fn deterministic_across_runs() {
        let inst = instance_with(
            vec![("C", vec![Block::B1A, Block::B1B], 2, "T")],
            vec![
                ("S1", "C", Priority::Required),
                ("S2", "C", Priority::Required),
                ("S3", "C", Priority::Required),
            ],
        );
        let a = solve_greedy(&inst);
        let b = solve_greedy(&inst);
        assert_eq!(a, b);
    }
}
