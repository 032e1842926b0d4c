pub mod adapter;
pub mod materialize;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

pub use adapter::{adapt, AdaptError};
pub use materialize::materialize;
pub use types::{Assignment, Instance, SolveEnvelope, SolveParams, SolveResult};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid instance: {0}")]
    Msg(String),
}

/// Checks the structural invariants an [`Instance`] must satisfy before it is
/// handed to a solver: every request references a declared course, and every
/// course carries at least one permitted block.
pub fn validate(inst: &Instance) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    let known_courses: HashSet<&types::CourseId> = inst.courses.iter().collect();

    for (student, reqs) in &inst.requests {
        for (course, _priority) in reqs.all() {
            if !known_courses.contains(course) {
                errors.push(format!(
                    "student {student} requests unknown course {course}"
                ));
            }
        }
    }

    for course in &inst.courses {
        if inst.permitted_blocks(course).is_empty() {
            errors.push(format!("course {course} has no permitted blocks"));
        }
        if inst.capacity_of(course) == 0 {
            errors.push(format!("course {course} has zero capacity"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

/// Checks the five universal output invariants against a produced assignment.
/// Violations here indicate an implementation bug in a solving strategy, not
/// a malformed input — callers treat a non-empty result as a fatal assertion.
pub fn check_output_invariants(inst: &Instance, assignments: &[Assignment]) -> Vec<String> {
    use std::collections::HashMap;
    let mut problems = Vec::new();

    let mut student_block: HashMap<(&types::StudentId, types::Block), u32> = HashMap::new();
    let mut student_course: HashMap<(&types::StudentId, &types::CourseId), u32> = HashMap::new();
    let mut course_block_count: HashMap<(&types::CourseId, types::Block), u32> = HashMap::new();
    let mut teacher_block_courses: HashMap<
        (&types::TeacherId, types::Block),
        HashSet<&types::CourseId>,
    > = HashMap::new();

    for a in assignments {
        *student_block.entry((&a.student, a.block)).or_default() += 1;
        *student_course.entry((&a.student, &a.course)).or_default() += 1;
        *course_block_count.entry((&a.course, a.block)).or_default() += 1;

        if let Some(reqs) = inst.requests_for(&a.student) {
            if reqs.priority_of(&a.course).is_none() {
                problems.push(format!(
                    "unsolicited assignment: student {} was never offered course {}",
                    a.student, a.course
                ));
            }
        }
        if !inst.permitted_blocks(&a.course).contains(&a.block) {
            problems.push(format!(
                "course {} assigned at disallowed block {}",
                a.course, a.block
            ));
        }
        if let Some(teacher) = inst.teacher_of(&a.course) {
            teacher_block_courses
                .entry((teacher, a.block))
                .or_default()
                .insert(&a.course);
        }
    }

    for ((student, block), count) in &student_block {
        if *count > 1 {
            problems.push(format!(
                "student {student} has {count} courses at block {block}"
            ));
        }
    }
    for ((student, course), count) in &student_course {
        if *count > 1 {
            problems.push(format!(
                "student {student} assigned to course {course} in {count} blocks"
            ));
        }
    }
    for ((course, block), count) in &course_block_count {
        let cap = inst.capacity_of(course);
        if *count > cap {
            problems.push(format!(
                "course {course} at block {block} has {count} students over capacity {cap}"
            ));
        }
    }
    for ((teacher, block), courses) in &teacher_block_courses {
        if courses.len() > 1 {
            problems.push(format!(
                "teacher {teacher} teaches {} active courses at block {block}",
                courses.len()
            ));
        }
    }

    problems
}

#[async_trait]
pub trait Solver: Send + Sync + 'static {
    async fn solve(&self, env: SolveEnvelope) -> anyhow::Result<SolveResult>;
}
