//! Builds the sparse binary-variable MIP described by the model: one
//! variable per (student, course, block) triple that is actually requested
//! and permitted, plus the auxiliary teacher-exclusivity variables.

use std::collections::{HashMap, HashSet};

use good_lp::{Expression, ProblemVariables, Solution, SolverModel, Variable};
use types::{Assignment, Block, CourseId, Instance, StudentId, TeacherId};

#[derive(Clone)]
pub(crate) struct XVar {
    pub student: StudentId,
    pub course: CourseId,
    pub block: Block,
    pub var: Variable,
}

pub(crate) struct Prep<'a> {
    pub inst: &'a Instance,
    /// Unordered pairs of courses sharing a teacher, restricted to teachers
    /// with two or more courses — the only pairs the exclusivity constraint
    /// needs to consider.
    pub teacher_pairs: Vec<(TeacherId, CourseId, CourseId)>,
}

pub(crate) fn build_prep(inst: &Instance) -> Prep<'_> {
    let mut by_teacher: HashMap<&TeacherId, Vec<&CourseId>> = HashMap::new();
    for course in &inst.courses {
        if let Some(teacher) = inst.teacher_of(course) {
            by_teacher.entry(teacher).or_default().push(course);
        }
    }

    let mut teacher_pairs = Vec::new();
    for (teacher, courses) in by_teacher {
        for i in 0..courses.len() {
            for j in (i + 1)..courses.len() {
                teacher_pairs.push((teacher.clone(), courses[i].clone(), courses[j].clone()));
            }
        }
    }

    Prep { inst, teacher_pairs }
}

pub(crate) fn declare_x_vars(prep: &Prep, vars: &mut ProblemVariables) -> Vec<XVar> {
    let mut xs = Vec::new();
    for student in &prep.inst.students {
        let Some(reqs) = prep.inst.requests_for(student) else {
            continue;
        };
        for (course, _priority) in reqs.all() {
            for &block in prep.inst.permitted_blocks(course) {
                let var = vars.add(good_lp::variable().binary());
                xs.push(XVar {
                    student: student.clone(),
                    course: course.clone(),
                    block,
                    var,
                });
            }
        }
    }
    xs
}

pub(crate) struct ZVar {
    pub course1: CourseId,
    pub course2: CourseId,
    pub block: Block,
    pub var: Variable,
}

/// Declares one auxiliary binary per (teacher-shared course pair, shared
/// permitted block). Must run before the model is built from
/// `ProblemVariables` — good_lp has no way to add variables afterward.
pub(crate) fn declare_z_vars(prep: &Prep, vars: &mut ProblemVariables) -> Vec<ZVar> {
    let mut zs = Vec::new();
    for (_teacher, c1, c2) in &prep.teacher_pairs {
        let blocks1: HashSet<Block> = prep.inst.permitted_blocks(c1).iter().copied().collect();
        let blocks2: HashSet<Block> = prep.inst.permitted_blocks(c2).iter().copied().collect();
        for &block in blocks1.intersection(&blocks2) {
            zs.push(ZVar {
                course1: c1.clone(),
                course2: c2.clone(),
                block,
                var: vars.add(good_lp::variable().binary()),
            });
        }
    }
    zs
}

pub(crate) fn build_objective(prep: &Prep, xs: &[XVar]) -> Expression {
    let mut objective = Expression::from(0.0);
    for x in xs {
        let weight = prep
            .inst
            .requests_for(&x.student)
            .and_then(|r| r.priority_of(&x.course))
            .map(|p| p.weight())
            .unwrap_or(0.0);
        objective = objective + weight * x.var;
    }
    objective
}

/// Constraint 1: per-student, per-block uniqueness.
pub(crate) fn add_student_block_constraints<M: SolverModel>(mut model: M, xs: &[XVar]) -> M {
    let mut by_student_block: HashMap<(&StudentId, Block), Expression> = HashMap::new();
    for x in xs {
        *by_student_block
            .entry((&x.student, x.block))
            .or_insert_with(|| Expression::from(0.0)) += x.var;
    }
    for sum in by_student_block.into_values() {
        model = model.with(sum.leq(1.0));
    }
    model
}

/// Constraint 2: per-student, per-course at-most-once.
pub(crate) fn add_student_course_constraints<M: SolverModel>(mut model: M, xs: &[XVar]) -> M {
    let mut by_student_course: HashMap<(&StudentId, &CourseId), Expression> = HashMap::new();
    for x in xs {
        *by_student_course
            .entry((&x.student, &x.course))
            .or_insert_with(|| Expression::from(0.0)) += x.var;
    }
    for sum in by_student_course.into_values() {
        model = model.with(sum.leq(1.0));
    }
    model
}

/// Constraint 3: course capacity per block.
pub(crate) fn add_course_capacity_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    xs: &[XVar],
) -> M {
    let mut by_course_block: HashMap<(&CourseId, Block), Expression> = HashMap::new();
    for x in xs {
        *by_course_block
            .entry((&x.course, x.block))
            .or_insert_with(|| Expression::from(0.0)) += x.var;
    }
    for ((course, _block), sum) in by_course_block {
        let cap = prep.inst.capacity_of(course);
        model = model.with(sum.leq(cap as f64));
    }
    model
}

/// Constraint 4: teacher exclusivity across co-taught courses, via the
/// pairwise big-M auxiliary binaries declared by `declare_z_vars`.
pub(crate) fn add_teacher_exclusivity_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    xs: &[XVar],
    zs: &[ZVar],
) -> M {
    let mut enrollment_by_course_block: HashMap<(&CourseId, Block), Expression> = HashMap::new();
    for x in xs {
        *enrollment_by_course_block
            .entry((&x.course, x.block))
            .or_insert_with(|| Expression::from(0.0)) += x.var;
    }

    for z in zs {
        let m1 = prep.inst.capacity_of(&z.course1) as f64;
        let m2 = prep.inst.capacity_of(&z.course2) as f64;
        if let Some(sum1) = enrollment_by_course_block.get(&(&z.course1, z.block)) {
            model = model.with(sum1.clone().leq(m1 * (1.0 - z.var)));
        }
        if let Some(sum2) = enrollment_by_course_block.get(&(&z.course2, z.block)) {
            model = model.with(sum2.clone().leq(m2 * z.var));
        }
    }
    model
}

pub(crate) fn extract_solution(xs: &[XVar], sol: &impl Solution) -> Vec<Assignment> {
    xs.iter()
        .filter(|x| sol.value(x.var) > 0.5)
        .map(|x| Assignment {
            student: x.student.clone(),
            course: x.course.clone(),
            block: x.block,
        })
        .collect()
}
