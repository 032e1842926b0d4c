//! Renders the human-readable Markdown report. Pure function, no I/O — the
//! CLI and the API's report route both write or serve the returned string
//! themselves.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use types::{Instance, ScheduleReport, SolveResult, ALL_BLOCKS, ALL_PRIORITIES};

pub fn render(inst: &Instance, result: &SolveResult, schedule: &ScheduleReport) -> String {
    let mut out = String::new();

    write_introduction(&mut out);
    write_approach(&mut out);
    write_overall_statistics(&mut out, &schedule.stats);
    write_priority_breakdown(&mut out, &schedule.stats);
    write_course_popularity(&mut out, schedule);
    write_block_utilization(&mut out, schedule);
    write_student_satisfaction(&mut out, inst, schedule);
    write_student_blockwise_view(&mut out, schedule);
    write_teacher_blockwise_view(&mut out, schedule);
    write_sample_student_schedules(&mut out, schedule);
    write_sample_teacher_schedules(&mut out, schedule);

    let _ = result; // status/objective are not rendered; kept for future use
    out
}

fn write_introduction(out: &mut String) {
    out.push_str("# School Scheduling Report\n\n");
    out.push_str("## Introduction\n\n");
    out.push_str(
        "This report presents the results of the master-schedule optimization run. \
The scheduler assigns student course requests to time blocks under the school's \
operational constraints, prioritizing required requests over requested and \
recommended ones.\n\n",
    );
}

fn write_approach(out: &mut String) {
    out.push_str("## Approach\n\n");
    out.push_str(
        "Each student's requests are encoded as binary decision variables over \
(student, course, block) triples and solved as an integer program maximizing a \
priority-weighted objective, subject to one-block-per-student, one-block-per-course, \
room capacity, and teacher-exclusivity constraints. When the solver does not reach \
an optimal solution within its time budget, a deterministic priority-ordered greedy \
pass produces a feasible schedule instead.\n\n",
    );
}

fn pct(n: u32, d: u32) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64 * 100.0
    }
}

fn write_overall_statistics(out: &mut String, stats: &types::Statistics) {
    out.push_str("## Overall Statistics\n\n");
    let fulfilled = stats.fulfilled_required + stats.fulfilled_requested + stats.fulfilled_recommended;
    let unfulfilled =
        stats.unfulfilled_required + stats.unfulfilled_requested + stats.unfulfilled_recommended;
    let _ = writeln!(out, "Total requests: {}", stats.total_requests);
    let _ = writeln!(
        out,
        "Total fulfilled: {} ({:.2}%)",
        fulfilled,
        pct(fulfilled, stats.total_requests)
    );
    let _ = writeln!(
        out,
        "Total unfulfilled: {} ({:.2}%)\n",
        unfulfilled,
        pct(unfulfilled, stats.total_requests)
    );
}

fn write_priority_breakdown(out: &mut String, stats: &types::Statistics) {
    out.push_str("## Priority Breakdown\n\n");
    out.push_str("| Priority | Fulfilled | Unfulfilled | Total | Fulfillment Rate |\n");
    out.push_str("|----------|-----------|-------------|-------|------------------|\n");
    for p in ALL_PRIORITIES {
        let fulfilled = stats.fulfilled(p);
        let unfulfilled = stats.unfulfilled(p);
        let total = fulfilled + unfulfilled;
        let label = {
            let mut s = p.as_str().to_string();
            if let Some(first) = s.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            s
        };
        let _ = writeln!(
            out,
            "| **{label}** | {fulfilled} | {unfulfilled} | {total} | {:.2}% |",
            pct(fulfilled, total)
        );
    }
    out.push('\n');
}

fn write_course_popularity(out: &mut String, schedule: &ScheduleReport) {
    out.push_str("## Course Popularity Analysis\n\n");
    out.push_str("### Most Popular Courses\n\n");
    out.push_str("| Course | Students Enrolled | % of Total Students |\n");
    out.push_str("|--------|--------------------|----------------------|\n");

    let total_students = schedule.student_schedules.len() as u32;
    let mut enrollments: HashMap<&types::CourseId, HashSet<&types::StudentId>> = HashMap::new();
    for (student, by_block) in &schedule.student_schedules {
        for course in by_block.values() {
            enrollments.entry(course).or_default().insert(student);
        }
    }
    let mut counts: Vec<(&types::CourseId, usize)> =
        enrollments.iter().map(|(c, s)| (*c, s.len())).collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));

    for (course, count) in counts.into_iter().take(10) {
        let _ = writeln!(
            out,
            "| {course} | {count} | {:.2}% |",
            pct(count as u32, total_students)
        );
    }
    out.push('\n');
}

fn write_block_utilization(out: &mut String, schedule: &ScheduleReport) {
    out.push_str("## Block Utilization Analysis\n\n");
    out.push_str("### Student Distribution Across Blocks\n\n");
    out.push_str("| Block | Number of Students | Utilization % |\n");
    out.push_str("|-------|---------------------|----------------|\n");

    let total_students = schedule.student_schedules.len() as u32;
    let mut per_block: HashMap<types::Block, u32> = HashMap::new();
    for by_block in schedule.student_schedules.values() {
        for block in by_block.keys() {
            *per_block.entry(*block).or_default() += 1;
        }
    }
    for block in ALL_BLOCKS {
        let count = per_block.get(&block).copied().unwrap_or(0);
        let _ = writeln!(out, "| {block} | {count} | {:.2}% |", pct(count, total_students));
    }
    out.push('\n');
}

fn write_student_satisfaction(out: &mut String, inst: &Instance, schedule: &ScheduleReport) {
    out.push_str("## Student Satisfaction Metrics\n\n");
    out.push_str("### Overall Student Scheduling Completeness\n\n");
    out.push_str("| Satisfaction Level | Count | Percentage |\n");
    out.push_str("|---------------------|-------|------------|\n");

    let total_students = inst.students.len() as u32;
    let mut fully_satisfied = 0u32;
    let mut partially_satisfied = 0u32;
    let mut required_satisfied = 0u32;

    for student in &inst.students {
        let assigned = schedule
            .student_schedules
            .get(student)
            .map(|b| b.len())
            .unwrap_or(0);
        if assigned == ALL_BLOCKS.len() {
            fully_satisfied += 1;
        } else if assigned > 0 {
            partially_satisfied += 1;
        }

        let all_required_met = inst
            .requests_for(student)
            .map(|reqs| {
                reqs.required.iter().all(|c| {
                    schedule
                        .student_schedules
                        .get(student)
                        .map(|b| b.values().any(|sc| sc == c))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(true);
        if all_required_met {
            required_satisfied += 1;
        }
    }

    let _ = writeln!(
        out,
        "| **Full Schedule** (All blocks) | {fully_satisfied} | {:.2}% |",
        pct(fully_satisfied, total_students)
    );
    let _ = writeln!(
        out,
        "| **Partial Schedule** (Some blocks) | {partially_satisfied} | {:.2}% |",
        pct(partially_satisfied, total_students)
    );
    let _ = writeln!(
        out,
        "| **Required Courses Fulfilled** | {required_satisfied} | {:.2}% |\n",
        pct(required_satisfied, total_students)
    );
}

fn write_student_blockwise_view(out: &mut String, schedule: &ScheduleReport) {
    out.push_str("## Students Block-wise View\n\n");
    out.push_str("This view shows all students assigned to each block.\n\n");
    for block in ALL_BLOCKS {
        let _ = writeln!(out, "### Block {block}\n");
        out.push_str("| Student ID | Course |\n");
        out.push_str("|------------|--------|\n");
        let mut rows: Vec<(&types::StudentId, &types::CourseId)> = schedule
            .student_schedules
            .iter()
            .filter_map(|(s, by_block)| by_block.get(&block).map(|c| (s, c)))
            .collect();
        rows.sort_by_key(|(s, _)| s.to_string());
        for (student, course) in rows {
            let _ = writeln!(out, "| {student} | {course} |");
        }
        out.push('\n');
    }
}

fn write_teacher_blockwise_view(out: &mut String, schedule: &ScheduleReport) {
    out.push_str("## Teachers Block-wise View\n\n");
    out.push_str("This view shows all teachers assigned to each block.\n\n");
    for block in ALL_BLOCKS {
        let _ = writeln!(out, "### Block {block}\n");
        out.push_str("| Teacher ID | Course | Number of Students |\n");
        out.push_str("|------------|--------|---------------------|\n");
        let mut rows: Vec<(&types::TeacherId, &types::CourseId, usize)> = schedule
            .teacher_schedules
            .iter()
            .filter_map(|(t, by_block)| by_block.get(&block).map(|entries| (t, entries)))
            .flat_map(|(t, entries)| entries.iter().map(move |e| (t, &e.course, e.student_count)))
            .collect();
        rows.sort_by_key(|(t, _, _)| t.to_string());
        for (teacher, course, count) in rows {
            let _ = writeln!(out, "| {teacher} | {course} | {count} |");
        }
        out.push('\n');
    }
}

fn write_sample_student_schedules(out: &mut String, schedule: &ScheduleReport) {
    out.push_str("## Sample Individual Student Schedules\n\n");
    for (student, by_block) in schedule.student_schedules.iter().take(5) {
        let _ = writeln!(out, "### Student {student}\n");
        out.push_str("| Block | Course |\n");
        out.push_str("|-------|--------|\n");
        for block in ALL_BLOCKS {
            let course = by_block
                .get(&block)
                .map(|c| c.to_string())
                .unwrap_or_else(|| "Free".to_string());
            let _ = writeln!(out, "| {block} | {course} |");
        }
        out.push('\n');
    }
}

fn write_sample_teacher_schedules(out: &mut String, schedule: &ScheduleReport) {
    out.push_str("## Sample Individual Teacher Schedules\n\n");
    for (teacher, by_block) in schedule.teacher_schedules.iter().take(5) {
        let _ = writeln!(out, "### Teacher {teacher}\n");
        out.push_str("| Block | Course | Number of Students |\n");
        out.push_str("|-------|--------|---------------------|\n");
        for block in ALL_BLOCKS {
            match by_block.get(&block) {
                Some(entries) => {
                    for e in entries {
                        let _ = writeln!(out, "| {block} | {} | {} |", e.course, e.student_count);
                    }
                }
                None => {
                    let _ = writeln!(out, "| {block} | Free | 0 |");
                }
            }
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sched_core::materialize;
    use types::{Assignment, Block, CourseId, Priority, StudentId, StudentRequests, TeacherId};

    fn sample() -> (Instance, Vec<Assignment>) {
        let mut inst = Instance::default();
        let course = CourseId::from("Math");
        let student = StudentId::from("S1");
        inst.students.push(student.clone());
        inst.courses.push(course.clone());
        inst.permitted.insert(course.clone(), vec![Block::B1A]);
        inst.capacity.insert(course.clone(), 10);
        inst.teacher.insert(course.clone(), TeacherId::from("T1"));
        let mut reqs = StudentRequests::default();
        reqs.required.push(course.clone());
        inst.requests.insert(student.clone(), reqs);
        let assignments = vec![Assignment {
            student,
            course,
            block: Block::B1A,
        }];
        (inst, assignments)
    }

    #[test]
    fn renders_all_named_sections() {
        let (inst, assignments) = sample();
        let schedule = materialize::materialize(&inst, &assignments);
        let result = SolveResult {
            status: "optimal".into(),
            objective: 100.0,
            assignments,
            stats: schedule.stats.clone(),
        };
        let md = render(&inst, &result, &schedule);
        for heading in [
            "## Introduction",
            "## Approach",
            "## Overall Statistics",
            "## Priority Breakdown",
            "## Course Popularity Analysis",
            "## Block Utilization Analysis",
            "## Student Satisfaction Metrics",
            "## Students Block-wise View",
            "## Teachers Block-wise View",
            "## Sample Individual Student Schedules",
            "## Sample Individual Teacher Schedules",
        ] {
            assert!(md.contains(heading), "missing section: {heading}");
        }
        assert!(md.contains("Student S1"));
        assert!(md.contains("Free"));
    }

    #[test]
    fn priority_breakdown_reports_correct_counts() {
        let (inst, assignments) = sample();
        let schedule = materialize::materialize(&inst, &assignments);
        let result = SolveResult {
            status: "optimal".into(),
            objective: 100.0,
            assignments,
            stats: schedule.stats.clone(),
        };
        let md = render(&inst, &result, &schedule);
        assert!(md.contains("| **Required** | 1 | 0 | 1 | 100.00% |"));
    }
}
