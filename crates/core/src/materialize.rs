//! Converts a chosen assignment (from either solving strategy) into the
//! student/teacher timetables, section rosters, and fulfillment statistics
//! that external consumers see.

use std::collections::BTreeMap;

use types::{
    Assignment, Instance, Priority, SectionRoster, Statistics, StudentTimetable,
    TeacherScheduleEntry, TeacherTimetable, ALL_PRIORITIES,
};

pub fn materialize(inst: &Instance, assignments: &[Assignment]) -> types::ScheduleReport {
    let mut student_schedules: StudentTimetable = BTreeMap::new();
    let mut rosters: SectionRoster = BTreeMap::new();

    for a in assignments {
        student_schedules
            .entry(a.student.clone())
            .or_default()
            .insert(a.block, a.course.clone());
        rosters
            .entry(a.course.clone())
            .or_default()
            .entry(a.block)
            .or_default()
            .push(a.student.clone());
    }

    let mut teacher_schedules: TeacherTimetable = BTreeMap::new();
    for (course, by_block) in &rosters {
        let Some(teacher) = inst.teacher_of(course) else {
            continue;
        };
        for (block, students) in by_block {
            if students.is_empty() {
                continue;
            }
            teacher_schedules
                .entry(teacher.clone())
                .or_default()
                .entry(*block)
                .or_default()
                .push(TeacherScheduleEntry {
                    course: course.clone(),
                    student_count: students.len(),
                });
        }
    }

    let stats = compute_statistics(inst, &student_schedules);

    types::ScheduleReport {
        student_schedules,
        teacher_schedules,
        rosters,
        stats,
    }
}

fn compute_statistics(inst: &Instance, schedules: &StudentTimetable) -> Statistics {
    let mut stats = Statistics::default();
    for student in &inst.students {
        let Some(reqs) = inst.requests_for(student) else {
            continue;
        };
        let fulfilled_courses: std::collections::HashSet<&types::CourseId> = schedules
            .get(student)
            .map(|by_block| by_block.values().collect())
            .unwrap_or_default();
        for p in ALL_PRIORITIES {
            for course in reqs.courses(p) {
                if fulfilled_courses.contains(course) {
                    *stats.fulfilled_mut(p) += 1;
                } else {
                    *stats.unfulfilled_mut(p) += 1;
                }
            }
        }
    }
    stats.recompute_total();
    stats
}

pub fn objective(inst: &Instance, assignments: &[Assignment]) -> f64 {
    assignments
        .iter()
        .filter_map(|a| {
            inst.requests_for(&a.student)
                .and_then(|r| r.priority_of(&a.course))
        })
        .map(|p: Priority| p.weight())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Block, CourseId, StudentId, StudentRequests, TeacherId};

    fn single_course_instance() -> Instance {
        let mut inst = Instance::default();
        let course = CourseId::from("Math");
        let student = StudentId::from("S1");
        inst.students.push(student.clone());
        inst.courses.push(course.clone());
        inst.permitted.insert(course.clone(), vec![Block::B1A]);
        inst.capacity.insert(course.clone(), 10);
        inst.teacher.insert(course.clone(), TeacherId::from("T1"));
        let mut reqs = StudentRequests::default();
        reqs.required.push(course);
        inst.requests.insert(student, reqs);
        inst
    }

    #[test]
    fn materializes_timetables_and_roster() {
        let inst = single_course_instance();
        let assignments = vec![Assignment {
            student: StudentId::from("S1"),
            course: CourseId::from("Math"),
            block: Block::B1A,
        }];
        let report = materialize(&inst, &assignments);
        assert_eq!(
            report.student_schedules[&StudentId::from("S1")][&Block::B1A],
            CourseId::from("Math")
        );
        assert_eq!(
            report.rosters[&CourseId::from("Math")][&Block::B1A],
            vec![StudentId::from("S1")]
        );
        let teacher_entries = &report.teacher_schedules[&TeacherId::from("T1")][&Block::B1A];
        assert_eq!(teacher_entries.len(), 1);
        assert_eq!(teacher_entries[0].student_count, 1);
        assert_eq!(report.stats.fulfilled_required, 1);
        assert_eq!(report.stats.unfulfilled_required, 0);
        assert_eq!(report.stats.total_requests, 1);
    }

    #[test]
    fn unfulfilled_request_counted_when_no_assignment_made() {
        let inst = single_course_instance();
        let report = materialize(&inst, &[]);
        assert_eq!(report.stats.fulfilled_required, 0);
        assert_eq!(report.stats.unfulfilled_required, 1);
        assert!(report.student_schedules.is_empty());
    }

    #[test]
    fn objective_sums_priority_weights() {
        let inst = single_course_instance();
        let assignments = vec![Assignment {
            student: StudentId::from("S1"),
            course: CourseId::from("Math"),
            block: Block::B1A,
        }];
        assert_eq!(objective(&inst, &assignments), 100.0);
    }
}
