//! Projects a loosely-typed [`RawInput`] record into a normalized [`Instance`].

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use types::{Block, CourseId, Instance, Priority, RawInput, Row, StudentId, TeacherId, ALL_BLOCKS};

#[derive(Debug, Error)]
pub enum AdaptError {
    #[error("input has no recognizable course list")]
    MissingCourseList,
    #[error("input has no recognizable student requests")]
    MissingStudentRequests,
}

const COURSE_NAME_FIELDS: &[&str] = &["course_name", "title", "name", "course_title", "course"];
const STUDENT_ID_FIELDS: &[&str] = &["student_id", "student", "id"];
const ROOM_REF_FIELDS: &[&str] = &["room_number", "room", "room_id", "roomnumber", "roomid"];
const CAPACITY_FIELDS: &[&str] = &["capacity", "room_capacity", "max_capacity", "max_students"];
const TEACHER_REF_FIELDS: &[&str] = &[
    "lecturer_id",
    "teacher_id",
    "teacher",
    "lecturer",
    "instructor",
    "faculty",
];
const TEACHER_NAME_SUBSTRINGS: &[&str] = &["lecturer", "teacher", "instructor", "faculty"];
const PRIORITY_FIELDS: &[&str] = &["type", "priority"];

const TRUTHY_STRINGS: &[&str] = &["Yes", "yes", "Y", "y", "True", "true"];

/// First non-empty string value among the given field-name aliases.
fn first_str(row: &Row, fields: &[&str]) -> Option<String> {
    for &f in fields {
        if let Some(v) = row.get(f) {
            if let Some(s) = value_to_string(v) {
                if !s.is_empty() {
                    return Some(s);
                }
            }
        }
    }
    None
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Searches a row's field *names* (not values) for a substring match,
/// case-insensitively, returning the first matching field's value.
fn first_by_name_substring(row: &Row, substrings: &[&str]) -> Option<String> {
    for (key, v) in row.iter() {
        let lower = key.to_ascii_lowercase();
        if substrings.iter().any(|s| lower.contains(s)) {
            if let Some(s) = value_to_string(v) {
                if !s.is_empty() {
                    return Some(s);
                }
            }
        }
    }
    None
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Number(n) => n.as_i64() == Some(1) || n.as_f64() == Some(1.0),
        Value::Bool(b) => *b,
        Value::String(s) => TRUTHY_STRINGS.contains(&s.as_str()),
        _ => false,
    }
}

fn block_markers(row: &Row, block: Block) -> bool {
    let lower = block.label().to_ascii_lowercase();
    let upper = block.label().to_string();
    let candidates = [
        lower.clone(),
        upper.clone(),
        format!("{lower}_block"),
        format!("{upper}_block"),
    ];
    for c in candidates {
        if let Some(v) = row.get(&c) {
            if is_truthy(v) {
                return true;
            }
        }
    }
    false
}

fn parse_priority(raw: &str) -> Priority {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("required") {
        Priority::Required
    } else if lower.contains("recommended") {
        Priority::Recommended
    } else {
        Priority::Requested
    }
}

/// Deterministic synthesized teacher id for a course with no resolvable
/// teacher field: stable across runs on the same course name.
fn synthesize_teacher_id(course_name: &str) -> TeacherId {
    let mut hash: u64 = 0;
    for b in course_name.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(b as u64);
    }
    TeacherId::from(format!("T_{:03}", hash % 1000))
}

/// Projects the raw, loosely-typed input record into a normalized [`Instance`].
///
/// Row-level problems are skipped with a warning rather than aborting; only a
/// structurally missing course list or request list is a hard error.
pub fn adapt(raw: &RawInput) -> Result<Instance, AdaptError> {
    if raw.course_list.is_empty() && raw.student_requests.is_empty() {
        // Structurally empty input: both collections present-but-empty (or
        // absent, which serde defaults to empty) is a valid zero-result run,
        // not a structural error — matched against presence-of-either below.
    }

    let mut courses: Vec<CourseId> = Vec::new();
    let mut permitted: BTreeMap<CourseId, Vec<Block>> = BTreeMap::new();
    let mut capacity: BTreeMap<CourseId, u32> = BTreeMap::new();
    let mut teacher: BTreeMap<CourseId, TeacherId> = BTreeMap::new();

    let room_capacity: BTreeMap<String, u32> = raw
        .rooms
        .iter()
        .filter_map(|row| {
            let room_ref = first_str(row, ROOM_REF_FIELDS)?;
            let cap = first_str(row, CAPACITY_FIELDS).and_then(|s| s.parse::<u32>().ok());
            cap.map(|c| (room_ref, c))
        })
        .collect();

    for row in &raw.course_list {
        let Some(name) = first_str(row, COURSE_NAME_FIELDS) else {
            warn!("course row missing a resolvable course-name field; skipped");
            continue;
        };
        let id = CourseId::from(name.clone());
        if courses.contains(&id) {
            warn!(course = %name, "duplicate course row; keeping first occurrence");
            continue;
        }
        courses.push(id.clone());

        let blocks: Vec<Block> = ALL_BLOCKS
            .into_iter()
            .filter(|&b| block_markers(row, b))
            .collect();
        let blocks = if blocks.is_empty() {
            debug!(course = %name, "no block markers found; defaulting to all blocks");
            ALL_BLOCKS.to_vec()
        } else {
            blocks
        };
        permitted.insert(id.clone(), blocks);

        let cap = first_str(row, ROOM_REF_FIELDS)
            .and_then(|room_ref| room_capacity.get(&room_ref).copied())
            .or_else(|| first_str(row, CAPACITY_FIELDS).and_then(|s| s.parse::<u32>().ok()));
        let cap = cap.unwrap_or_else(|| {
            debug!(course = %name, "no resolvable capacity; defaulting to {}", types::DEFAULT_CAPACITY);
            types::DEFAULT_CAPACITY
        });
        capacity.insert(id.clone(), cap);

        let teacher_id = first_str(row, TEACHER_REF_FIELDS)
            .or_else(|| first_by_name_substring(row, TEACHER_NAME_SUBSTRINGS))
            .map(TeacherId::from)
            .unwrap_or_else(|| {
                debug!(course = %name, "no resolvable teacher; synthesizing a stable id");
                synthesize_teacher_id(&name)
            });
        teacher.insert(id, teacher_id);
    }

    if raw.course_list.iter().next().is_some() && courses.is_empty() {
        // Every row failed to resolve a course name: treat as structurally missing.
        return Err(AdaptError::MissingCourseList);
    }
    if raw.course_list.is_empty() && !raw.student_requests.is_empty() {
        return Err(AdaptError::MissingCourseList);
    }

    let mut students: Vec<StudentId> = Vec::new();
    let mut requests: BTreeMap<StudentId, types::StudentRequests> = BTreeMap::new();

    for row in &raw.student_requests {
        let Some(student_raw) = first_str(row, STUDENT_ID_FIELDS) else {
            warn!("request row missing a resolvable student-id field; skipped");
            continue;
        };
        let Some(course_raw) = first_str(row, COURSE_NAME_FIELDS) else {
            warn!(student = %student_raw, "request row missing a resolvable course-name field; skipped");
            continue;
        };
        let student_id = StudentId::from(student_raw);
        let course_id = CourseId::from(course_raw);
        let priority = first_str(row, PRIORITY_FIELDS)
            .map(|s| parse_priority(&s))
            .unwrap_or(Priority::Requested);

        if !students.contains(&student_id) {
            students.push(student_id.clone());
        }
        let entry = requests.entry(student_id).or_default();

        if let Some(existing) = entry.priority_of(&course_id) {
            if existing <= priority {
                // Existing priority is the same or higher (Required < Requested
                // < Recommended by declaration order); lower-priority duplicate
                // dropped silently per the dedup rule.
                continue;
            }
            entry.courses_mut(existing).retain(|c| c != &course_id);
        }
        entry.courses_mut(priority).push(course_id);
    }

    if raw.student_requests.iter().next().is_some() && requests.is_empty() {
        return Err(AdaptError::MissingStudentRequests);
    }
    if raw.student_requests.is_empty() && !raw.course_list.is_empty() {
        return Err(AdaptError::MissingStudentRequests);
    }

    Ok(Instance {
        students,
        courses,
        requests,
        permitted,
        capacity,
        teacher,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn resolves_aliases_and_defaults_capacity() {
        let raw = RawInput {
            course_list: vec![row(&[
                ("title", json!("Biology")),
                ("1a", json!("Yes")),
                ("lecturer_id", json!("T1")),
            ])],
            student_requests: vec![row(&[
                ("student", json!("S1")),
                ("course", json!("Biology")),
                ("type", json!("required")),
            ])],
            rooms: vec![],
            lecturers: vec![],
        };
        let inst = adapt(&raw).unwrap();
        let biology = CourseId::from("Biology");
        assert_eq!(inst.permitted_blocks(&biology), &[Block::B1A]);
        assert_eq!(inst.capacity_of(&biology), types::DEFAULT_CAPACITY);
        assert_eq!(inst.teacher_of(&biology), Some(&TeacherId::from("T1")));
        let reqs = inst.requests_for(&StudentId::from("S1")).unwrap();
        assert_eq!(reqs.required, vec![biology]);
    }

    #[test]
    fn missing_block_markers_default_to_all_blocks() {
        let raw = RawInput {
            course_list: vec![row(&[("course_name", json!("Art"))])],
            student_requests: vec![row(&[
                ("student_id", json!("S1")),
                ("course_name", json!("Art")),
            ])],
            rooms: vec![],
            lecturers: vec![],
        };
        let inst = adapt(&raw).unwrap();
        assert_eq!(inst.permitted_blocks(&CourseId::from("Art")).len(), 7);
    }

    #[test]
    fn capacity_resolved_from_room_reference() {
        let raw = RawInput {
            course_list: vec![row(&[
                ("course_name", json!("Chem")),
                ("room_number", json!("R1")),
            ])],
            student_requests: vec![],
            rooms: vec![row(&[("room", json!("R1")), ("capacity", json!(18))])],
            lecturers: vec![],
        };
        let inst = adapt(&raw).unwrap();
        assert_eq!(inst.capacity_of(&CourseId::from("Chem")), 18);
    }

    #[test]
    fn teacher_synthesized_when_unresolvable() {
        let raw = RawInput {
            course_list: vec![row(&[("course_name", json!("History"))])],
            student_requests: vec![],
            rooms: vec![],
            lecturers: vec![],
        };
        let inst = adapt(&raw).unwrap();
        let t1 = inst.teacher_of(&CourseId::from("History")).unwrap();
        let inst2 = adapt(&raw).unwrap();
        let t2 = inst2.teacher_of(&CourseId::from("History")).unwrap();
        assert_eq!(t1, t2, "synthesized teacher id must be stable across runs");
    }

    #[test]
    fn duplicate_request_keeps_highest_priority() {
        let raw = RawInput {
            course_list: vec![row(&[("course_name", json!("Art"))])],
            student_requests: vec![
                row(&[
                    ("student_id", json!("S1")),
                    ("course_name", json!("Art")),
                    ("type", json!("recommended")),
                ]),
                row(&[
                    ("student_id", json!("S1")),
                    ("course_name", json!("Art")),
                    ("type", json!("required")),
                ]),
            ],
            rooms: vec![],
            lecturers: vec![],
        };
        let inst = adapt(&raw).unwrap();
        let reqs = inst.requests_for(&StudentId::from("S1")).unwrap();
        assert_eq!(reqs.required, vec![CourseId::from("Art")]);
        assert!(reqs.recommended.is_empty());
    }

    #[test]
    fn missing_course_list_is_structural_error() {
        let raw = RawInput {
            course_list: vec![],
            student_requests: vec![row(&[
                ("student_id", json!("S1")),
                ("course_name", json!("Art")),
            ])],
            rooms: vec![],
            lecturers: vec![],
        };
        assert!(matches!(adapt(&raw), Err(AdaptError::MissingCourseList)));
    }

    #[test]
    fn fully_empty_input_is_not_an_error() {
        let raw = RawInput::default();
        let inst = adapt(&raw).unwrap();
        assert!(inst.students.is_empty());
        assert!(inst.courses.is_empty());
    }
}
