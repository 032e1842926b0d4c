use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(StudentId);
id_newtype!(CourseId);
id_newtype!(TeacherId);

/// One of the seven fixed time blocks in the school day, in canonical order.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
pub enum Block {
    #[serde(rename = "1A")]
    B1A,
    #[serde(rename = "1B")]
    B1B,
    #[serde(rename = "2A")]
    B2A,
    #[serde(rename = "2B")]
    B2B,
    #[serde(rename = "3")]
    B3,
    #[serde(rename = "4A")]
    B4A,
    #[serde(rename = "4B")]
    B4B,
}

/// The canonical, ordered set of all blocks in the school day.
pub const ALL_BLOCKS: [Block; 7] = [
    Block::B1A,
    Block::B1B,
    Block::B2A,
    Block::B2B,
    Block::B3,
    Block::B4A,
    Block::B4B,
];

impl Block {
    pub fn label(&self) -> &'static str {
        match self {
            Block::B1A => "1A",
            Block::B1B => "1B",
            Block::B2A => "2A",
            Block::B2B => "2B",
            Block::B3 => "3",
            Block::B4A => "4A",
            Block::B4B => "4B",
        }
    }

    /// Parses a block label, accepting the bare label or a `_block`-suffixed
    /// variant, case-insensitively — the shapes the input adapter's column
    /// names are tried against.
    pub fn parse_label(raw: &str) -> Option<Block> {
        let norm = raw.trim().to_ascii_uppercase();
        let norm = norm.strip_suffix("_BLOCK").unwrap_or(&norm);
        ALL_BLOCKS.into_iter().find(|b| b.label() == norm)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Request priority, highest to lowest. Ordering of the enum variants matches
/// the order in which the greedy fallback runs its passes.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Required,
    Requested,
    Recommended,
}

pub const ALL_PRIORITIES: [Priority; 3] =
    [Priority::Required, Priority::Requested, Priority::Recommended];

impl Priority {
    /// Objective weight. Strictly decreasing and dominant: one fulfilled
    /// `Required` outranks any realistic count of fulfilled `Recommended`.
    pub fn weight(&self) -> f64 {
        match self {
            Priority::Required => 100.0,
            Priority::Requested => 10.0,
            Priority::Recommended => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Required => "required",
            Priority::Requested => "requested",
            Priority::Recommended => "recommended",
        }
    }
}

/// A student's requested courses, partitioned by priority and kept in the
/// order courses were requested. Each course appears under exactly one
/// priority (the highest one present in the raw input).
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct StudentRequests {
    #[serde(default)]
    pub required: Vec<CourseId>,
    #[serde(default)]
    pub requested: Vec<CourseId>,
    #[serde(default)]
    pub recommended: Vec<CourseId>,
}

impl StudentRequests {
    pub fn courses(&self, p: Priority) -> &[CourseId] {
        match p {
            Priority::Required => &self.required,
            Priority::Requested => &self.requested,
            Priority::Recommended => &self.recommended,
        }
    }

    pub fn courses_mut(&mut self, p: Priority) -> &mut Vec<CourseId> {
        match p {
            Priority::Required => &mut self.required,
            Priority::Requested => &mut self.requested,
            Priority::Recommended => &mut self.recommended,
        }
    }

    /// All requested courses for this student, in (required, requested,
    /// recommended) order, each with its priority.
    pub fn all(&self) -> impl Iterator<Item = (&CourseId, Priority)> {
        self.required
            .iter()
            .map(|c| (c, Priority::Required))
            .chain(self.requested.iter().map(|c| (c, Priority::Requested)))
            .chain(
                self.recommended
                    .iter()
                    .map(|c| (c, Priority::Recommended)),
            )
    }

    pub fn priority_of(&self, course: &CourseId) -> Option<Priority> {
        self.all().find(|(c, _)| *c == course).map(|(_, p)| p)
    }
}

/// The fully normalized, ready-to-solve scheduling instance produced by the
/// input adapter.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Instance {
    /// Students in input-arrival order; the canonical iteration order for
    /// every stage downstream (greedy fallback, report rows).
    pub students: Vec<StudentId>,
    /// Courses in input-arrival order.
    pub courses: Vec<CourseId>,
    pub requests: BTreeMap<StudentId, StudentRequests>,
    pub permitted: BTreeMap<CourseId, Vec<Block>>,
    pub capacity: BTreeMap<CourseId, u32>,
    pub teacher: BTreeMap<CourseId, TeacherId>,
}

pub const DEFAULT_CAPACITY: u32 = 30;

impl Instance {
    pub fn requests_for(&self, s: &StudentId) -> Option<&StudentRequests> {
        self.requests.get(s)
    }

    pub fn permitted_blocks(&self, c: &CourseId) -> &[Block] {
        self.permitted.get(c).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn capacity_of(&self, c: &CourseId) -> u32 {
        self.capacity.get(c).copied().unwrap_or(DEFAULT_CAPACITY)
    }

    pub fn teacher_of(&self, c: &CourseId) -> Option<&TeacherId> {
        self.teacher.get(c)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
pub enum SolverKind {
    Milp,
    Greedy,
}

fn default_solver_kind() -> SolverKind {
    SolverKind::Milp
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SolveParams {
    #[serde(default = "default_solver_kind")]
    pub solver: SolverKind,
    #[serde(default)]
    pub time_limit_secs: Option<u64>,
    #[serde(default)]
    pub seed: u64,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            solver: SolverKind::Milp,
            time_limit_secs: None,
            seed: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SolveEnvelope {
    pub instance: Instance,
    #[serde(default)]
    pub params: SolveParams,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
pub struct Assignment {
    pub student: StudentId,
    pub course: CourseId,
    pub block: Block,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Statistics {
    pub fulfilled_required: u32,
    pub unfulfilled_required: u32,
    pub fulfilled_requested: u32,
    pub unfulfilled_requested: u32,
    pub fulfilled_recommended: u32,
    pub unfulfilled_recommended: u32,
    pub total_requests: u32,
}

impl Statistics {
    pub fn fulfilled(&self, p: Priority) -> u32 {
        match p {
            Priority::Required => self.fulfilled_required,
            Priority::Requested => self.fulfilled_requested,
            Priority::Recommended => self.fulfilled_recommended,
        }
    }

    pub fn unfulfilled(&self, p: Priority) -> u32 {
        match p {
            Priority::Required => self.unfulfilled_required,
            Priority::Requested => self.unfulfilled_requested,
            Priority::Recommended => self.unfulfilled_recommended,
        }
    }

    pub fn fulfilled_mut(&mut self, p: Priority) -> &mut u32 {
        match p {
            Priority::Required => &mut self.fulfilled_required,
            Priority::Requested => &mut self.fulfilled_requested,
            Priority::Recommended => &mut self.fulfilled_recommended,
        }
    }

    pub fn unfulfilled_mut(&mut self, p: Priority) -> &mut u32 {
        match p {
            Priority::Required => &mut self.unfulfilled_required,
            Priority::Requested => &mut self.unfulfilled_requested,
            Priority::Recommended => &mut self.unfulfilled_recommended,
        }
    }

    pub fn recompute_total(&mut self) {
        self.total_requests = self.fulfilled_required
            + self.unfulfilled_required
            + self.fulfilled_requested
            + self.unfulfilled_requested
            + self.fulfilled_recommended
            + self.unfulfilled_recommended;
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SolveResult {
    pub status: String,
    pub objective: f64,
    pub assignments: Vec<Assignment>,
    pub stats: Statistics,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
pub struct TeacherScheduleEntry {
    pub course: CourseId,
    pub student_count: usize,
}

pub type StudentTimetable = BTreeMap<StudentId, BTreeMap<Block, CourseId>>;
pub type TeacherTimetable = BTreeMap<TeacherId, BTreeMap<Block, Vec<TeacherScheduleEntry>>>;
pub type SectionRoster = BTreeMap<CourseId, BTreeMap<Block, Vec<StudentId>>>;

/// The fully materialized output of a solve: everything the report renderer
/// and the JSON output endpoints need.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct ScheduleReport {
    pub student_schedules: StudentTimetable,
    pub teacher_schedules: TeacherTimetable,
    pub rosters: SectionRoster,
    pub stats: Statistics,
}

/// One row of loosely-typed input data: field names vary across source
/// spreadsheets, so rows are kept as maps and resolved through alias lists
/// by the input adapter rather than deserialized into a fixed struct.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The normalized input record: four named collections of rows, as produced
/// by upstream spreadsheet ingestion. This is the adapter's sole input.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct RawInput {
    #[serde(alias = "Course list", alias = "courses", default)]
    pub course_list: Vec<Row>,
    #[serde(alias = "Student requests", alias = "requests", default)]
    pub student_requests: Vec<Row>,
    #[serde(alias = "Rooms data", alias = "rooms", default)]
    pub rooms: Vec<Row>,
    #[serde(alias = "Lecturer Details", alias = "lecturers", default)]
    pub lecturers: Vec<Row>,
}
