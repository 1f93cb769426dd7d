//! Student-by-assignment grade matrix built from the course grade listing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{AssignmentId, CourseGradeColumn, StudentId, StudentTotal, short_title};

/// A student's grade in one assignment column.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeSlot {
    pub assignment_id: AssignmentId,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub points: Option<u32>,
    pub grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub student_id: StudentId,
    pub name: String,
    pub postname: String,
    pub email: String,
    /// One entry per column; `None` when the student has no data there.
    pub assignments: Vec<Option<GradeSlot>>,
    pub total_grade: f64,
}

impl StudentRow {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.postname).trim().to_string()
    }

    /// Two-letter avatar text; empty unless both names are known.
    #[must_use]
    pub fn initials(&self) -> String {
        match (self.name.chars().next(), self.postname.chars().next()) {
            (Some(first), Some(last)) => first.to_uppercase().chain(last.to_uppercase()).collect(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnHeader {
    pub assignment_id: AssignmentId,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub points: Option<u32>,
    pub class_average: Option<f64>,
}

impl ColumnHeader {
    #[must_use]
    pub fn short_title(&self) -> &str {
        short_title(&self.title)
    }
}

/// Mean of the non-null grades; `None` when nobody has a grade yet.
#[must_use]
pub fn class_average(students: &[StudentTotal]) -> Option<f64> {
    let graded: Vec<f64> = students
        .iter()
        .filter_map(|s| s.total_grade.filter(|g| g.is_finite()))
        .collect();
    if graded.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = graded.len() as f64;
    Some(graded.iter().sum::<f64>() / count)
}

/// Renders a grade without a trailing `.0`; fractional grades keep up to two decimals.
#[must_use]
pub fn format_grade(grade: f64) -> String {
    if grade.fract() == 0.0 {
        return format!("{grade:.0}");
    }
    let text = format!("{grade:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradeTable {
    columns: Vec<ColumnHeader>,
    rows: Vec<StudentRow>,
}

impl GradeTable {
    /// Pivots per-assignment rosters into one row per student.
    ///
    /// Column order follows the input. Rows are ordered by student id.
    #[must_use]
    pub fn build(listing: &[CourseGradeColumn]) -> Self {
        let width = listing.len();
        let mut students: BTreeMap<StudentId, StudentRow> = BTreeMap::new();

        for (index, column) in listing.iter().enumerate() {
            let assignment = &column.assignment;
            for student in &column.students {
                let row = students.entry(student.id).or_insert_with(|| StudentRow {
                    student_id: student.id,
                    name: student.name.clone(),
                    postname: student.postname.clone(),
                    email: student.email.clone(),
                    assignments: vec![None; width],
                    total_grade: 0.0,
                });

                row.assignments[index] = Some(GradeSlot {
                    assignment_id: assignment.id,
                    title: short_title(&assignment.title).to_string(),
                    due_date: assignment.due_date,
                    points: assignment.points,
                    grade: student.total_grade,
                });
                row.total_grade += student.total_grade.filter(|g| g.is_finite()).unwrap_or(0.0);
            }
        }

        let columns = listing
            .iter()
            .map(|column| ColumnHeader {
                assignment_id: column.assignment.id,
                title: column.assignment.title.clone(),
                due_date: column.assignment.due_date,
                points: column.assignment.points,
                class_average: class_average(&column.students),
            })
            .collect();

        Self {
            columns,
            rows: students.into_values().collect(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnHeader] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[StudentRow] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, assignment_id: AssignmentId) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.assignment_id == assignment_id)
    }

    /// Text rendering shared by the screen table and the export.
    #[must_use]
    pub fn render(&self, placeholder: &str) -> RenderedTable {
        let headers = self
            .columns
            .iter()
            .map(|c| c.short_title().to_string())
            .collect();
        let averages = self
            .columns
            .iter()
            .map(|c| c.class_average.map(|avg| format!("{avg:.2}")).unwrap_or_default())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| RenderedRow {
                student_id: row.student_id,
                full_name: row.full_name(),
                initials: row.initials(),
                email: row.email.clone(),
                cells: row
                    .assignments
                    .iter()
                    .map(|slot| cell_text(slot.as_ref(), placeholder))
                    .collect(),
                total: format_grade(row.total_grade),
            })
            .collect();
        RenderedTable {
            headers,
            averages,
            rows,
        }
    }
}

/// Text of one matrix cell. A slot whose grade is still null shows as empty.
#[must_use]
pub fn cell_text(slot: Option<&GradeSlot>, placeholder: &str) -> String {
    match slot {
        None => placeholder.to_string(),
        Some(slot) => slot.grade.map(format_grade).unwrap_or_default(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub student_id: StudentId,
    pub full_name: String,
    pub initials: String,
    pub email: String,
    pub cells: Vec<String>,
    pub total: String,
}

/// Display-ready strings of a [`GradeTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    /// Short assignment titles, in column order.
    pub headers: Vec<String>,
    /// Class average per column, empty when no grade exists.
    pub averages: Vec<String>,
    pub rows: Vec<RenderedRow>,
}
