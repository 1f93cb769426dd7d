use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use std::sync::Arc;

use classroom_core::grade_table::{GradeTable, format_grade};
use classroom_core::model::CourseId;

use crate::api::ClassroomApi;
use crate::error::{ExportError, GradeTableError};
use crate::messages::MessageKey;
use crate::notify::{Notification, Notifier, report_failure};

/// Text shown for a student who has no data in an assignment column.
#[must_use]
pub fn missing_cell_text() -> &'static str {
    MessageKey::NoTestsSubmitted.text()
}

/// Name of the worksheet holding the export.
pub const GRADES_SHEET: &str = "Grades";

/// Default export file name for a course: `{course}_grades.xlsx`.
#[must_use]
pub fn export_file_name(course_name: &str) -> String {
    format!("{course_name}_grades.xlsx")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// `.csv` paths export as CSV; anything else gets a workbook.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Xlsx,
        }
    }
}

/// One exported cell. Grades, totals and row numbers stay numeric.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Text(String),
    Number(f64),
    Empty,
}

impl ExportCell {
    fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(value) => format_grade(*value),
            Self::Empty => String::new(),
        }
    }
}

/// Export records: the course name, a header, then one record per student in
/// screen order. Missing cells carry the same placeholder as the screen.
///
/// # Errors
///
/// Returns `ExportError::Empty` for a table without columns.
pub fn export_records(
    table: &GradeTable,
    course_name: &str,
) -> Result<Vec<Vec<ExportCell>>, ExportError> {
    if table.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut header = vec![
        ExportCell::Text("№".into()),
        ExportCell::Text("Name".into()),
    ];
    header.extend(
        table
            .columns()
            .iter()
            .map(|c| ExportCell::Text(c.short_title().to_string())),
    );
    header.push(ExportCell::Text("Total".into()));

    let mut records = vec![vec![ExportCell::Text(course_name.to_string())], header];
    for (number, row) in (1u32..).zip(table.rows()) {
        let mut record = vec![
            ExportCell::Number(f64::from(number)),
            ExportCell::Text(row.full_name()),
        ];
        record.extend(row.assignments.iter().map(|slot| match slot {
            None => ExportCell::Text(missing_cell_text().to_string()),
            Some(slot) => slot
                .grade
                .filter(|g| g.is_finite())
                .map_or(ExportCell::Empty, ExportCell::Number),
        }));
        record.push(ExportCell::Number(row.total_grade));
        records.push(record);
    }
    Ok(records)
}

/// Writes the export records as CSV.
///
/// # Errors
///
/// Returns `ExportError::Empty` for a table without columns, and CSV or I/O
/// errors from the writer.
pub fn write_csv<W: Write>(
    table: &GradeTable,
    course_name: &str,
    writer: W,
) -> Result<(), ExportError> {
    let records = export_records(table, course_name)?;
    let mut csv = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);
    for record in &records {
        csv.write_record(record.iter().map(ExportCell::text))?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the export records to a workbook with a single `Grades` sheet.
///
/// # Errors
///
/// Returns `ExportError::Empty` for a table without columns and
/// `ExportError::Xlsx` if the workbook cannot be written.
pub fn write_xlsx<W: Write + Seek>(
    table: &GradeTable,
    course_name: &str,
    writer: W,
) -> Result<(), ExportError> {
    let records = export_records(table, course_name)?;
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| ExportError::Xlsx("default worksheet missing".into()))?;
    sheet.set_name(GRADES_SHEET);

    for (row, record) in (1u32..).zip(&records) {
        for (col, cell) in (1u32..).zip(record) {
            match cell {
                ExportCell::Text(text) => {
                    sheet.get_cell_mut((col, row)).set_value(text.as_str());
                }
                ExportCell::Number(value) => {
                    sheet.get_cell_mut((col, row)).set_value_number(*value);
                }
                ExportCell::Empty => {}
            }
        }
    }

    umya_spreadsheet::writer::xlsx::write_writer(&book, writer)
        .map_err(|e| ExportError::Xlsx(e.to_string()))
}

/// Loads and exports the course grade table.
#[derive(Clone)]
pub struct GradeTableService {
    api: Arc<dyn ClassroomApi>,
    notifier: Arc<dyn Notifier>,
}

impl GradeTableService {
    #[must_use]
    pub fn new(api: Arc<dyn ClassroomApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Fetch the course listing and pivot it into a student-by-assignment table.
    ///
    /// # Errors
    ///
    /// Returns `GradeTableError::Api` if the listing cannot be fetched; the
    /// failure is also notified.
    pub async fn load(&self, course_id: CourseId) -> Result<GradeTable, GradeTableError> {
        let listing = report_failure(
            self.notifier.as_ref(),
            MessageKey::GradeTableLoadFailed,
            self.api.course_grade_columns(course_id).await,
        )?;
        let table = GradeTable::build(&listing);
        tracing::debug!(
            %course_id,
            columns = table.columns().len(),
            students = table.rows().len(),
            "grade table built"
        );
        Ok(table)
    }

    /// Export `table` to `path` and notify the outcome. The format follows the
    /// file extension (see [`ExportFormat::from_path`]).
    ///
    /// # Errors
    ///
    /// Returns `GradeTableError::Export` if the file cannot be written.
    pub fn export_to_path(
        &self,
        table: &GradeTable,
        course_name: &str,
        path: &Path,
    ) -> Result<(), GradeTableError> {
        let format = ExportFormat::from_path(path);
        let result = File::create(path)
            .map_err(ExportError::from)
            .and_then(|file| match format {
                ExportFormat::Csv => write_csv(table, course_name, file),
                ExportFormat::Xlsx => write_xlsx(table, course_name, file),
            });
        match result {
            Ok(()) => {
                tracing::info!(path = %path.display(), ?format, "grade table exported");
                self.notifier
                    .notify(Notification::success(MessageKey::FileExportSuccess));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "grade table export failed");
                self.notifier
                    .notify(Notification::error(MessageKey::FileExportFailure));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryApi;
    use crate::notify::RecordingNotifier;
    use std::io::Cursor;
    use classroom_core::model::{
        AssignmentHeader, AssignmentId, CourseGradeColumn, StudentId, StudentTotal,
    };

    fn student(id: u64, name: &str, postname: &str, grade: Option<f64>) -> StudentTotal {
        StudentTotal {
            id: StudentId::new(id),
            name: name.into(),
            postname: postname.into(),
            email: String::new(),
            total_grade: grade,
        }
    }

    fn listing() -> Vec<CourseGradeColumn> {
        vec![
            CourseGradeColumn {
                assignment: AssignmentHeader {
                    id: AssignmentId::new(1),
                    title: "Quiz fractions".into(),
                    due_date: None,
                    points: Some(10),
                },
                students: vec![student(1, "Ada", "Lovelace", Some(8.0))],
            },
            CourseGradeColumn {
                assignment: AssignmentHeader {
                    id: AssignmentId::new(2),
                    title: "Exam final".into(),
                    due_date: None,
                    points: Some(20),
                },
                students: vec![
                    student(1, "Ada", "Lovelace", Some(15.5)),
                    student(2, "Alan", "Turing", Some(12.0)),
                ],
            },
        ]
    }

    #[tokio::test]
    async fn export_rows_follow_screen_order() {
        let api = InMemoryApi::new();
        api.put_course_columns(CourseId::new(1), listing());
        let service = GradeTableService::new(Arc::new(api), Arc::new(RecordingNotifier::new()));
        let table = service.load(CourseId::new(1)).await.unwrap();

        let mut out = Vec::new();
        write_csv(&table, "Math 101", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Math 101");
        assert_eq!(lines[1], "№,Name,Quiz,Exam,Total");
        assert_eq!(lines[2], "1,Ada Lovelace,8,15.5,23.5");
        assert_eq!(lines[3], "2,Alan Turing,No tests submitted,12,12");

        let screen = table.render(missing_cell_text());
        for (row, line) in screen.rows.iter().zip(&lines[2..]) {
            assert!(line.contains(&row.full_name));
            assert!(line.ends_with(&row.total));
        }
    }

    #[test]
    fn empty_table_is_not_exported() {
        let table = GradeTable::build(&[]);
        let err = write_csv(&table, "Empty", Vec::new()).unwrap_err();
        assert!(matches!(err, ExportError::Empty));
    }

    #[test]
    fn failed_export_notifies() {
        let notifier = RecordingNotifier::new();
        let service =
            GradeTableService::new(Arc::new(InMemoryApi::new()), Arc::new(notifier.clone()));
        let table = GradeTable::build(&listing());
        let missing_dir = Path::new("/nonexistent-classroom-dir/grades.csv");

        assert!(service.export_to_path(&table, "Math", missing_dir).is_err());
        assert_eq!(
            notifier.last(),
            Some(Notification::error(MessageKey::FileExportFailure))
        );
    }

    #[tokio::test]
    async fn unknown_course_is_an_api_error() {
        let notifier = RecordingNotifier::new();
        let service =
            GradeTableService::new(Arc::new(InMemoryApi::new()), Arc::new(notifier.clone()));
        let err = service.load(CourseId::new(99)).await.unwrap_err();
        assert!(matches!(err, GradeTableError::Api(_)));
        assert_eq!(
            notifier.last(),
            Some(Notification::error(MessageKey::GradeTableLoadFailed))
        );
    }

    fn sheet_text(sheet: &umya_spreadsheet::Worksheet, col: u32, row: u32) -> String {
        sheet
            .get_cell((col, row))
            .map(|cell| {
                cell.get_value_number()
                    .map_or_else(|| cell.get_value().to_string(), format_grade)
            })
            .unwrap_or_default()
    }

    #[test]
    fn workbook_cells_follow_screen_order() {
        let mut with_null = listing();
        with_null[0]
            .students
            .push(student(3, "Grace", "Hopper", None));
        let table = GradeTable::build(&with_null);

        let mut buf = Cursor::new(Vec::new());
        write_xlsx(&table, "Math 101", &mut buf).unwrap();
        buf.set_position(0);
        let book = umya_spreadsheet::reader::xlsx::read_reader(buf, true).unwrap();
        let sheet = book
            .get_sheet_collection()
            .iter()
            .find(|ws| ws.get_name() == GRADES_SHEET)
            .expect("grades sheet");

        assert_eq!(sheet_text(sheet, 1, 1), "Math 101");
        let header: Vec<String> = (1..=5).map(|col| sheet_text(sheet, col, 2)).collect();
        assert_eq!(header, ["№", "Name", "Quiz", "Exam", "Total"]);

        let screen = table.render(missing_cell_text());
        for (row, expected) in (3u32..).zip(&screen.rows) {
            assert_eq!(sheet_text(sheet, 1, row), (row - 2).to_string());
            assert_eq!(sheet_text(sheet, 2, row), expected.full_name);
            for (col, cell) in (3u32..).zip(&expected.cells) {
                assert_eq!(&sheet_text(sheet, col, row), cell);
            }
            assert_eq!(sheet_text(sheet, 5, row), expected.total);
        }
        assert_eq!(sheet_text(sheet, 3, 4), missing_cell_text());
        assert_eq!(sheet_text(sheet, 3, 5), "");
        assert_eq!(sheet.get_cell((3, 5)).and_then(|c| c.get_value_number()), None);
        assert_eq!(sheet.get_cell((4, 3)).and_then(|c| c.get_value_number()), Some(15.5));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out/grades.CSV")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("grades.xlsx")), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::from_path(Path::new("grades")), ExportFormat::Xlsx);
        assert_eq!(export_file_name("Math 101"), "Math 101_grades.xlsx");
    }
}
