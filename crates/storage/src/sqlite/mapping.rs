use classroom_core::model::{AssignmentId, QuestionDraft};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn assignment_id_to_i64(id: AssignmentId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("assignment_id overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range")))
}

pub(crate) fn map_draft_row(row: &SqliteRow) -> Result<QuestionDraft, StorageError> {
    Ok(QuestionDraft {
        position: u32_from_i64("position", row.try_get::<i64, _>("position").map_err(ser)?)?,
        question_text: row.try_get::<String, _>("question_text").map_err(ser)?,
        teacher_answer: row.try_get::<String, _>("teacher_answer").map_err(ser)?,
        max_points: u32_from_i64(
            "max_points",
            row.try_get::<i64, _>("max_points").map_err(ser)?,
        )?,
    })
}
