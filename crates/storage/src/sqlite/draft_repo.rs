use chrono::Utc;
use classroom_core::model::{AssignmentId, QuestionDraft};

use super::SqliteDraftStore;
use super::mapping::{assignment_id_to_i64, map_draft_row};
use crate::repository::{DraftRepository, StorageError, check_positions};

#[async_trait::async_trait]
impl DraftRepository for SqliteDraftStore {
    async fn save_drafts(
        &self,
        assignment_id: AssignmentId,
        drafts: &[QuestionDraft],
    ) -> Result<(), StorageError> {
        check_positions(drafts)?;
        let assignment = assignment_id_to_i64(assignment_id)?;
        let updated_at = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM question_drafts WHERE assignment_id = ?1")
            .bind(assignment)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for draft in drafts {
            sqlx::query(
                r"
                INSERT INTO question_drafts
                    (assignment_id, position, question_text, teacher_answer, max_points, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(assignment)
            .bind(i64::from(draft.position))
            .bind(&draft.question_text)
            .bind(&draft.teacher_answer)
            .bind(i64::from(draft.max_points))
            .bind(updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn load_drafts(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Vec<QuestionDraft>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT position, question_text, teacher_answer, max_points
            FROM question_drafts
            WHERE assignment_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(assignment_id_to_i64(assignment_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_draft_row).collect()
    }

    async fn clear_drafts(&self, assignment_id: AssignmentId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM question_drafts WHERE assignment_id = ?1")
            .bind(assignment_id_to_i64(assignment_id)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
