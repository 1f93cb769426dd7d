use classroom_core::model::{AssignmentId, DraftSet, QuestionDraft};
use storage::repository::{DraftRepository, Storage, StorageError};
use storage::sqlite::SqliteDraftStore;

fn draft(position: u32, text: &str, max_points: u32) -> QuestionDraft {
    QuestionDraft {
        position,
        question_text: text.to_string(),
        teacher_answer: format!("model answer for {text}"),
        max_points,
    }
}

#[tokio::test]
async fn sqlite_round_trips_drafts_in_position_order() {
    let repo = SqliteDraftStore::open("sqlite:file:memdb_drafts_roundtrip?mode=memory&cache=shared")
        .await
        .expect("open");

    let id = AssignmentId::new(11);
    repo.save_drafts(id, &[draft(3, "Why?", 4), draft(1, "What?", 2)])
        .await
        .unwrap();

    let loaded = repo.load_drafts(id).await.unwrap();
    assert_eq!(loaded, vec![draft(1, "What?", 2), draft(3, "Why?", 4)]);

    let set = DraftSet::from_cards(loaded);
    assert_eq!(set.len(), 2);
}

#[tokio::test]
async fn sqlite_save_replaces_and_clear_empties() {
    let repo = SqliteDraftStore::open("sqlite:file:memdb_drafts_replace?mode=memory&cache=shared")
        .await
        .expect("open");

    let id = AssignmentId::new(5);
    let other = AssignmentId::new(6);
    repo.save_drafts(id, &[draft(1, "a", 1), draft(2, "b", 1)])
        .await
        .unwrap();
    repo.save_drafts(other, &[draft(1, "kept", 3)]).await.unwrap();
    repo.save_drafts(id, &[draft(1, "c", 2)]).await.unwrap();
    assert_eq!(repo.load_drafts(id).await.unwrap(), vec![draft(1, "c", 2)]);

    repo.clear_drafts(id).await.unwrap();
    assert!(repo.load_drafts(id).await.unwrap().is_empty());
    assert_eq!(repo.load_drafts(other).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_rejects_duplicate_positions_without_touching_store() {
    let repo = SqliteDraftStore::open("sqlite:file:memdb_drafts_conflict?mode=memory&cache=shared")
        .await
        .expect("open");

    let id = AssignmentId::new(1);
    repo.save_drafts(id, &[draft(1, "original", 1)]).await.unwrap();
    let err = repo
        .save_drafts(id, &[draft(2, "x", 1), draft(2, "y", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
    assert_eq!(repo.load_drafts(id).await.unwrap()[0].question_text, "original");
}

#[tokio::test]
async fn reopening_keeps_schema_and_drafts() {
    let url = "sqlite:file:memdb_drafts_migrate?mode=memory&cache=shared";
    let first = SqliteDraftStore::open(url).await.expect("first open");
    first
        .save_drafts(AssignmentId::new(9), &[draft(1, "kept", 2)])
        .await
        .unwrap();

    let second = SqliteDraftStore::open(url).await.expect("second open");
    assert_eq!(second.load_drafts(AssignmentId::new(9)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn storage_sqlite_wires_draft_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_drafts_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let id = AssignmentId::new(2);
    storage.drafts.save_drafts(id, &[draft(1, "q", 1)]).await.unwrap();
    assert_eq!(storage.drafts.load_drafts(id).await.unwrap().len(), 1);
}
