use std::sync::Arc;

use classroom_core::model::{AssignmentId, DraftSet};
use storage::repository::DraftRepository;

use crate::api::{ClassroomApi, NewQuestions};
use crate::busy::BusyFlag;
use crate::error::ComposeError;
use crate::messages::MessageKey;
use crate::notify::{Notification, Notifier, report_failure};

/// Drafting and publishing the questions of an assignment.
#[derive(Clone)]
pub struct ComposeService {
    api: Arc<dyn ClassroomApi>,
    drafts: Arc<dyn DraftRepository>,
    notifier: Arc<dyn Notifier>,
    busy: BusyFlag,
}

impl ComposeService {
    #[must_use]
    pub fn new(
        api: Arc<dyn ClassroomApi>,
        drafts: Arc<dyn DraftRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            drafts,
            notifier,
            busy: BusyFlag::default(),
        }
    }

    /// Stored drafts of an assignment, or a single blank card when none exist.
    ///
    /// # Errors
    ///
    /// Returns `ComposeError::Storage` if the drafts cannot be read.
    pub async fn open(&self, assignment_id: AssignmentId) -> Result<DraftSet, ComposeError> {
        let cards = report_failure(
            self.notifier.as_ref(),
            MessageKey::DraftsUnavailable,
            self.drafts.load_drafts(assignment_id).await,
        )?;
        Ok(DraftSet::from_cards(cards))
    }

    /// # Errors
    ///
    /// Returns `ComposeError::Storage` if the drafts cannot be written.
    pub async fn save(
        &self,
        assignment_id: AssignmentId,
        drafts: &DraftSet,
    ) -> Result<(), ComposeError> {
        self.persist(assignment_id, drafts).await?;
        self.notifier
            .notify(Notification::info(MessageKey::DraftsSaved));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ComposeError::Storage` if the drafts cannot be removed.
    pub async fn discard(&self, assignment_id: AssignmentId) -> Result<(), ComposeError> {
        report_failure(
            self.notifier.as_ref(),
            MessageKey::DraftsUnavailable,
            self.drafts.clear_drafts(assignment_id).await,
        )?;
        self.notifier
            .notify(Notification::info(MessageKey::DraftsDiscarded));
        Ok(())
    }

    async fn persist(
        &self,
        assignment_id: AssignmentId,
        drafts: &DraftSet,
    ) -> Result<(), ComposeError> {
        report_failure(
            self.notifier.as_ref(),
            MessageKey::DraftsUnavailable,
            self.drafts.save_drafts(assignment_id, drafts.cards()).await,
        )?;
        tracing::debug!(%assignment_id, cards = drafts.len(), "drafts saved");
        Ok(())
    }

    /// Publish every card as a question, then drop the stored drafts.
    ///
    /// The cards are saved first, so a failed publish keeps them.
    ///
    /// # Errors
    ///
    /// - `ComposeError::Draft` if a card has no text or the set is empty.
    /// - `ComposeError::InFlight` while another publish runs.
    /// - `ComposeError::Api` / `ComposeError::Storage` for backend or store failures.
    pub async fn publish(
        &self,
        assignment_id: AssignmentId,
        drafts: &DraftSet,
    ) -> Result<usize, ComposeError> {
        drafts.validate()?;
        let Some(_guard) = self.busy.try_acquire() else {
            return Err(ComposeError::InFlight);
        };

        self.persist(assignment_id, drafts).await?;

        let request = NewQuestions::from_drafts(assignment_id, drafts.cards());
        if let Err(err) = self.api.create_questions(&request).await {
            tracing::warn!(%assignment_id, error = %err, "publishing questions failed");
            self.notifier
                .notify(Notification::error(MessageKey::ExamPublishFailed));
            return Err(err.into());
        }

        self.drafts.clear_drafts(assignment_id).await?;
        self.notifier
            .notify(Notification::success(MessageKey::ExamPublished));
        tracing::info!(%assignment_id, questions = request.questions.len(), "questions published");
        Ok(request.questions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, InMemoryApi};
    use crate::notify::{NotificationLevel, RecordingNotifier};
    use async_trait::async_trait;
    use classroom_core::model::{DraftError, QuestionDraft};
    use storage::repository::{InMemoryRepository, StorageError};

    struct LockedStore;

    #[async_trait]
    impl DraftRepository for LockedStore {
        async fn save_drafts(
            &self,
            _: AssignmentId,
            _: &[QuestionDraft],
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("database is locked".into()))
        }

        async fn load_drafts(&self, _: AssignmentId) -> Result<Vec<QuestionDraft>, StorageError> {
            Err(StorageError::Connection("database is locked".into()))
        }

        async fn clear_drafts(&self, _: AssignmentId) -> Result<(), StorageError> {
            Err(StorageError::Connection("database is locked".into()))
        }
    }

    fn setup() -> (InMemoryApi, InMemoryRepository, RecordingNotifier, ComposeService) {
        let api = InMemoryApi::new();
        let repo = InMemoryRepository::new();
        let notifier = RecordingNotifier::new();
        let service = ComposeService::new(
            Arc::new(api.clone()),
            Arc::new(repo.clone()),
            Arc::new(notifier.clone()),
        );
        (api, repo, notifier, service)
    }

    fn filled_set() -> DraftSet {
        let mut set = DraftSet::new();
        {
            let card = set.card_mut(1).unwrap();
            card.question_text = "Name a prime".into();
            card.teacher_answer = "7".into();
            card.max_points = 2;
        }
        let copy = set.duplicate(1).unwrap();
        set.card_mut(copy).unwrap().question_text = "Name another prime".into();
        set
    }

    #[tokio::test]
    async fn opening_without_drafts_gives_one_blank_card() {
        let (_, _, _, service) = setup();
        let set = service.open(AssignmentId::new(1)).await.unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.cards()[0].question_text.is_empty());
    }

    #[tokio::test]
    async fn saved_drafts_are_reopened() {
        let (_, _, notifier, service) = setup();
        let id = AssignmentId::new(2);
        service.save(id, &filled_set()).await.unwrap();
        assert_eq!(service.open(id).await.unwrap(), filled_set());
        assert_eq!(
            notifier.notifications(),
            vec![Notification::info(MessageKey::DraftsSaved)]
        );

        service.discard(id).await.unwrap();
        assert_eq!(service.open(id).await.unwrap().len(), 1);
        let last = notifier.last().unwrap();
        assert_eq!(last.level, NotificationLevel::Info);
        assert_eq!(last.message, MessageKey::DraftsDiscarded);
    }

    #[tokio::test]
    async fn unavailable_store_is_notified() {
        let notifier = RecordingNotifier::new();
        let service = ComposeService::new(
            Arc::new(InMemoryApi::new()),
            Arc::new(LockedStore),
            Arc::new(notifier.clone()),
        );
        let id = AssignmentId::new(8);

        assert!(matches!(service.open(id).await, Err(ComposeError::Storage(_))));
        assert!(matches!(
            service.save(id, &filled_set()).await,
            Err(ComposeError::Storage(_))
        ));
        assert!(matches!(service.discard(id).await, Err(ComposeError::Storage(_))));
        assert_eq!(
            notifier.notifications(),
            vec![Notification::error(MessageKey::DraftsUnavailable); 3]
        );
    }

    #[tokio::test]
    async fn publish_posts_questions_and_clears_drafts() {
        let (api, repo, notifier, service) = setup();
        let id = AssignmentId::new(3);

        let published = service.publish(id, &filled_set()).await.unwrap();

        assert_eq!(published, 2);
        assert!(matches!(api.calls().as_slice(), [ApiCall::CreateQuestions(req)] if req.questions.len() == 2));
        assert_eq!(api.questions(id).await.unwrap().len(), 2);
        assert!(repo.load_drafts(id).await.unwrap().is_empty());
        assert_eq!(
            notifier.last(),
            Some(Notification::success(MessageKey::ExamPublished))
        );
    }

    #[tokio::test]
    async fn failed_publish_keeps_drafts() {
        let (api, repo, notifier, service) = setup();
        api.fail_create_questions(true);
        let id = AssignmentId::new(4);

        let err = service.publish(id, &filled_set()).await.unwrap_err();

        assert!(matches!(err, ComposeError::Api(_)));
        assert_eq!(repo.load_drafts(id).await.unwrap().len(), 2);
        assert_eq!(
            notifier.last(),
            Some(Notification::error(MessageKey::ExamPublishFailed))
        );
    }

    #[tokio::test]
    async fn blank_card_blocks_publish_before_network() {
        let (api, _, _, service) = setup();
        let mut set = filled_set();
        set.add_blank();

        let err = service.publish(AssignmentId::new(5), &set).await.unwrap_err();

        assert!(matches!(err, ComposeError::Draft(DraftError::EmptyQuestion { position: 3 })));
        assert!(api.calls().is_empty());
    }
}
