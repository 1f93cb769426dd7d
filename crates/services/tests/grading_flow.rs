use std::sync::Arc;

use classroom_core::grading::GradeState;
use classroom_core::model::{
    AssignmentHeader, AssignmentId, CourseGradeColumn, CourseId, GradingFeedback, GradingInfo,
    Question, QuestionId, StudentId, StudentTotal, UserId,
};
use classroom_core::time::fixed_clock;
use services::submission::SubmissionTarget;
use services::{
    AppServices, InMemoryApi, MessageKey, Notification, RecordingNotifier, Role, Session,
    SubmissionError,
};
use storage::repository::Storage;

const COURSE: CourseId = CourseId::new(1);
const STUDENT: StudentId = StudentId::new(7);
const ASSIGNMENT: AssignmentId = AssignmentId::new(3);

fn seeded_api() -> InMemoryApi {
    let api = InMemoryApi::new();
    api.put_questions(
        ASSIGNMENT,
        vec![
            Question::new(QuestionId::new(1), "Q1", 10),
            Question::new(QuestionId::new(2), "Q2", 10),
        ],
    );
    api.put_grading_info(
        STUDENT,
        ASSIGNMENT,
        GradingInfo {
            grading_feedback: vec![
                GradingFeedback::new(QuestionId::new(1), Some(6.0)),
                GradingFeedback::new(QuestionId::new(2), None),
            ],
            advice: None,
            state: Some(false),
        },
    );
    api.put_course_columns(
        COURSE,
        vec![CourseGradeColumn {
            assignment: AssignmentHeader {
                id: ASSIGNMENT,
                title: "Midterm algebra".into(),
                due_date: None,
                points: Some(20),
            },
            students: vec![StudentTotal {
                id: STUDENT,
                name: "Grace".into(),
                postname: "Hopper".into(),
                email: "grace@school.test".into(),
                total_grade: Some(6.0),
            }],
        }],
    );
    api
}

fn services(api: &InMemoryApi, notifier: &RecordingNotifier) -> AppServices {
    AppServices::with_parts(
        Session::new("token", Role::Teacher, UserId::new(1)),
        fixed_clock(),
        Arc::new(api.clone()),
        Storage::in_memory(),
        Arc::new(notifier.clone()),
    )
}

#[tokio::test]
async fn teacher_grades_validates_and_sees_locked_view() {
    let api = seeded_api();
    let notifier = RecordingNotifier::new();
    let services = services(&api, &notifier);
    let target = SubmissionTarget {
        course_id: COURSE,
        student_id: STUDENT,
        assignment_id: ASSIGNMENT,
    };

    let mut view = services.grading().load(STUDENT, ASSIGNMENT).await.unwrap();
    assert_eq!(view.total_points(), 20);
    assert_eq!(view.form().total(), 6.0);

    view.form_mut().set_grade(QuestionId::new(2), 9.0).unwrap();
    assert_eq!(view.form().total(), 15.0);

    let outcome = services
        .submission()
        .submit(target, view.form_mut())
        .await
        .unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(
        notifier.last(),
        Some(Notification::success(MessageKey::GradesUpdatedAndValidated))
    );

    let reloaded = services.grading().load(STUDENT, ASSIGNMENT).await.unwrap();
    assert_eq!(reloaded.state(), GradeState::Validated);
    assert_eq!(reloaded.stored_total(), 15.0);
    assert!(!reloaded.can_validate());

    let mut locked = reloaded.form().clone();
    let err = services
        .submission()
        .submit(target, &mut locked)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::AlreadyValidated));
}

#[tokio::test]
async fn course_grade_table_loads_through_services() {
    let api = seeded_api();
    let notifier = RecordingNotifier::new();
    let services = services(&api, &notifier);

    let table = services.grade_table().load(COURSE).await.unwrap();

    assert_eq!(table.columns().len(), 1);
    assert_eq!(table.columns()[0].short_title(), "Midterm");
    assert_eq!(table.columns()[0].class_average, Some(6.0));
    assert_eq!(table.rows()[0].full_name(), "Grace Hopper");
    assert_eq!(table.rows()[0].total_grade, 6.0);
}
