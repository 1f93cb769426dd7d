use std::fmt;

/// User-facing strings shown in notifications and views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MessageKey {
    GradesUpdatedAndValidated,
    GradesUpdateFailed,
    ExamValidated,
    ExamValidationFailed,
    GradesAlreadyValidated,
    ValidateGrades,
    NoTestsSubmitted,
    NoDueDate,
    FileExportSuccess,
    FileExportFailure,
    ExamPublished,
    ExamPublishFailed,
    ResponsesSent,
    ResponsesFailed,
    AnswerAllQuestions,
    DeadlinePassed,
    QuestionsNotAvailable,
    TestAverage,
    CourseTotal,
    GradingLoadFailed,
    GradeTableLoadFailed,
    AssignmentsLoadFailed,
    AssignmentNotFound,
    QuestionsLoadFailed,
    DraftsSaved,
    DraftsDiscarded,
    DraftsUnavailable,
}

impl MessageKey {
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::GradesUpdatedAndValidated => "Grades updated and validated successfully",
            Self::GradesUpdateFailed => "Grades update failed",
            Self::ExamValidated => "Exam successfully validated",
            Self::ExamValidationFailed => "Exam validation failed",
            Self::GradesAlreadyValidated => "Grades already validated",
            Self::ValidateGrades => "Validate grades",
            Self::NoTestsSubmitted => "No tests submitted",
            Self::NoDueDate => "No deadline",
            Self::FileExportSuccess => "File exported successfully",
            Self::FileExportFailure => "File export failed",
            Self::ExamPublished => "Exam published successfully",
            Self::ExamPublishFailed => "Error while publishing the exam",
            Self::ResponsesSent => "Responses sent successfully",
            Self::ResponsesFailed => "Error while sending responses",
            Self::AnswerAllQuestions => "Please answer all questions",
            Self::DeadlinePassed => "The deadline for this assignment has passed",
            Self::QuestionsNotAvailable => "Questions are not available yet",
            Self::TestAverage => "Test average",
            Self::CourseTotal => "Course total",
            Self::GradingLoadFailed => "Fetching grading feedback failed",
            Self::GradeTableLoadFailed => "Fetching all assignments failed",
            Self::AssignmentsLoadFailed => "Fetching student assignments failed",
            Self::AssignmentNotFound => "Assignment not found",
            Self::QuestionsLoadFailed => "Fetching questions failed",
            Self::DraftsSaved => "Draft saved",
            Self::DraftsDiscarded => "Draft discarded",
            Self::DraftsUnavailable => "Local drafts could not be accessed",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::countdown::NO_DEADLINE_DISPLAY;

    #[test]
    fn no_due_date_matches_countdown_text() {
        assert_eq!(MessageKey::NoDueDate.text(), NO_DEADLINE_DISPLAY);
    }
}
