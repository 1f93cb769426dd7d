mod assignment;
pub mod compose;
mod feedback;
mod ids;
mod question;
mod roster;

pub use assignment::{Assignment, short_title};
pub use compose::{DraftError, DraftSet, QuestionDraft};
pub use feedback::{GradingFeedback, GradingInfo};
pub use ids::{AssignmentId, CourseId, ParseIdError, QuestionId, StudentId, UserId};
pub use question::Question;
pub use roster::{AssignmentHeader, CourseGradeColumn, StudentTotal};
