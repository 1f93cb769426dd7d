use thiserror::Error;

use crate::grading::GradeError;
use crate::model::DraftError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Grade(#[from] GradeError),
    #[error(transparent)]
    Draft(#[from] DraftError),
}
