use std::fmt;
use std::str::FromStr;

use classroom_core::model::{StudentId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(format!("expected `teacher` or `student`, got `{other}`")),
        }
    }
}

/// Authenticated user context handed to the API client and services.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    role: Role,
    user_id: UserId,
}

impl Session {
    #[must_use]
    pub fn new(token: impl Into<String>, role: Role, user_id: UserId) -> Self {
        Self {
            token: token.into(),
            role,
            user_id,
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    /// The student id of a student session; `None` for teachers.
    #[must_use]
    pub fn student_id(&self) -> Option<StudentId> {
        match self.role {
            Role::Student => Some(StudentId::from(self.user_id)),
            Role::Teacher => None,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_token() {
        let session = Session::new("s3cr3t-token", Role::Teacher, UserId::new(4));
        let debug = format!("{session:?}");
        assert!(!debug.contains("s3cr3t-token"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("Teacher"));
    }

    #[test]
    fn parses_role_case_insensitively() {
        assert_eq!("Student".parse::<Role>(), Ok(Role::Student));
        assert_eq!(" teacher ".parse::<Role>(), Ok(Role::Teacher));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn only_students_have_a_student_id() {
        let student = Session::new("t", Role::Student, UserId::new(9));
        assert_eq!(student.student_id(), Some(StudentId::new(9)));
        let teacher = Session::new("t", Role::Teacher, UserId::new(9));
        assert_eq!(teacher.student_id(), None);
    }
}
