use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Where a job application currently stands
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Interview,
    Declined,
}

impl JobStatus {
    pub const ALL: [JobStatus; 3] = [JobStatus::Pending, JobStatus::Interview, JobStatus::Declined];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Interview => "interview",
            JobStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown job status: {}", s))
    }
}

/// Employment type of the position
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum JobMode {
    FullTime,
    PartTime,
    Internship,
}

impl JobMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobMode::FullTime => "full-time",
            JobMode::PartTime => "part-time",
            JobMode::Internship => "internship",
        }
    }
}

/// Client-supplied fields of a job, used for both create and update
#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
pub struct JobInput {
    #[validate(length(min = 2, message = "Position must be at least 2 characters"))]
    pub position: String,
    #[validate(length(min = 2, message = "Company must be at least 2 characters"))]
    pub company: String,
    #[validate(length(min = 2, message = "Location must be at least 2 characters"))]
    pub location: String,
    pub status: JobStatus,
    pub mode: JobMode,
}
