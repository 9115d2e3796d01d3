use serde::{Deserialize, Serialize};

/// Constant identifier of the job board the extractor scrapes.
pub const SOURCE_JOBS_AC_UK: &str = "jobs.ac.uk";

/// Salary text used when a listing carries no salary line.
pub const DEFAULT_SALARY: &str = "Competitive";

/// A normalized job advert as produced by the extractor.
///
/// `id`, `title` and `link` are fixed once the record leaves the extractor.
/// Only the ranking fields (`match_score`, `match_reason`, `missing_skills`)
/// are ever patched afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub employer: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_salary")]
    pub salary: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub match_score: u32,
    /// Document-order index among emitted records. Tie breaker for ranking.
    #[serde(default)]
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_reason: Option<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
}

fn default_salary() -> String {
    DEFAULT_SALARY.to_string()
}

fn default_source() -> String {
    SOURCE_JOBS_AC_UK.to_string()
}

/// Outcome of a semantic judgment for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub score: u32,
    pub reason: String,
    pub missing_skills: Vec<String>,
}

impl MatchResult {
    pub const FAILURE_REASON: &'static str = "Failed to calculate match.";

    /// Result substituted when a provider call fails, times out or returns garbage.
    pub fn fallback() -> Self {
        Self {
            score: 0,
            reason: Self::FAILURE_REASON.to_string(),
            missing_skills: vec![],
        }
    }
}

/// One element of the refinement stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    pub job_id: String,
    pub result: MatchResult,
    /// True when `result` is the per-job failure fallback.
    pub fallback: bool,
}
