//! Prompt for the semantic job match.

use crate::models::job::JobListing;
use crate::models::profile::CandidateProfile;

pub const MATCH_PROMPT_TEMPLATE: &str = r#"You are a strict and honest Academic Recruiter. Your task is to critically evaluate the match between a candidate's CV and a Job Description.

JOB DETAILS:
Title: {job_title}
Employer: {job_employer}
Description: {job_json}

CANDIDATE CV:
Summary: {summary}
Skills: {skills}
Education: {education}
Experience: {experience}
Publications: {publications}
Awards: {awards}

INSTRUCTIONS:
1. Analyze the overlap in Research Interests, Technical Skills, and Education Level.
2. Be critical. If the job requires a PhD and the candidate has a BSc, penalize heavily.
3. If the research area (e.g., "Machine Learning") matches but the specific niche (e.g., "Reinforcement Learning") is missing, note it.

OUTPUT FORMAT (JSON ONLY):
{
    "score": <number 0-100>,
    "reason": "<One concise sentence limiting to 20 words explaining the score. Be direct.>",
    "missing_skills": ["<skill1>", "<skill2>"]
}"#;

/// Fills the match template for one (job, profile) pair.
pub fn build_match_prompt(job: &JobListing, profile: &CandidateProfile) -> String {
    let job_json = serde_json::to_string(job).unwrap_or_else(|_| job.title.clone());

    let education = profile
        .education
        .iter()
        .map(|e| {
            format!(
                "{} in {} at {} ({})",
                e.degree,
                e.field_of_study.as_deref().unwrap_or(""),
                e.institution,
                e.end_date.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    let experience = profile
        .experience
        .iter()
        .map(|e| {
            format!(
                "Role: {} at {} ({}). Details: {}",
                e.role, e.company, e.duration, e.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let publications = profile
        .publications
        .iter()
        .map(|p| {
            format!(
                "{} ({}, {})",
                p.title,
                p.venue.as_deref().unwrap_or(""),
                p.date.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    let awards = profile
        .awards
        .iter()
        .map(|a| a.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    MATCH_PROMPT_TEMPLATE
        .replace("{job_title}", &job.title)
        .replace("{job_employer}", &job.employer)
        .replace("{job_json}", &job_json)
        .replace("{summary}", profile.summary())
        .replace("{skills}", &profile.skills.join(", "))
        .replace("{education}", &education)
        .replace("{experience}", &experience)
        .replace("{publications}", &publications)
        .replace("{awards}", &awards)
}
