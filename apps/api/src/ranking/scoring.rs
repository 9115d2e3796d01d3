//! Deterministic fit scoring. Pure and synchronous.
//!
//! Algorithm:
//! 1. Build a weighted vocabulary from the profile: skills (3.0), education
//!    degree/field and experience roles (2.0), summary, experience
//!    descriptions and publication titles (1.0). A token keeps its highest weight.
//! 2. Multi-word skills (and expanded abbreviations such as `ml`) become phrases.
//! 3. Overlap W = Σ weight(token) over distinct job tokens found in the vocabulary,
//!    plus the skill weight for every phrase found verbatim in the job text.
//! 4. score = round(100 × (1 − e^(−W / saturation))), which is 0 for no overlap,
//!    never exceeds 100 and never decreases as overlap grows.

use std::collections::HashMap;

use crate::models::job::{JobListing, MatchUpdate};
use crate::models::profile::CandidateProfile;
use crate::ranking::tokenize::{expand_abbreviation, normalized, token_set, tokenize};

#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub skill: f64,
    pub education: f64,
    pub role: f64,
    pub narrative: f64,
    /// Overlap weight at which the score reaches ~63.
    pub saturation: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill: 3.0,
            education: 2.0,
            role: 2.0,
            narrative: 1.0,
            saturation: 6.0,
        }
    }
}

/// Weighted view of a profile.
#[derive(Debug, Clone, Default)]
struct ProfileVocabulary {
    tokens: HashMap<String, f64>,
    phrases: Vec<(String, f64)>,
}

impl ProfileVocabulary {
    fn build(profile: &CandidateProfile, weights: &ScoringWeights) -> Self {
        let mut vocab = Self::default();

        for skill in &profile.skills {
            let skill_tokens = tokenize(skill);
            if skill_tokens.len() > 1 {
                vocab.add_phrase(skill_tokens.join(" "), weights.skill);
            }
            for token in &skill_tokens {
                if let Some(long) = expand_abbreviation(token) {
                    vocab.add_phrase(long.to_string(), weights.skill);
                }
            }
            vocab.add_text(skill, weights.skill);
        }

        for edu in &profile.education {
            vocab.add_text(&edu.degree, weights.education);
            if let Some(field) = &edu.field_of_study {
                vocab.add_text(field, weights.education);
            }
        }

        for exp in &profile.experience {
            vocab.add_text(&exp.role, weights.role);
            vocab.add_text(&exp.description, weights.narrative);
        }

        for publication in &profile.publications {
            vocab.add_text(&publication.title, weights.narrative);
        }

        vocab.add_text(profile.summary(), weights.narrative);
        vocab
    }

    fn add_text(&mut self, text: &str, weight: f64) {
        for token in tokenize(text) {
            let entry = self.tokens.entry(token).or_insert(0.0);
            if weight > *entry {
                *entry = weight;
            }
        }
    }

    fn add_phrase(&mut self, phrase: String, weight: f64) {
        if !self.phrases.iter().any(|(p, _)| *p == phrase) {
            self.phrases.push((phrase, weight));
        }
    }

    /// Total overlap weight between this vocabulary and a piece of job text.
    fn overlap(&self, job_text: &str) -> f64 {
        let token_weight: f64 = token_set(job_text)
            .iter()
            .filter_map(|t| self.tokens.get(t))
            .sum();

        let haystack = format!(" {} ", normalized(job_text));
        let phrase_weight: f64 = self
            .phrases
            .iter()
            .filter(|(phrase, _)| haystack.contains(&format!(" {phrase} ")))
            .map(|(_, weight)| weight)
            .sum();

        token_weight + phrase_weight
    }
}

/// Text of a listing that participates in scoring.
fn job_text(job: &JobListing) -> String {
    format!("{} {}", job.title, job.employer)
}

fn score_from_overlap(overlap: f64, saturation: f64) -> u32 {
    if overlap <= 0.0 || saturation <= 0.0 {
        return 0;
    }
    let score = 100.0 * (1.0 - (-overlap / saturation).exp());
    score.round().clamp(0.0, 100.0) as u32
}

/// Deterministic relevance score in [0, 100] with default weights.
pub fn score_of(profile: &CandidateProfile, job: &JobListing) -> u32 {
    let weights = ScoringWeights::default();
    let vocab = ProfileVocabulary::build(profile, &weights);
    score_with(&vocab, &weights, job)
}

fn score_with(vocab: &ProfileVocabulary, weights: &ScoringWeights, job: &JobListing) -> u32 {
    score_from_overlap(vocab.overlap(&job_text(job)), weights.saturation)
}

/// Orders by descending score; ties keep extraction order.
pub fn sort_ranked(jobs: &mut [JobListing]) {
    jobs.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| a.position.cmp(&b.position))
    });
}

/// Overwrites every placeholder score with the deterministic score and sorts.
pub fn rank_jobs(profile: &CandidateProfile, mut jobs: Vec<JobListing>) -> Vec<JobListing> {
    let weights = ScoringWeights::default();
    let vocab = ProfileVocabulary::build(profile, &weights);
    for job in &mut jobs {
        job.match_score = score_with(&vocab, &weights, job);
    }
    sort_ranked(&mut jobs);
    jobs
}

/// Applies one refinement patch and restores ordering.
///
/// Fallback or zero-score results are ignored so the job keeps its
/// deterministic score. Returns whether anything changed.
pub fn apply_update(jobs: &mut [JobListing], update: &MatchUpdate) -> bool {
    if update.fallback || update.result.score == 0 {
        return false;
    }
    let Some(job) = jobs.iter_mut().find(|j| j.id == update.job_id) else {
        return false;
    };
    job.match_score = update.result.score;
    job.match_reason = Some(update.result.reason.clone());
    job.missing_skills = update.result.missing_skills.clone();
    sort_ranked(jobs);
    true
}
