use serde::{Deserialize, Serialize};

/// Candidate CV as supplied by the CV subsystem. Read-only to the ranker.
///
/// Every field defaults so partially filled profiles from the client still parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    pub personal: PersonalDetails,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub publications: Vec<Publication>,
    pub awards: Vec<Award>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalDetails {
    pub full_name: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub degree: String,
    pub field_of_study: Option<String>,
    pub institution: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub role: String,
    pub company: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Publication {
    pub title: String,
    pub venue: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Award {
    pub title: String,
}

impl CandidateProfile {
    pub fn summary(&self) -> &str {
        self.personal.summary.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parses_client_shape() {
        let json = serde_json::json!({
            "personal": { "fullName": "Ada Lovelace", "summary": "Computing pioneer" },
            "skills": ["python", "ml"],
            "education": [{ "degree": "PhD", "fieldOfStudy": "Mathematics", "institution": "UCL" }],
            "experience": [{ "role": "Postdoc", "company": "Oxford", "description": "Bayesian methods" }],
            "publications": [{ "title": "Notes on the Analytical Engine" }],
            "projects": [],
            "references": []
        });

        let profile: CandidateProfile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.skills, vec!["python", "ml"]);
        assert_eq!(profile.education[0].field_of_study.as_deref(), Some("Mathematics"));
        assert_eq!(profile.experience[0].duration, "");
        assert_eq!(profile.summary(), "Computing pioneer");
    }

    #[test]
    fn test_empty_profile_parses() {
        let profile: CandidateProfile = serde_json::from_str("{}").unwrap();
        assert!(profile.skills.is_empty());
        assert_eq!(profile.summary(), "");
    }
}
