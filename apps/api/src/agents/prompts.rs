// Agent prompt construction. One template per known agent, filled from the
// user profile; unknown agents receive the whole profile as JSON.

use crate::agents::kind::AgentKind;
use crate::models::profile::UserProfile;

const NOT_SPECIFIED: &str = "Not specified";

pub fn build_prompt(kind: &AgentKind, profile: &UserProfile) -> String {
    let field = |name: &str, default: &str| profile.text(name).unwrap_or_else(|| default.to_string());
    let target_role = || {
        profile
            .text("targetRole")
            .or_else(|| profile.text("role"))
            .unwrap_or_else(|| NOT_SPECIFIED.to_string())
    };

    match kind {
        AgentKind::CareerPlan => format!(
            "Generate a career plan for: Role: {}, Skills: {}, Experience: {}, Interests: {}",
            field("role", NOT_SPECIFIED),
            field("skills", NOT_SPECIFIED),
            field("experience", "Entry level"),
            field("interests", NOT_SPECIFIED),
        ),
        AgentKind::SkillGapRoadmap => format!(
            "Create a roadmap for transitioning to {}. Current skills: {}. Experience: {}",
            target_role(),
            field("skills", "None"),
            field("experience", "Entry level"),
        ),
        AgentKind::ResumeOptimization => format!(
            "Analyze this resume for {}: {}",
            target_role(),
            field("resumeText", ""),
        ),
        AgentKind::JobSearchApplication => format!(
            "Find jobs matching: Role: {}, Skills: {}, Location: {}",
            target_role(),
            field("skills", NOT_SPECIFIED),
            field("location", "Remote"),
        ),
        AgentKind::JobPrep => format!(
            "Create job prep plan for {}. Skills: {}. Career path: {}. Location: {}",
            target_role(),
            field("skills", NOT_SPECIFIED),
            field("careerPath", "job"),
            field("location", NOT_SPECIFIED),
        ),
        AgentKind::Other(_) => format!("Analyze profile: {}", profile.to_value()),
    }
}
