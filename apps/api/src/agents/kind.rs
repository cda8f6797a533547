use std::fmt;

/// The agents this service knows how to prompt and whose output it projects
/// into dedicated collections. Any other name still runs and is audited.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgentKind {
    CareerPlan,
    SkillGapRoadmap,
    ResumeOptimization,
    JobSearchApplication,
    JobPrep,
    Other(String),
}

impl AgentKind {
    pub fn as_str(&self) -> &str {
        match self {
            AgentKind::CareerPlan => "careerPlanJsonAgent",
            AgentKind::SkillGapRoadmap => "skillGapRoadmapAgent",
            AgentKind::ResumeOptimization => "resumeOptimizationAgent",
            AgentKind::JobSearchApplication => "jobSearchApplicationAgent",
            AgentKind::JobPrep => "jobPrepAgent",
            AgentKind::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "careerPlanJsonAgent" => AgentKind::CareerPlan,
            "skillGapRoadmapAgent" => AgentKind::SkillGapRoadmap,
            "resumeOptimizationAgent" => AgentKind::ResumeOptimization,
            "jobSearchApplicationAgent" => AgentKind::JobSearchApplication,
            "jobPrepAgent" => AgentKind::JobPrep,
            other => AgentKind::Other(other.to_string()),
        }
    }

    /// Path on the agent service, relative to its base URL.
    pub fn endpoint_path(&self) -> String {
        match self {
            AgentKind::ResumeOptimization => "/api/resume/optimize".to_string(),
            other => format!("/api/agent/{}", other.as_str()),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
