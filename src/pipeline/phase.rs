use crate::agents::AgentName;

pub struct StageDefinition {
    pub agent: AgentName,
    pub display_name: &'static str,
    pub description: &'static str,
}

/// Pipeline order. Each stage only relies on what earlier stages left behind.
pub static STAGES: &[StageDefinition] = &[
    StageDefinition {
        agent: AgentName::Build,
        display_name: "Build",
        description: "Build the service image and push it to the registry",
    },
    StageDefinition {
        agent: AgentName::Test,
        display_name: "Test",
        description: "Health-check the running service",
    },
    StageDefinition {
        agent: AgentName::Deploy,
        display_name: "Deploy",
        description: "Provision the cluster and apply the deployment manifest",
    },
    StageDefinition {
        agent: AgentName::LogAnalysis,
        display_name: "Log Analysis",
        description: "Summarize service logs, falling back to synthetic logs",
    },
];

pub fn stage_definition(agent: AgentName) -> Option<&'static StageDefinition> {
    STAGES.iter().find(|s| s.agent == agent)
}
