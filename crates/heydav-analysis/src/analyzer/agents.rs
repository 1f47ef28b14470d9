/// Agent name → keywords that call for it.
const AGENT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "TodoAgent",
        &["todo", "task", "reminder", "schedule", "deadline", "priority"],
    ),
    (
        "GoalAgent",
        &["goal", "objective", "milestone", "target", "achievement", "progress"],
    ),
    (
        "NewsAgent",
        &["news", "article", "feed", "update", "information", "current"],
    ),
    (
        "EmailAgent",
        &["email", "message", "send", "inbox", "notification"],
    ),
    (
        "AnalyticsAgent",
        &["analyze", "report", "metrics", "statistics", "data", "trend"],
    ),
    (
        "ScheduleAgent",
        &["calendar", "appointment", "meeting", "schedule", "time", "date"],
    ),
    (
        "FileAgent",
        &["file", "document", "folder", "directory", "save", "load", "export", "import"],
    ),
    (
        "SystemAgent",
        &["system", "status", "health", "performance", "resource", "monitor"],
    ),
];

/// Maps command text to the agents able to handle it.
#[derive(Debug, Default, Clone, Copy)]
pub struct AgentCatalog;

impl AgentCatalog {
    /// Agents with at least one keyword contained in `text`, in catalog order.
    pub fn required_agents(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        AGENT_KEYWORDS
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|(agent, _)| (*agent).to_owned())
            .collect()
    }

    /// Every agent name the catalog knows.
    pub fn agent_names(&self) -> impl Iterator<Item = &'static str> {
        AGENT_KEYWORDS.iter().map(|(agent, _)| *agent)
    }
}
