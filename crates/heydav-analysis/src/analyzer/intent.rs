use heydav_core::Intent;

/// Keyword → intent table; the first keyword found in the command wins,
/// in table order.
const INTENT_KEYWORDS: &[(&str, Intent)] = &[
    ("create", Intent::Create),
    ("add", Intent::Create),
    ("new", Intent::Create),
    ("make", Intent::Create),
    ("build", Intent::Create),
    ("generate", Intent::Generate),
    ("read", Intent::Read),
    ("get", Intent::Read),
    ("show", Intent::Read),
    ("view", Intent::Read),
    ("list", Intent::Read),
    ("display", Intent::Read),
    ("update", Intent::Update),
    ("edit", Intent::Update),
    ("modify", Intent::Update),
    ("change", Intent::Update),
    ("set", Intent::Update),
    ("delete", Intent::Delete),
    ("remove", Intent::Delete),
    ("drop", Intent::Delete),
    ("search", Intent::Search),
    ("find", Intent::Search),
    ("query", Intent::Search),
    ("analyze", Intent::Analyze),
    ("process", Intent::Process),
    ("transform", Intent::Transform),
    ("schedule", Intent::Schedule),
    ("plan", Intent::Schedule),
    ("notify", Intent::Notify),
    ("alert", Intent::Notify),
    ("remind", Intent::Notify),
    ("execute", Intent::Execute),
    ("run", Intent::Execute),
    ("perform", Intent::Execute),
    ("monitor", Intent::Monitor),
    ("track", Intent::Monitor),
    ("watch", Intent::Monitor),
    ("backup", Intent::Backup),
    ("save", Intent::Backup),
    ("sync", Intent::Sync),
    ("synchronize", Intent::Sync),
    ("validate", Intent::Validate),
    ("verify", Intent::Validate),
    ("check", Intent::Validate),
    ("aggregate", Intent::Aggregate),
    ("combine", Intent::Aggregate),
    ("merge", Intent::Aggregate),
    ("filter", Intent::Filter),
    ("sort", Intent::Sort),
    ("order", Intent::Sort),
    ("export", Intent::Export),
    ("import", Intent::Import),
];

/// Classifies the primary intent of a command.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntentClassifier;

impl IntentClassifier {
    /// Intent of the first table keyword contained in `command`, case-insensitive.
    pub fn classify(&self, command: &str) -> Intent {
        let lowered = command.to_lowercase();
        INTENT_KEYWORDS
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map_or(Intent::Unknown, |(_, intent)| *intent)
    }
}
