use std::sync::LazyLock;

use heydav_core::Complexity;
use regex::Regex;

use super::entities::EntityExtractor;

/// Substring → weight. Conjunctions and simple mutations weigh 1,
/// destructive and processing verbs 2, integration work 3.
const KEYWORD_WEIGHTS: &[(&str, usize)] = &[
    ("and", 1),
    ("then", 1),
    ("after", 1),
    ("before", 1),
    ("also", 1),
    ("plus", 1),
    ("additionally", 1),
    ("create", 1),
    ("update", 1),
    ("modify", 1),
    ("all", 1),
    ("every", 1),
    ("delete", 2),
    ("analyze", 2),
    ("process", 2),
    ("generate", 2),
    ("transform", 2),
    ("schedule", 2),
    ("multiple", 2),
    ("batch", 2),
    ("optimize", 3),
    ("integrate", 3),
    ("synchronize", 3),
];

static CONDITIONAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?i)\b(?:if|when|unless|while|until)\b") {
        Ok(regex) => regex,
        Err(err) => panic!("Conditional regex is invalid: {err}"),
    });

/// Scores command text into a [`Complexity`] tier.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComplexityEstimator {
    entities: EntityExtractor,
}

impl ComplexityEstimator {
    /// Estimate the tier of `command`, extracting entities itself.
    pub fn estimate(&self, command: &str) -> Complexity {
        let entity_count = self.entities.entities(command).len();
        self.estimate_with_entities(command, entity_count)
    }

    /// Estimate the tier when the entity count is already known.
    pub fn estimate_with_entities(&self, command: &str, entity_count: usize) -> Complexity {
        Self::score_to_complexity(Self::score(command, entity_count))
    }

    /// Raw score before bucketing.
    pub fn score(command: &str, entity_count: usize) -> usize {
        Self::score_keywords(command)
            + Self::score_entities(entity_count)
            + Self::score_length(command)
            + Self::score_conditionals(command)
    }

    fn score_keywords(command: &str) -> usize {
        let lowered = command.to_lowercase();
        KEYWORD_WEIGHTS
            .iter()
            .filter(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, weight)| weight)
            .sum()
    }

    fn score_entities(entity_count: usize) -> usize {
        match entity_count {
            0 => 0,
            1..=3 => 1,
            _ => 2,
        }
    }

    fn score_length(command: &str) -> usize {
        let length = command.chars().count();
        if length > 100 {
            2
        } else if length > 50 {
            1
        } else {
            0
        }
    }

    fn score_conditionals(command: &str) -> usize {
        if CONDITIONAL_REGEX.is_match(command) {
            2
        } else {
            0
        }
    }

    fn score_to_complexity(score: usize) -> Complexity {
        match score {
            0..=2 => Complexity::Simple,
            3..=5 => Complexity::Moderate,
            6..=8 => Complexity::Complex,
            _ => Complexity::Advanced,
        }
    }
}
