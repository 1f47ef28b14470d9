//! Entity and parameter extraction.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use heydav_core::Intent;
use regex::Regex;
use serde_json::Value;

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => panic!("Entity regex {pattern} is invalid: {err}"),
    }
}

static CAPITALIZED_REGEX: LazyLock<Regex> = LazyLock::new(|| compile(r"\b[A-Z][a-z]+\b"));
static QUOTED_REGEX: LazyLock<Regex> = LazyLock::new(|| compile(r#""([^"]*)""#));
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"));
static NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| compile(r"\b\d+(?:\.\d+)?\b"));
static DATE_REGEXES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile(r"\b\d{1,2}/\d{1,2}/\d{4}\b"),
        compile(r"\b\d{4}-\d{2}-\d{2}\b"),
        compile(r"(?i)\b(?:today|tomorrow|yesterday)\b"),
    ]
});

/// Pulls entities, parameters and capability hints out of command text.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityExtractor;

impl EntityExtractor {
    /// Distinct capitalized words, quoted strings and email addresses, in first-seen order.
    pub fn entities(&self, command: &str) -> Vec<String> {
        let capitalized = CAPITALIZED_REGEX
            .find_iter(command)
            .map(|found| found.as_str().to_owned());
        let quoted = QUOTED_REGEX
            .captures_iter(command)
            .filter_map(|captures| captures.get(1))
            .map(|found| found.as_str().to_owned());
        let emails = EMAIL_REGEX
            .find_iter(command)
            .map(|found| found.as_str().to_owned());

        let mut entities: Vec<String> = Vec::new();
        for entity in capitalized.chain(quoted).chain(emails) {
            if !entity.is_empty() && !entities.contains(&entity) {
                entities.push(entity);
            }
        }
        entities
    }

    /// Quoted strings, numbers and dates keyed `quoted_N`, `number_N`, `date_N`.
    pub fn parameters(&self, command: &str) -> HashMap<String, Value> {
        let mut parameters = HashMap::new();

        let quoted = QUOTED_REGEX
            .captures_iter(command)
            .filter_map(|captures| captures.get(1));
        for (index, found) in quoted.enumerate() {
            parameters.insert(
                format!("quoted_{index}"),
                Value::String(found.as_str().to_owned()),
            );
        }

        let numbers = NUMBER_REGEX
            .find_iter(command)
            .filter_map(|found| found.as_str().parse::<f64>().ok());
        for (index, number) in numbers.enumerate() {
            parameters.insert(format!("number_{index}"), Value::from(number));
        }

        let dates = DATE_REGEXES
            .iter()
            .flat_map(|regex| regex.find_iter(command));
        for (index, found) in dates.enumerate() {
            parameters.insert(
                format!("date_{index}"),
                Value::String(found.as_str().to_owned()),
            );
        }

        parameters
    }

    /// The intent name plus hints derived from entities.
    pub fn capabilities(&self, intent: Intent, entities: &[String]) -> Vec<String> {
        let mut capabilities = vec![intent.as_str().to_owned()];
        if entities.iter().any(|entity| entity.contains('@')) {
            capabilities.push("EmailHandling".to_owned());
        }
        if entities.iter().any(|entity| Self::is_date(entity)) {
            capabilities.push("DateHandling".to_owned());
        }
        capabilities
    }

    fn is_date(text: &str) -> bool {
        ["%Y-%m-%d", "%m/%d/%Y"]
            .iter()
            .any(|format| NaiveDate::parse_from_str(text.trim(), format).is_ok())
    }
}
