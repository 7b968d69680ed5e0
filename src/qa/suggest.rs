//! Rule-based follow-up question suggestions.

/// At most this many suggestions are returned.
pub const MAX_SUGGESTIONS: usize = 8;

const GENERIC: [&str; 3] = [
    "What is the main topic discussed?",
    "Can you summarize the key points?",
    "What are the most important takeaways?",
];

/// Trigger words and the question they unlock.
const TRIGGERED: [(&[&str], &str); 5] = [
    (&["how", "method", "process"], "How does this process work?"),
    (&["why", "reason", "because"], "Why is this important?"),
    (&["when", "time", "date"], "When did this happen?"),
    (&["who", "person", "people"], "Who are the key people mentioned?"),
    (&["where", "location", "place"], "Where does this take place?"),
];

/// Suggest questions for `text`: the generic ones first, then any whose trigger words
/// appear in the text. Duplicates are removed.
pub fn suggest_questions(text: &str) -> Vec<String> {
    let content = text.to_lowercase();
    let mut suggestions: Vec<String> = GENERIC.iter().map(|q| q.to_string()).collect();

    for (triggers, question) in TRIGGERED {
        if triggers.iter().any(|t| content.contains(t)) && !suggestions.iter().any(|s| s == question) {
            suggestions.push(question.to_string());
        }
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_only() {
        let suggestions = suggest_questions("Plain words about nothing in particular.");
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0], "What is the main topic discussed?");
    }

    #[test]
    fn test_triggered_questions() {
        let suggestions = suggest_questions(
            "The method was chosen because people in that location had little time.",
        );
        assert_eq!(suggestions.len(), 8);
        assert!(suggestions.iter().all(|s| s.ends_with('?')));
        assert!(suggestions.contains(&"Where does this take place?".to_string()));

        let mut unique = suggestions.clone();
        unique.dedup();
        assert_eq!(unique.len(), suggestions.len());
    }
}
