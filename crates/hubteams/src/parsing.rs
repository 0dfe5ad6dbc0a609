//! Text extraction over free-form agent replies

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const DEFAULT_SUBTASK: &str = "Complete part of the task";

fn numbered_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+\.\s*").expect("numbered line pattern"))
}

fn first_integer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?-u:\b)[0-9]+(?-u:\b)").expect("integer pattern"))
}

/// Text carried by an agent output.
///
/// Strings are used as-is, objects with a non-empty string `content` field
/// yield that field, anything else is rendered as compact JSON.
pub fn content_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("content") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Split a leader's plan into exactly `count` subtasks.
///
/// Numbered lines (`1. ...`) win when there are enough of them; otherwise the
/// first `count` non-empty lines; otherwise the available lines are cycled.
pub fn extract_subtasks(content: &str, count: usize) -> Vec<String> {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

    let numbered: Vec<String> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| numbered_line().is_match(l))
        .map(|l| numbered_line().replace(l, "").into_owned())
        .collect();

    if numbered.len() >= count {
        return numbered.into_iter().take(count).collect();
    }

    if lines.len() >= count {
        return lines.into_iter().take(count).map(str::to_string).collect();
    }

    (0..count)
        .map(|i| {
            if lines.is_empty() {
                DEFAULT_SUBTASK.to_string()
            } else {
                lines[i % lines.len()].to_string()
            }
        })
        .collect()
}

/// Read a ballot. The first integer in the reply is the vote when it names
/// one of the `proposals`; anything else counts as a vote for proposal 0.
pub fn extract_vote_index(vote: &Value, proposals: usize) -> usize {
    let text = match vote {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    first_integer()
        .find(&text)
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|&index| index < proposals)
        .unwrap_or(0)
}

/// Index with the most votes; on a tie the index that appears first in
/// `votes` wins. No votes elects 0.
pub fn most_voted(votes: &[usize]) -> usize {
    let mut tally: Vec<(usize, usize)> = Vec::new();
    for &vote in votes {
        match tally.iter_mut().find(|(index, _)| *index == vote) {
            Some((_, count)) => *count += 1,
            None => tally.push((vote, 1)),
        }
    }

    let mut winner: Option<(usize, usize)> = None;
    for (index, count) in tally {
        if winner.map_or(true, |(_, best)| count > best) {
            winner = Some((index, count));
        }
    }
    winner.map(|(index, _)| index).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_prefers_text_fields() {
        assert_eq!(content_of(&json!("plain")), "plain");
        assert_eq!(content_of(&json!({"content": "reply", "model": "x"})), "reply");
        assert_eq!(content_of(&json!({"content": 3})), r#"{"content":3}"#);
        assert_eq!(
            content_of(&json!({"content": "", "model": "x"})),
            r#"{"content":"","model":"x"}"#
        );
        assert_eq!(content_of(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn numbered_lines_become_subtasks() {
        let plan = "Here is the plan:\n1. Research the market\n  2. Draft the copy\n3.Review\n\nThanks";
        assert_eq!(
            extract_subtasks(plan, 3),
            vec!["Research the market", "Draft the copy", "Review"]
        );
        assert_eq!(extract_subtasks(plan, 2), vec!["Research the market", "Draft the copy"]);
    }

    #[test]
    fn raw_lines_are_used_when_numbering_is_short() {
        let plan = "Gather data\n1. Analyse\nWrite summary";
        assert_eq!(
            extract_subtasks(plan, 3),
            vec!["Gather data", "1. Analyse", "Write summary"]
        );
    }

    #[test]
    fn only_ascii_digits_number_a_line() {
        let plan = "\u{0661}. alpha\n2. beta\n3. gamma";
        assert_eq!(
            extract_subtasks(plan, 3),
            vec!["\u{0661}. alpha", "2. beta", "3. gamma"]
        );
    }

    #[test]
    fn short_plans_are_cycled() {
        assert_eq!(
            extract_subtasks("alpha\n\nbeta", 5),
            vec!["alpha", "beta", "alpha", "beta", "alpha"]
        );
        assert_eq!(
            extract_subtasks("   \n", 2),
            vec![DEFAULT_SUBTASK, DEFAULT_SUBTASK]
        );
        assert!(extract_subtasks("anything", 0).is_empty());
    }

    #[test]
    fn votes_take_the_first_integer_in_range() {
        assert_eq!(extract_vote_index(&json!("I pick proposal 2 of 3"), 3), 2);
        assert_eq!(extract_vote_index(&json!("Proposal 7 is best"), 3), 0);
        assert_eq!(extract_vote_index(&json!("no preference"), 3), 0);
        assert_eq!(extract_vote_index(&json!("v2 then 1"), 3), 1);
        assert_eq!(extract_vote_index(&json!({"content": "1"}), 2), 1);
        assert_eq!(extract_vote_index(&json!("99999999999999999999999"), 3), 0);
    }

    #[test]
    fn votes_only_count_ascii_digits() {
        assert_eq!(extract_vote_index(&json!("\u{0663} no, I vote 2"), 3), 2);
        assert_eq!(extract_vote_index(&json!("\u{e9}1"), 3), 1);
        assert_eq!(extract_vote_index(&json!("x1"), 3), 0);
    }

    #[test]
    fn ties_go_to_the_first_seen_index() {
        assert_eq!(most_voted(&[0, 1, 0]), 0);
        assert_eq!(most_voted(&[2, 1, 1, 2]), 2);
        assert_eq!(most_voted(&[1, 2, 2]), 2);
        assert_eq!(most_voted(&[]), 0);
    }
}
