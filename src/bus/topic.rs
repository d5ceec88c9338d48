//! Topic pattern matching with topic-exchange semantics.
//!
//! Topics are dot-separated words. In a pattern, `*` matches exactly one
//! word and `#` matches zero or more words.

/// Returns `true` if `topic` is matched by `pattern`.
pub fn matches(pattern: &str, topic: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let topic: Vec<&str> = topic.split('.').collect();
    match_segments(&pattern, &topic)
}

fn match_segments(pattern: &[&str], topic: &[&str]) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return topic.is_empty();
    };

    match *head {
        "#" => {
            match_segments(rest, topic)
                || (!topic.is_empty() && match_segments(pattern, &topic[1..]))
        }
        "*" => !topic.is_empty() && match_segments(rest, &topic[1..]),
        word => topic.first() == Some(&word) && match_segments(rest, &topic[1..]),
    }
}
