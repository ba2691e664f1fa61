//! Story references in commit messages

use regex::Regex;
use std::sync::LazyLock;

/// Trailer key linking a commit to a story
pub const STORY_ID_TRAILER: &str = "Story-Id";

static STORY_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Story-Id:[ \t]*(\S+)[ \t]*$").expect("story id pattern is valid")
});

/// Story ids referenced by `messages`, deduplicated in first-seen order
pub fn story_ids<S: AsRef<str>>(messages: &[S]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for message in messages {
        for caps in STORY_ID_RE.captures_iter(message.as_ref()) {
            let id = caps[1].trim_start_matches('#');
            if !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}
