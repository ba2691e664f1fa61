//! Release notes rendering

use crate::tracker::StoryState;
use crate::types::Story;
use std::collections::BTreeMap;
use std::fmt::{Display, Write};

/// Render release notes for `version`, grouping stories by state
pub fn render_release_notes(
    version: &impl Display,
    stories: &[Story],
    state_of: impl Fn(&Story) -> StoryState,
) -> String {
    let mut groups: BTreeMap<StoryState, Vec<&Story>> = BTreeMap::new();
    for story in stories {
        groups.entry(state_of(story)).or_default().push(story);
    }

    let mut notes = format!("Release {version}\n");
    if groups.is_empty() {
        notes.push_str("\nNo stories.\n");
        return notes;
    }
    for (state, stories) in groups {
        let _ = write!(notes, "\n{}:\n", heading(state));
        for story in stories {
            let _ = writeln!(notes, "  - #{} {}", story.id, story.title);
        }
    }
    notes
}

fn heading(state: StoryState) -> String {
    let name = state.to_string();
    let mut chars = name.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
