use similar::TextDiff;
use std::path::Path;

/// Unified diff of a file's content before and after migration
pub fn unified_diff(file_path: &Path, original: &str, updated: &str) -> String {
    let diff = TextDiff::from_lines(original, updated);
    format!(
        "{}",
        diff.unified_diff().context_radius(3).header(
            &format!("a/{}", file_path.display()),
            &format!("b/{}", file_path.display()),
        )
    )
}

/// Count inserted and deleted lines between two versions
pub fn change_stats(original: &str, updated: &str) -> (usize, usize) {
    let diff = TextDiff::from_lines(original, updated);
    let mut inserted = 0;
    let mut deleted = 0;

    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Insert => inserted += 1,
            similar::ChangeTag::Delete => deleted += 1,
            similar::ChangeTag::Equal => {}
        }
    }

    (inserted, deleted)
}
