use std::ops::Range;

/// One entry of a destructuring list such as `pics: images = []`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestructureBinding {
    /// Property read from the parameter (`pics`)
    pub field: String,

    /// Local name the property is bound to (`images`, or `pics` when not renamed)
    pub local: String,

    /// Position of the whole entry, relative to the list text
    pub range: Range<usize>,
}

/// The binding list between the braces of an anchor statement.
#[derive(Debug, Clone, Default)]
pub struct BindingList {
    entries: Vec<DestructureBinding>,
}

impl BindingList {
    pub fn parse(list: &str) -> Self {
        let mut entries = Vec::new();
        let mut depth = 0usize;
        let mut segment_start = 0;

        for (idx, ch) in list.char_indices() {
            match ch {
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    entries.extend(Self::parse_entry(list, segment_start..idx));
                    segment_start = idx + 1;
                }
                _ => {}
            }
        }
        entries.extend(Self::parse_entry(list, segment_start..list.len()));

        Self { entries }
    }

    fn parse_entry(list: &str, segment: Range<usize>) -> Option<DestructureBinding> {
        let raw = &list[segment.clone()];
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let leading = raw.len() - raw.trim_start().len();
        let start = segment.start + leading;
        let range = start..start + trimmed.len();

        // `field: local = default`
        let without_default = trimmed.split('=').next().unwrap_or(trimmed).trim();
        let (field, local) = match without_default.split_once(':') {
            Some((field, local)) => (field.trim(), local.trim()),
            None => (without_default, without_default),
        };

        Some(DestructureBinding {
            field: field.to_string(),
            local: local.to_string(),
            range,
        })
    }

    pub fn get(&self, field: &str) -> Option<&DestructureBinding> {
        self.entries.iter().find(|entry| entry.field == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.field.as_str())
    }
}

/// Insert `new_field` directly after `after` in the list text.
///
/// Returns `None` when `after` is not bound or `new_field` already is.
pub fn insert_after(list: &str, after: &str, new_field: &str) -> Option<String> {
    let bindings = BindingList::parse(list);
    if bindings.contains(new_field) {
        return None;
    }

    let anchor = bindings.get(after)?;
    let mut updated = String::with_capacity(list.len() + new_field.len() + 2);
    updated.push_str(&list[..anchor.range.end]);
    updated.push_str(", ");
    updated.push_str(new_field);
    updated.push_str(&list[anchor.range.end..]);
    Some(updated)
}
