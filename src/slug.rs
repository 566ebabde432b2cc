use std::collections::HashSet;

/// Maximum slug length, in characters.
pub const SLUG_MAX_LEN: usize = 150;

/// Slugify with the default length limit.
pub fn slugify(text: &str) -> Option<String> {
    slugify_max(text, SLUG_MAX_LEN)
}

/// Lower-cases `text`, strips everything but word characters, whitespace and
/// hyphens, turns runs of whitespace/underscores/hyphens into a single hyphen,
/// and truncates to `max_len` characters. Returns `None` when nothing is left.
pub fn slugify_max(text: &str, max_len: usize) -> Option<String> {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_hyphen = true;
        } else if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
    }

    let truncated: String = slug.chars().take(max_len).collect();
    let truncated = truncated.trim_end_matches('-');

    if truncated.is_empty() {
        None
    } else {
        Some(truncated.to_owned())
    }
}

/// Slugs handed out during one import run.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    seen: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `slug`, or a suffixed variant of it when it's already taken.
    ///
    /// The first suffix is `stable_id` when the record has one, otherwise
    /// `fallback`. If that variant is taken too, a counter is appended until
    /// the result is unique within the run.
    pub fn claim(&mut self, slug: &str, stable_id: Option<i64>, fallback: usize) -> String {
        if self.seen.insert(slug.to_owned()) {
            return slug.to_owned();
        }

        let base = match stable_id {
            Some(id) => format!("{}-{}", slug, id),
            None => format!("{}-{}", slug, fallback),
        };

        let mut candidate = base.clone();
        let mut n = 1;
        while !self.seen.insert(candidate.clone()) {
            n += 1;
            candidate = format!("{}-{}", base, n);
        }
        candidate
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}
