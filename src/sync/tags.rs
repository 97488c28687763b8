//! Tag extraction from changed file paths.
//!
//! A directory segment is a tag when the segment right after it contains a
//! `.`, i.e. it is the parent of a document (or of a dotted directory).

/// Ordered mapping from tag to the files filed under it.
///
/// Tags keep first-encountered order, as do the files within a tag. Nothing
/// is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    entries: Vec<(String, Vec<String>)>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to `tag`, creating the tag if needed.
    pub fn push(&mut self, tag: &str, path: &str) {
        match self.entries.iter_mut().find(|(t, _)| t == tag) {
            Some((_, files)) => files.push(path.to_string()),
            None => self
                .entries
                .push((tag.to_string(), vec![path.to_string()])),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, files)| files.as_slice())
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of (tag, file) pairs.
    pub fn file_count(&self) -> usize {
        self.entries.iter().map(|(_, files)| files.len()).sum()
    }
}

impl IntoIterator for TagMap {
    type Item = (String, Vec<String>);
    type IntoIter = std::vec::IntoIter<(String, Vec<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Group file paths by the tags their directories encode.
pub fn extract_tags<I, S>(paths: I) -> TagMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags = TagMap::new();
    for path in paths {
        let path = path.as_ref();
        let segments: Vec<&str> = path.split('/').collect();
        for pair in segments.windows(2) {
            if pair[1].contains('.') {
                tags.push(pair[0], path);
            }
        }
    }
    tags
}
