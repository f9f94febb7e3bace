use std::fmt;

/// Ordered list of segments identifying a cached read, e.g.
/// `["projects", "p1", "tasks"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Segment-wise prefix match: `["projects", "p1", "tasks"]` starts with
    /// `["projects", "p1"]` but not with `["projects", "p"]`.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// This key extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> QueryKey {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        QueryKey(segments)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for QueryKey {
    fn from(segments: [S; N]) -> Self {
        QueryKey::new(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching_is_per_segment() {
        let tasks = QueryKey::from(["projects", "p1", "tasks"]);
        assert!(tasks.starts_with(&QueryKey::from(["projects"])));
        assert!(tasks.starts_with(&QueryKey::from(["projects", "p1"])));
        assert!(tasks.starts_with(&tasks));
        assert!(!tasks.starts_with(&QueryKey::from(["projects", "p"])));
        assert!(!tasks.starts_with(&QueryKey::from(["projects", "p2"])));
        assert!(!QueryKey::from(["projects"]).starts_with(&tasks));
    }

    #[test]
    fn macro_and_child_build_the_same_key() {
        let id = String::from("p1");
        assert_eq!(
            crate::query_key!["projects", id, "tasks"],
            QueryKey::from(["projects", "p1"]).child("tasks")
        );
        assert_eq!(
            crate::query_key!["projects", "p1"].to_string(),
            "[projects, p1]"
        );
    }
}
