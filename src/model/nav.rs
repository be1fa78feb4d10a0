//! Table of contents tree.

/// An entry in the book's table of contents.
///
/// Nav points are owned by exactly one parent (or by the book itself for
/// top-level entries), so the structure is always a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    /// Text shown in the table of contents. Written verbatim, so any markup
    /// characters must already be escaped.
    pub label: String,
    /// Book-relative URI, optionally with a fragment (`ch1.xhtml#sec2`).
    pub target: String,
    /// Sort key among siblings. Need not be contiguous or start at 1.
    pub order: i32,
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    pub fn new(label: impl Into<String>, target: impl Into<String>, order: i32) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
            order,
            children: Vec::new(),
        }
    }

    /// Add a child entry and return it, so further children can be nested.
    ///
    /// Many readers expect child targets to be fragments of the parent's
    /// file (`foo.xhtml#point3` under `foo.xhtml`). This is not enforced.
    pub fn add_navpoint(
        &mut self,
        label: impl Into<String>,
        target: impl Into<String>,
        order: i32,
    ) -> &mut NavPoint {
        self.children.push(NavPoint::new(label, target, order));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Target with any fragment removed.
    pub fn target_path(&self) -> &str {
        self.target.split('#').next().unwrap_or(&self.target)
    }
}

/// Siblings in table of contents order. Equal orders keep insertion order.
pub fn sorted(points: &[NavPoint]) -> Vec<&NavPoint> {
    let mut sorted: Vec<&NavPoint> = points.iter().collect();
    sorted.sort_by_key(|n| n.order);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_navpoint_chains() {
        let mut root = NavPoint::new("Chapter 1", "ch1.xhtml", 1);
        let section = root.add_navpoint("Section 1", "ch1.xhtml#s1", 1);
        section.add_navpoint("Part a", "ch1.xhtml#s1a", 1);
        root.add_navpoint("Section 2", "ch1.xhtml#s2", 2);

        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].children[0].label, "Part a");
    }

    #[test]
    fn test_sorted_is_stable_on_ties() {
        let points = vec![
            NavPoint::new("c", "c.xhtml", 3),
            NavPoint::new("a1", "a1.xhtml", 1),
            NavPoint::new("b", "b.xhtml", 2),
            NavPoint::new("a2", "a2.xhtml", 1),
        ];
        let labels: Vec<_> = sorted(&points).iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["a1", "a2", "b", "c"]);
    }

    #[test]
    fn test_target_path_strips_fragment() {
        assert_eq!(NavPoint::new("x", "a/b.xhtml#frag", 0).target_path(), "a/b.xhtml");
        assert_eq!(NavPoint::new("x", "a/b.xhtml", 0).target_path(), "a/b.xhtml");
    }
}
