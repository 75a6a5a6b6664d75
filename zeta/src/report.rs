//! Report tree returned by each discovery source alongside its subdomain list.
//!
//! The tree is plain data. Styling happens in [`crate::render`].

use crate::record::SubdomainRecord;

/// Message attached when a source finds nothing.
pub const NOT_DETECTED: &str = "Subdomain not detected";

/// A child of the report root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportNode {
    /// One discovered subdomain with its metadata leaves
    Subdomain(SubdomainRecord),
    /// Informational leaf, e.g. [`NOT_DETECTED`]
    Notice(String),
    /// The scan failed; holds the error message
    Error(String),
}

impl ReportNode {
    /// Node label as shown at the first tree level.
    pub fn label(&self) -> &str {
        match self {
            ReportNode::Subdomain(record) => &record.name,
            ReportNode::Notice(message) | ReportNode::Error(message) => message,
        }
    }

    /// Leaf lines under this node, formatted `label: value`.
    pub fn leaves(&self) -> Vec<String> {
        match self {
            ReportNode::Subdomain(record) => record
                .metadata
                .iter()
                .map(|(label, value)| format!("{}: {}", label, value))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ReportNode::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTree {
    pub title: String,
    pub nodes: Vec<ReportNode>,
}

impl ReportTree {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            nodes: Vec::new(),
        }
    }

    /// Build a tree with one node per record, or a single
    /// [`NOT_DETECTED`] notice when `records` is empty.
    pub fn from_records(title: impl Into<String>, records: &[SubdomainRecord]) -> Self {
        let mut tree = Self::new(title);
        if records.is_empty() {
            tree.nodes.push(ReportNode::Notice(NOT_DETECTED.to_string()));
        } else {
            tree.nodes
                .extend(records.iter().cloned().map(ReportNode::Subdomain));
        }
        tree
    }

    /// Tree holding nothing but the error message.
    pub fn failed(title: impl Into<String>, message: impl Into<String>) -> Self {
        let mut tree = Self::new(title);
        tree.nodes.push(ReportNode::Error(message.into()));
        tree
    }

    pub fn is_failed(&self) -> bool {
        self.nodes.iter().any(ReportNode::is_error)
    }

    /// Number of subdomain nodes, ignoring notices and errors.
    pub fn subdomain_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, ReportNode::Subdomain(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_records_yield_single_notice() {
        let tree = ReportTree::from_records("crt.sh", &[]);
        assert_eq!(tree.nodes, vec![ReportNode::Notice(NOT_DETECTED.to_string())]);
        assert!(!tree.is_failed());
        assert_eq!(tree.subdomain_count(), 0);
    }

    #[test]
    fn test_failed_tree_has_single_error_leaf() {
        let tree = ReportTree::failed("crt.sh", "status code 500");
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.is_failed());
        assert_eq!(tree.nodes[0].label(), "status code 500");
        assert!(tree.nodes[0].leaves().is_empty());
    }

    #[test]
    fn test_subdomain_leaves_are_label_value_lines() {
        let record = SubdomainRecord::new("api.example.com")
            .with("IP Address", "203.0.113.7")
            .with("Cloudflared", "false");
        let tree = ReportTree::from_records("c99", &[record]);

        assert_eq!(tree.subdomain_count(), 1);
        assert_eq!(tree.nodes[0].label(), "api.example.com");
        assert_eq!(
            tree.nodes[0].leaves(),
            vec!["IP Address: 203.0.113.7", "Cloudflared: false"]
        );
    }
}
