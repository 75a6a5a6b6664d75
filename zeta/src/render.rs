//! Terminal rendering of report trees.

use colored::Colorize;

use crate::report::{ReportNode, ReportTree};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Render `tree` as box-drawing lines. Subdomains are green, notices and
/// errors yellow. Metadata labels are padded so the values line up.
///
/// Whether color is emitted is controlled globally through
/// `colored::control`.
pub fn render_tree(tree: &ReportTree) -> String {
    let mut out = String::new();
    out.push_str(&tree.title.bold().to_string());
    out.push('\n');

    for (i, node) in tree.nodes.iter().enumerate() {
        let last = i + 1 == tree.nodes.len();
        out.push_str(if last { LAST_BRANCH } else { BRANCH });
        out.push_str(&styled_label(node));
        out.push('\n');

        let ReportNode::Subdomain(record) = node else {
            continue;
        };

        let width = record
            .metadata
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);

        for (j, (label, value)) in record.metadata.iter().enumerate() {
            let leaf_last = j + 1 == record.metadata.len();
            out.push_str(if last { SPACE } else { PIPE });
            out.push_str(if leaf_last { LAST_BRANCH } else { BRANCH });
            out.push_str(&format!("{:<width$} : {}", label, value, width = width));
            out.push('\n');
        }
    }

    out
}

fn styled_label(node: &ReportNode) -> String {
    match node {
        ReportNode::Subdomain(record) => record.name.green().to_string(),
        ReportNode::Notice(message) | ReportNode::Error(message) => message.yellow().to_string(),
    }
}
