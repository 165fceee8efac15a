use ozcore_xml::node::{Attrs, Node, NodeContent};
use std::fmt;

/// Compact, single-line rendering of a node for log output.
///
/// Attributes are sorted so that two renderings of the same element compare
/// equal. Use [`ozcore_xml::marshal`] for wire output.
pub struct DisplayableNode<'a>(pub &'a Node);

fn format_attributes(attrs: &Attrs) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let mut keys: Vec<_> = attrs.keys().collect();
    keys.sort_unstable();

    let mut result = String::new();
    for key in keys {
        if let Some(value) = attrs.get(key) {
            result.push_str(&format!(" {}=\"{}\"", key, value));
        }
    }
    result
}

fn format_content(content: &Option<NodeContent>) -> String {
    match content {
        Some(NodeContent::Nodes(nodes)) => nodes
            .iter()
            .map(|n| DisplayableNode(n).to_string())
            .collect(),
        Some(NodeContent::String(s)) => s.replace('\n', "\\n"),
        None => String::new(),
    }
}

impl<'a> fmt::Display for DisplayableNode<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0;
        let attrs = format_attributes(&node.attrs);
        let content = format_content(&node.content);

        if content.is_empty() {
            write!(f, "<{}{}/>", node.tag, attrs)
        } else {
            write!(f, "<{}{}>{}</{}>", node.tag, attrs, content, node.tag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ozcore_xml::builder::NodeBuilder;

    #[test]
    fn renders_sorted_attributes_on_one_line() {
        let node = NodeBuilder::new("end")
            .attr("b", "2")
            .attr("a", "1")
            .children([NodeBuilder::new("error").text("line1\nline2").build()])
            .build();

        assert_eq!(
            DisplayableNode(&node).to_string(),
            r#"<end a="1" b="2"><error>line1\nline2</error></end>"#
        );
    }
}
