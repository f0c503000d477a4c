//! Utility functions for DOM processing

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, NodeType};

/// Element names the host accepts in `create_element`.
///
/// Mirrors the HTML parser's notion of a tag name: starts with an ASCII
/// letter and contains no whitespace, `/`, `>`, `<`, `=`, quotes or NUL.
pub fn is_valid_element_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| !c.is_whitespace() && !matches!(c, '/' | '>' | '<' | '=' | '"' | '\'' | '\0'))
}

/// Get all text content from node and its descendants (`textContent`)
pub fn get_text_content(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut text = String::new();

    arena.traverse_df(node_id, |node| {
        if node.node_type == NodeType::Text {
            text.push_str(&node.node_value);
        }
        Ok(())
    })?;

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DomNode;

    #[test]
    fn test_valid_element_names() {
        assert!(is_valid_element_name("div"));
        assert!(is_valid_element_name("my-widget"));
        assert!(is_valid_element_name("H1"));
    }

    #[test]
    fn test_invalid_element_names() {
        assert!(!is_valid_element_name(""));
        assert!(!is_valid_element_name("1div"));
        assert!(!is_valid_element_name("di v"));
        assert!(!is_valid_element_name("<div>"));
        assert!(!is_valid_element_name("a=b"));
    }

    #[test]
    fn test_text_content_is_not_trimmed() {
        let mut arena = DomArena::new();
        let p = arena.add_node(DomNode::element("p"));
        let a = arena.add_node(DomNode::text(" hello "));
        let b = arena.add_node(DomNode::element("b"));
        let c = arena.add_node(DomNode::text("world"));
        arena.append_child(p, a).unwrap();
        arena.append_child(p, b).unwrap();
        arena.append_child(b, c).unwrap();

        assert_eq!(get_text_content(&arena, p).unwrap(), " hello world");
    }
}
