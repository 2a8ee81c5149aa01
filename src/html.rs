use crate::ast::*;
use crate::error::ParseError;
use crate::parser::parse;

/// Parse, expand and serialize `source` in one step.
pub fn expand_and_serialize(source: &str, path: &str) -> Result<String, ParseError> {
    let nodes = parse(source, path)?;
    Ok(to_html(&nodes))
}

/// Serialize an expanded forest to HTML with no added whitespace.
pub fn to_html(nodes: &[Node]) -> String {
    let mut output = String::new();
    for node in nodes {
        write_node(node, &mut output);
    }
    output
}

fn write_node(node: &Node, output: &mut String) {
    let token = match node {
        Node::Text(text) => {
            output.push_str(text);
            return;
        }
        Node::Token(token) => token,
    };

    match &token.kind {
        Kind::Comment(text) => {
            output.push_str("<!--");
            output.push_str(text);
            output.push_str("-->");
        }
        Kind::Doctype => output.push_str("<!DOCTYPE html>"),
        Kind::Element(tag) => {
            output.push('<');
            output.push_str(tag);
            write_attributes(&token.attributes, output);
            if token.meta.void {
                output.push_str("/>");
                return;
            }
            output.push('>');
            for child in &token.children {
                write_node(child, output);
            }
            output.push_str("</");
            output.push_str(tag);
            output.push('>');
        }
        // Unexpanded nodes only exist in lint output.
        Kind::Placeholder(_) | Kind::Macro(_) | Kind::MacroDef(_) | Kind::Import { .. } => {}
    }
}

fn write_attributes(attributes: &Attributes, output: &mut String) {
    for (key, value) in attributes.iter() {
        output.push(' ');
        output.push_str(key);
        if let AttrValue::Text(text) = value {
            output.push_str("=\"");
            output.push_str(text);
            output.push('"');
        }
    }
}
