use crate::error::{Result, XmlError};
use crate::node::{Attrs, Node, NodeContent};
use log::trace;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Serializes a node tree into an XML string.
///
/// Attributes are written in insertion order, text and attribute values are
/// escaped, and elements without content are self-closed.
pub fn marshal(node: &Node) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_node(&mut writer, node)?;
    String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    if !is_valid_name(&node.tag) {
        return Err(XmlError::InvalidName(node.tag.clone()));
    }

    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in node.attrs.iter() {
        if !is_valid_name(key) {
            return Err(XmlError::InvalidName(key.to_string()));
        }
        start.push_attribute((key, value));
    }

    match &node.content {
        None => write_event(writer, Event::Empty(start)),
        Some(NodeContent::Nodes(nodes)) if nodes.is_empty() => {
            write_event(writer, Event::Empty(start))
        }
        Some(NodeContent::String(text)) => {
            write_event(writer, Event::Start(start))?;
            write_event(writer, Event::Text(BytesText::new(text)))?;
            write_event(writer, Event::End(BytesEnd::new(node.tag.as_str())))
        }
        Some(NodeContent::Nodes(nodes)) => {
            write_event(writer, Event::Start(start))?;
            for child in nodes {
                write_node(writer, child)?;
            }
            write_event(writer, Event::End(BytesEnd::new(node.tag.as_str())))
        }
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(e.to_string()))
}

/// Parses the first top-level element of an XML document.
///
/// Anything after the first top-level element closes is not read; documents
/// carrying several top-level elements are not supported. Whitespace-only
/// text is dropped, and text interleaved with child elements is discarded in
/// favour of the children.
pub fn unmarshal(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Node> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(start_node(&e)?),
            Event::Empty(e) => {
                let node = start_node(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.push_child(node),
                    None => return Ok(node),
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| XmlError::Syntax("unmatched closing tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.push_child(node),
                    None => return Ok(node),
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                append_text(stack.last_mut(), &text)?;
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = String::from_utf8_lossy(&raw);
                append_text(stack.last_mut(), &text)?;
            }
            Event::Eof => {
                return Err(match stack.first() {
                    Some(root) => XmlError::UnexpectedEof(root.tag.clone()),
                    None => XmlError::EmptyDocument,
                });
            }
            // Declarations, comments, processing instructions and doctypes.
            _ => {}
        }
    }
}

fn start_node(e: &BytesStart<'_>) -> Result<Node> {
    let tag = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| XmlError::Syntax(err.to_string()))?
        .to_string();

    let mut attrs = Attrs::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| XmlError::Syntax(err.to_string()))?
            .to_string();
        let value = attr.unescape_value()?.into_owned();
        attrs.push(key, value);
    }

    Ok(Node {
        tag,
        attrs,
        content: None,
    })
}

fn append_text(current: Option<&mut Node>, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let node = current.ok_or(XmlError::TextOutsideRoot)?;
    match &mut node.content {
        None => node.content = Some(NodeContent::String(text.to_string())),
        Some(NodeContent::String(existing)) => existing.push_str(text),
        Some(NodeContent::Nodes(_)) => {
            trace!("Dropping mixed text content inside <{}>", node.tag);
        }
    }
    Ok(())
}

/// Checks that a string is usable as an element or attribute name.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}
