//! Generic tagged tree over an XML payload.
//!
//! Real-world DTE files vary in namespace prefixing and envelope nesting,
//! so the normalizer works on a schema-less tree instead of fixed structs.
//! Element and attribute names are reduced to their local names, and
//! attributes are merged with child elements, so a field reads the same
//! whether the source expressed it as `<Folio>1</Folio>` or `Folio="1"`.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Key used for character data of an element that also has children
/// or attributes.
const TEXT_KEY: &str = "#text";

/// A parsed XML node: mapping, sequence, or scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    /// Child elements and attributes, in document order. Repeated keys
    /// are collapsed into a `List` under the first occurrence.
    Map(Vec<(String, XmlValue)>),
    /// Repeated sibling elements sharing one name.
    List(Vec<XmlValue>),
    /// Character data.
    Text(String),
}

impl XmlValue {
    /// Direct child lookup by key. No recursion: callers that need the
    /// fuzzy search use [`find_node`].
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Map(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Scalar content of this node, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(value) => Some(value),
            XmlValue::Map(_) => match self.get(TEXT_KEY) {
                Some(XmlValue::Text(value)) => Some(value),
                _ => None,
            },
            XmlValue::List(_) => None,
        }
    }
}

/// Depth-first search for the first node stored under `target`.
///
/// Maps are scanned entry-wise, checking each key before descending into
/// its value; lists are traversed element-wise. This is the fuzzy half of
/// the two-phase lookup: it anchors on a well-known node regardless of
/// how deeply the envelope nests it, after which field access is strictly
/// direct-child.
pub fn find_node<'a>(value: &'a XmlValue, target: &str) -> Option<&'a XmlValue> {
    match value {
        XmlValue::Map(entries) => {
            for (key, child) in entries {
                if key == target {
                    return Some(child);
                }
                if let Some(found) = find_node(child, target) {
                    return Some(found);
                }
            }
            None
        }
        XmlValue::List(items) => items.iter().find_map(|item| find_node(item, target)),
        XmlValue::Text(_) => None,
    }
}

struct Frame {
    name: String,
    children: Vec<(String, XmlValue)>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn into_value(mut self) -> (String, XmlValue) {
        let value = if self.children.is_empty() {
            XmlValue::Text(self.text)
        } else {
            if !self.text.is_empty() {
                insert_child(&mut self.children, TEXT_KEY.to_string(), XmlValue::Text(self.text));
            }
            XmlValue::Map(self.children)
        };
        (self.name, value)
    }
}

/// Add a child under `key`, collapsing repeated keys into a `List`.
fn insert_child(children: &mut Vec<(String, XmlValue)>, key: String, value: XmlValue) {
    if let Some((_, existing)) = children.iter_mut().find(|(k, _)| *k == key) {
        match existing {
            XmlValue::List(items) => items.push(value),
            _ => {
                let previous = std::mem::replace(existing, XmlValue::List(Vec::new()));
                if let XmlValue::List(items) = existing {
                    items.push(previous);
                    items.push(value);
                }
            }
        }
    } else {
        children.push((key, value));
    }
}

fn local_name_of(name: &[u8]) -> String {
    let local = match name.iter().rposition(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    };
    String::from_utf8_lossy(local).into_owned()
}

/// Parse an XML byte payload into a tree rooted at an anonymous map.
pub fn parse_tree(xml: &[u8]) -> anyhow::Result<XmlValue> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut stack = vec![Frame::new(String::new())];

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let mut frame = Frame::new(local_name_of(e.name().as_ref()));
                for attr in e.attributes() {
                    let attr = attr?;
                    insert_child(
                        &mut frame.children,
                        local_name_of(attr.key.as_ref()),
                        XmlValue::Text(attr.unescape_value()?.into_owned()),
                    );
                }
                stack.push(frame);
            }
            Event::Empty(e) => {
                let mut children = Vec::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    insert_child(
                        &mut children,
                        local_name_of(attr.key.as_ref()),
                        XmlValue::Text(attr.unescape_value()?.into_owned()),
                    );
                }
                let value = if children.is_empty() {
                    XmlValue::Text(String::new())
                } else {
                    XmlValue::Map(children)
                };
                let top = stack
                    .last_mut()
                    .ok_or_else(|| anyhow::anyhow!("unbalanced XML element"))?;
                insert_child(&mut top.children, local_name_of(e.name().as_ref()), value);
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(trimmed);
                    }
                }
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = String::from_utf8_lossy(&raw);
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(trimmed);
                    }
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| anyhow::anyhow!("unbalanced XML element"))?;
                let (name, value) = frame.into_value();
                let top = stack
                    .last_mut()
                    .ok_or_else(|| anyhow::anyhow!("unbalanced XML element"))?;
                insert_child(&mut top.children, name, value);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if stack.len() != 1 {
        anyhow::bail!("truncated XML: {} element(s) left open", stack.len() - 1);
    }
    let (_, root) = stack
        .pop()
        .map(Frame::into_value)
        .unwrap_or((String::new(), XmlValue::Map(Vec::new())));
    Ok(root)
}
