//! Minimal XML element tree shared by every message codec.
//!
//! CSTA message bodies are simple trees: an element either holds text or a
//! sequence of child elements, never a mix of both, and attributes are rare
//! (`typeOfNumber` on device identifiers, roughly). Rather than hand-roll
//! `quick_xml::Writer`/`Reader` event sequences per message type we build one
//! generic tree here and let each message's `encode`/`decode` walk it.

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

use crate::error::{CstaError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Shorthand for a leaf element: `<name>text</name>`.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.text.as_deref())
    }

    /// Descend a dotted path of element names, e.g. `path(&["monitorObject", "deviceObject"])`.
    pub fn path(&self, segments: &[&str]) -> Option<&XmlElement> {
        let mut cur = self;
        for seg in segments {
            cur = cur.child(seg)?;
        }
        Some(cur)
    }

    pub fn require_child(&self, name: &str) -> Result<&XmlElement> {
        self.child(name).ok_or_else(|| {
            CstaError::DecodeError(format!("<{}> missing required child <{}>", self.name, name))
        })
    }

    pub fn require_text(&self) -> Result<&str> {
        self.text
            .as_deref()
            .ok_or_else(|| CstaError::DecodeError(format!("<{}> has no text content", self.name)))
    }

    pub fn require_child_text(&self, name: &str) -> Result<&str> {
        self.require_child(name)?.require_text()
    }

    /// Serialize this element as the document root, with the given
    /// `xmlns` attribute injected (empty string means no namespace).
    pub fn to_xml_string(&self, xmlns: &str) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let mut root = self.clone();
        if !xmlns.is_empty() {
            root.attrs.insert(0, ("xmlns".to_string(), xmlns.to_string()));
        }
        write_element(&mut writer, &root)
            .map_err(|e| CstaError::EncodeError(e.to_string()))?;
        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| CstaError::EncodeError(e.to_string()))
    }

    /// Parse an XML document (no leading declaration expected) into a tree.
    pub fn from_xml_str(xml: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let elem = start_to_element(e)?;
                    stack.push(elem);
                }
                Ok(Event::Empty(ref e)) => {
                    let elem = start_to_element(e)?;
                    push_finished(&mut stack, &mut root, elem)?;
                }
                Ok(Event::Text(ref e)) => {
                    let text = e
                        .unescape()
                        .map_err(|err| CstaError::DecodeError(err.to_string()))?
                        .trim()
                        .to_string();
                    if !text.is_empty() {
                        if let Some(top) = stack.last_mut() {
                            top.text = Some(text);
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    let elem = stack
                        .pop()
                        .ok_or_else(|| CstaError::DecodeError("unbalanced end tag".into()))?;
                    push_finished(&mut stack, &mut root, elem)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(CstaError::DecodeError(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        root.ok_or_else(|| CstaError::DecodeError("empty document".into()))
    }
}

fn push_finished(
    stack: &mut Vec<XmlElement>,
    root: &mut Option<XmlElement>,
    elem: XmlElement,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(elem);
    } else if root.is_none() {
        *root = Some(elem);
    } else {
        return Err(CstaError::DecodeError("multiple root elements".into()));
    }
    Ok(())
}

fn start_to_element(e: &BytesStart) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| CstaError::DecodeError(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| CstaError::DecodeError(err.to_string()))?
            .to_string();
        attrs.push((key, value));
    }
    Ok(XmlElement {
        name,
        attrs,
        text: None,
        children: Vec::new(),
    })
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, el: &XmlElement) -> quick_xml::Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attrs {
        start.push_attribute((k.as_str(), v.as_str()));
    }

    if el.text.is_none() && el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &el.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &el.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesStart::new(el.name.as_str()).to_end()))?;
    Ok(())
}

/// Writes an XML declaration followed by `root`. Not used on the wire today
/// (CSTA bodies are undeclared) but kept for callers that want one.
#[allow(dead_code)]
pub fn to_xml_string_with_decl(root: &XmlElement) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| CstaError::EncodeError(e.to_string()))?;
    write_element(&mut writer, root).map_err(|e| CstaError::EncodeError(e.to_string()))?;
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| CstaError::EncodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_nested_element() {
        let el = XmlElement::new("MonitorStart")
            .with_child(
                XmlElement::new("monitorObject").with_child(
                    XmlElement::new("deviceObject")
                        .with_attr("typeOfNumber", "dialingNumber")
                        .with_text("212700"),
                ),
            )
            .with_child(XmlElement::leaf("monitorType", "device"));

        let xml = el
            .to_xml_string("http://www.ecma-international.org/standards/ecma-323/csta/ed4")
            .unwrap();
        assert_eq!(
            xml,
            "<MonitorStart xmlns=\"http://www.ecma-international.org/standards/ecma-323/csta/ed4\">\
<monitorObject><deviceObject typeOfNumber=\"dialingNumber\">212700</deviceObject></monitorObject>\
<monitorType>device</monitorType></MonitorStart>"
        );

        let parsed = XmlElement::from_xml_str(&xml).unwrap();
        assert_eq!(parsed.name, "MonitorStart");
        let device = parsed.path(&["monitorObject", "deviceObject"]).unwrap();
        assert_eq!(device.attr("typeOfNumber"), Some("dialingNumber"));
        assert_eq!(device.text.as_deref(), Some("212700"));
        assert_eq!(parsed.child_text("monitorType"), Some("device"));
    }
}
