//! Parsing of XML response documents.
//!
//! Responses are read into a small owned element tree. All lookups are scoped to
//! the SQS namespace for [`API_VERSION`](crate::config::API_VERSION); elements in
//! any other namespace are invisible to queries.
//!
//! Parsing never fails. A body that is empty or not well-formed produces a
//! document with no root, on which every query returns nothing.

use crate::config::XML_NAMESPACE;
use crate::error::ServiceError;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::borrow::Cow;

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;

/// An element of a parsed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn new(namespace: Option<String>, name: String) -> Self {
        Self {
            namespace,
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Local name, without any prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI the element is bound to
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Character data directly inside this element, unescaped and untrimmed
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Text of the first direct child in the SQS namespace named `name`
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|child| child.is_sqs(name))
            .map(Element::text)
    }

    fn is_sqs(&self, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(XML_NAMESPACE)
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        if self.is_sqs(name) {
            found.push(self);
        }
        for child in &self.children {
            child.collect(name, found);
        }
    }
}

/// A parsed response body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDocument {
    root: Option<Element>,
}

impl ResponseDocument {
    /// Parse `body`, falling back to an empty document if it is not well-formed XML
    pub fn parse(body: &str) -> Self {
        Self {
            root: parse_tree(body),
        }
    }

    /// Whether the body was parsed into a document
    pub fn has_document(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Every SQS element named `name`, in document order
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        if let Some(root) = &self.root {
            root.collect(name, &mut found);
        }
        found
    }

    /// First SQS element named `name`, in document order
    pub fn find_first(&self, name: &str) -> Option<&Element> {
        self.find_all(name).into_iter().next()
    }

    /// Text of the first SQS element named `name`
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.find_first(name).map(Element::text)
    }

    /// The error reported by the service, if the document contains an `Error` element
    ///
    /// Missing `Code` or `Message` children are reported as empty strings.
    pub fn service_error(&self) -> Option<ServiceError> {
        self.find_first("Error").map(|error| {
            ServiceError::new(
                error.child_text("Code").unwrap_or_default(),
                error.child_text("Message").unwrap_or_default(),
            )
        })
    }
}

fn parse_tree(body: &str) -> Option<Element> {
    let mut reader = NsReader::from_str(body);
    reader.expand_empty_elements(true);
    reader.trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_resolved_event_into(&mut buf) {
            Ok((resolved, Event::Start(ref e))) => {
                if root.is_some() && stack.is_empty() {
                    // A second top-level element
                    return None;
                }
                let namespace = match resolved {
                    ResolveResult::Bound(ns) => {
                        Some(String::from_utf8_lossy(ns.as_ref()).into_owned())
                    }
                    _ => None,
                };
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push(Element::new(namespace, name));
            }
            Ok((_, Event::End(_))) => {
                let element = stack.pop()?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok((_, Event::Text(t))) => {
                let raw = std::str::from_utf8(&t).ok()?;
                let normalized = normalize_line_endings(raw);
                let text = unescape(&normalized).ok()?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return None,
                }
            }
            Ok((_, Event::CData(c))) => {
                let bytes = c.into_inner();
                let text = std::str::from_utf8(&bytes).ok()?;
                stack
                    .last_mut()?
                    .text
                    .push_str(&normalize_line_endings(text));
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
        buf.clear();
    }

    if stack.is_empty() {
        root
    } else {
        None
    }
}

/// XML end-of-line handling: literal `\r\n` and lone `\r` become `\n`
///
/// Applied to raw text before entity expansion, so `&#13;` survives as `\r`.
fn normalize_line_endings(raw: &str) -> Cow<'_, str> {
    if raw.contains('\r') {
        Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}
