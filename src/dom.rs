//! A small retained element tree standing in for the page the dashboard draws into.
//!
//! Nodes live in an arena and are addressed by `NodeId`. Slots of removed
//! subtrees are recycled, so a `NodeId` held across a content replacement may
//! end up pointing at a different element; callers that keep ids around (the
//! highlight timers) only ever remove a class, which is harmless if that happens.

use std::collections::{BTreeMap, HashMap};

pub type NodeId = usize;

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_string(),
            id: None,
            classes: vec![],
            attributes: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: vec![],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Element>>,
    free: Vec<NodeId>,
    ids: HashMap<String, NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            nodes: vec![Some(Element::new("body"))],
            free: vec![],
            ids: HashMap::new(),
        }
    }

    pub fn body(&self) -> NodeId {
        0
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let element = Some(Element::new(tag));
        match self.free.pop() {
            Some(node) => {
                self.nodes[node] = element;
                node
            }
            None => {
                self.nodes.push(element);
                self.nodes.len() - 1
            }
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.get(parent).is_none() || self.get(child).is_none() {
            return;
        }
        if let Some(old_parent) = self.parent(child) {
            if let Some(old) = self.get_mut(old_parent) {
                old.children.retain(|&c| c != child);
            }
        }
        if let Some(element) = self.get_mut(child) {
            element.parent = Some(parent);
        }
        if let Some(element) = self.get_mut(parent) {
            element.children.push(child);
        }
    }

    /// Shorthand for create + class + text + append.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, class: &str, text: &str) -> NodeId {
        let node = self.create_element(tag);
        self.set_class_name(node, class);
        self.set_text_content(node, text);
        self.append_child(parent, node);
        node
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        let previous = match self.get_mut(node) {
            Some(element) => element.id.replace(id.to_string()),
            None => return,
        };
        if let Some(previous) = previous {
            self.ids.remove(&previous);
        }
        self.ids.insert(id.to_string(), node);
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|e| e.parent)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(|e| e.tag.as_str())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn class_name(&self, node: NodeId) -> String {
        self.get(node)
            .map(|e| e.classes.join(" "))
            .unwrap_or_default()
    }

    pub fn set_class_name(&mut self, node: NodeId, class_name: &str) {
        if let Some(element) = self.get_mut(node) {
            element.classes = class_name.split_whitespace().map(String::from).collect();
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node)
            .map(|e| e.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.get_mut(node) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.get_mut(node) {
            element.classes.retain(|c| c != class);
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node)
            .and_then(|e| e.attributes.get(name))
            .map(String::as_str)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.get_mut(node) {
            element.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Own text followed by the text of all descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(element) = self.get(node) {
            out.push_str(&element.text);
            for &child in &element.children {
                self.collect_text(child, out);
            }
        }
    }

    /// Replaces all content of `node` with `text`.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if let Some(element) = self.get_mut(node) {
            element.text = text.to_string();
        }
    }

    /// Drops every descendant of `node` and its own text.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = match self.get_mut(node) {
            Some(element) => {
                element.text.clear();
                std::mem::take(&mut element.children)
            }
            None => return,
        };
        for child in children {
            self.release(child);
        }
    }

    fn release(&mut self, node: NodeId) {
        let element = match self.nodes.get_mut(node).and_then(Option::take) {
            Some(element) => element,
            None => return,
        };
        if let Some(id) = element.id {
            if self.ids.get(&id) == Some(&node) {
                self.ids.remove(&id);
            }
        }
        for child in element.children {
            self.release(child);
        }
        self.free.push(node);
    }

    /// First descendant of `node` (depth-first, document order) matching a
    /// `.class`, `#id` or tag selector.
    pub fn query_selector(&self, node: NodeId, selector: &str) -> Option<NodeId> {
        for &child in self.children(node) {
            if self.matches(child, selector) {
                return Some(child);
            }
            if let Some(found) = self.query_selector(child, selector) {
                return Some(found);
            }
        }
        None
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        let element = match self.get(node) {
            Some(element) => element,
            None => return false,
        };
        if let Some(class) = selector.strip_prefix('.') {
            element.classes.iter().any(|c| c == class)
        } else if let Some(id) = selector.strip_prefix('#') {
            element.id.as_deref() == Some(id)
        } else {
            element.tag == selector
        }
    }

    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let element = match self.get(node) {
            Some(element) => element,
            None => return,
        };
        out.push('<');
        out.push_str(&element.tag);
        if let Some(id) = &element.id {
            out.push_str(&format!(" id=\"{}\"", escape(id)));
        }
        if !element.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape(&element.classes.join(" "))));
        }
        for (name, value) in &element.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
        }
        out.push('>');
        out.push_str(&escape(&element.text));
        for &child in &element.children {
            self.write_html(child, out);
        }
        out.push_str("</");
        out.push_str(&element.tag);
        out.push('>');
    }

    fn get(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(node).and_then(Option::as_mut)
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_list_operations() {
        let mut doc = Document::new();
        let div = doc.append_element(doc.body(), "div", "parking-spot  occupied", "");
        assert_eq!(doc.class_name(div), "parking-spot occupied");
        doc.add_class(div, "updated");
        doc.add_class(div, "updated");
        assert_eq!(doc.class_name(div), "parking-spot occupied updated");
        doc.remove_class(div, "updated");
        assert!(!doc.has_class(div, "updated"));
        assert!(doc.has_class(div, "occupied"));
    }

    #[test]
    fn query_selector_finds_nested_descendants_in_order() {
        let mut doc = Document::new();
        let outer = doc.append_element(doc.body(), "div", "card", "");
        let inner = doc.append_element(outer, "div", "body", "");
        let first = doc.append_element(inner, "p", "plate-info", "one");
        doc.append_element(outer, "p", "plate-info", "two");
        assert_eq!(doc.query_selector(doc.body(), ".plate-info"), Some(first));
        assert_eq!(doc.query_selector(outer, "p"), Some(first));
        assert_eq!(doc.query_selector(outer, ".missing"), None);
    }

    #[test]
    fn replacing_content_frees_descendants_and_their_ids() {
        let mut doc = Document::new();
        let card = doc.append_element(doc.body(), "div", "", "");
        let child = doc.append_element(card, "span", "", "x");
        doc.set_id(child, "inner");
        assert_eq!(doc.text_content(card), "x");

        doc.set_text_content(card, "replaced");
        assert_eq!(doc.get_element_by_id("inner"), None);
        assert!(doc.children(card).is_empty());
        assert_eq!(doc.text_content(card), "replaced");

        // The freed slot is handed out again.
        assert_eq!(doc.create_element("p"), child);
    }

    #[test]
    fn reparenting_moves_the_child() {
        let mut doc = Document::new();
        let a = doc.append_element(doc.body(), "div", "", "");
        let b = doc.append_element(doc.body(), "div", "", "");
        let c = doc.append_element(a, "span", "", "");
        doc.append_child(b, c);
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), &[c]);
        assert_eq!(doc.parent(c), Some(b));
    }

    #[test]
    fn renders_escaped_html() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.body(), "p", "plate-info", "Plate: <A&B>");
        doc.set_id(p, "x");
        doc.set_attribute(p, "data-status", "occupied");
        assert_eq!(
            doc.to_html(p),
            "<p id=\"x\" class=\"plate-info\" data-status=\"occupied\">Plate: &lt;A&amp;B&gt;</p>"
        );
    }

    #[test]
    fn stale_nodes_are_ignored() {
        let mut doc = Document::new();
        doc.add_class(42, "updated");
        assert_eq!(doc.class_name(42), "");
        assert_eq!(doc.text_content(42), "");
    }
}
