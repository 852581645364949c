//! Tags
//!
//! Component resolution and HTML tag facts used by the fragment parser

use crate::error::{CompilerError, Result};
use crate::parse_util::ParseLocation;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static COMPONENT_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.:-]*$").unwrap());
static COMPONENT_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

/// Elements that never have content or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(lower_case_name: &str) -> bool {
    VOID_ELEMENTS.contains(&lower_case_name)
}

/// Opaque reference to a component type, as handed out by a [`TagResolver`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentHandle {
    type_name: String,
}

impl ComponentHandle {
    pub fn new(type_name: impl Into<String>) -> Self {
        ComponentHandle {
            type_name: type_name.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Decides whether a tag name denotes a component.
///
/// Called once per opening tag with the name exactly as written.
pub trait TagResolver {
    fn resolve(&self, name: &str) -> Option<ComponentHandle>;
}

/// Resolver under which every tag is a plain element
#[derive(Debug, Clone, Copy, Default)]
pub struct NoComponents;

impl TagResolver for NoComponents {
    fn resolve(&self, _name: &str) -> Option<ComponentHandle> {
        None
    }
}

/// Case-sensitive table of tag names to component types, kept in
/// registration order
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: IndexMap<String, ComponentHandle>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        ComponentRegistry::default()
    }

    pub fn register(&mut self, tag: &str, type_name: &str) -> Result<()> {
        if !COMPONENT_TAG_RE.is_match(tag) {
            return Err(CompilerError::invalid_tag(
                format!("\"{}\" is not a valid component tag name", tag),
                ParseLocation::default(),
            ));
        }
        if !COMPONENT_TYPE_RE.is_match(type_name) {
            return Err(CompilerError::invalid_tag(
                format!("\"{}\" is not a valid component type name", type_name),
                ParseLocation::default(),
            ));
        }
        self.components
            .insert(tag.to_string(), ComponentHandle::new(type_name));
        Ok(())
    }

    pub fn with(mut self, tag: &str, type_name: &str) -> Result<Self> {
        self.register(tag, type_name)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }
}

impl TagResolver for ComponentRegistry {
    fn resolve(&self, name: &str) -> Option<ComponentHandle> {
        self.components.get(name).cloned()
    }
}

/// Open tag awaiting its closing tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStackEntry {
    /// Lower-cased for elements, as written for components
    pub name: String,
    pub component: Option<ComponentHandle>,
}

impl TagStackEntry {
    pub fn is_component(&self) -> bool {
        self.component.is_some()
    }
}
