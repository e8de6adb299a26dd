//! Annotator configuration
//!
//! Names used to recognise decorations and qualifying containers in the
//! rendered tree, plus the colour palettes offered per tool.

use serde::Deserialize;

use crate::session::Tool;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Tag of the inline wrapper created around highlighted text
    pub decoration_tag: String,
    /// Class marking an element as a decoration
    pub decoration_class: String,
    /// Attribute holding the owning group id
    pub group_attribute: String,
    /// Class of a text container whose mount triggers reconciliation
    pub container_class: String,
    /// Class of the page element a container belongs to
    pub page_class: String,
    pub palettes: Palettes,
    /// Colour used for stored groups that carry none
    pub fallback_color: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Palettes {
    pub highlight: Vec<String>,
    pub draw: Vec<String>,
    pub text: Vec<String>,
}

impl Palettes {
    /// Colours offered for `tool`; tools without colours get an empty slice
    pub fn for_tool(&self, tool: Tool) -> &[String] {
        match tool {
            Tool::Highlight => &self.highlight,
            Tool::Draw => &self.draw,
            Tool::Text => &self.text,
            Tool::Erase => &[],
        }
    }
}

fn colors(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}

impl Default for Palettes {
    fn default() -> Self {
        Self {
            highlight: colors(&["yellow", "greenyellow", "cyan", "magenta", "red"]),
            draw: colors(&["white", "black", "red", "green", "blue"]),
            text: colors(&["white", "black", "red", "green", "blue"]),
        }
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            decoration_tag: "span".to_string(),
            decoration_class: "pdf-highlight".to_string(),
            group_attribute: "data-group-id".to_string(),
            container_class: "gsr-text-ctn".to_string(),
            page_class: "gsr-page".to_string(),
            palettes: Palettes::default(),
            fallback_color: "yellow".to_string(),
        }
    }
}

impl AnnotatorConfig {
    /// Parse a JSON config; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
