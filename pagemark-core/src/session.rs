//! Interaction state owned by the controller
//!
//! The active mode, the current colour of each tool, the document being
//! annotated and the last pointer position live here and are passed to the
//! operations that need them.

use tracing::debug;

use crate::config::AnnotatorConfig;
use crate::decoration::DecorationApplier;
use crate::dom::{Dom, NodeId};
use crate::error::SessionError;

/// Interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Highlighting,
    Erasing,
}

/// Toolbar tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Highlight,
    Erase,
    Draw,
    Text,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[Tool::Highlight, Tool::Erase, Tool::Draw, Tool::Text]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Highlight => "highlight",
            Tool::Erase => "erase",
            Tool::Draw => "draw",
            Tool::Text => "text",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::all().iter().copied().find(|t| t.as_str() == name)
    }

    /// Mode a tool toggles, or `NotImplemented` for the reserved tools
    pub fn mode(&self) -> Result<Mode, SessionError> {
        match self {
            Tool::Highlight => Ok(Mode::Highlighting),
            Tool::Erase => Ok(Mode::Erasing),
            Tool::Draw | Tool::Text => Err(SessionError::NotImplemented(self.as_str())),
        }
    }
}

/// Pointer shape to show over a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Crosshair,
    Pointer,
    Text,
    Default,
}

const TEXT_LIKE_TAGS: &[&str] = &[
    "p", "span", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "th", "figcaption",
];

/// Per-view interaction state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub mode: Mode,
    pub document_id: Option<String>,
    /// Last pointer position as (node, char offset)
    pub pointer: Option<(NodeId, usize)>,
    highlight_color: String,
    draw_color: String,
    text_color: String,
}

impl Session {
    pub fn new(config: &AnnotatorConfig) -> Self {
        let first = |colors: &[String]| colors.first().cloned().unwrap_or_else(|| config.fallback_color.clone());
        Self {
            mode: Mode::Idle,
            document_id: None,
            pointer: None,
            highlight_color: first(&config.palettes.highlight),
            draw_color: first(&config.palettes.draw),
            text_color: first(&config.palettes.text),
        }
    }

    /// Toggle the mode behind `tool`. Entering one mode leaves the other;
    /// toggling the active mode returns to idle.
    pub fn toggle(&mut self, tool: Tool) -> Result<Mode, SessionError> {
        let target = tool.mode()?;
        self.mode = if self.mode == target { Mode::Idle } else { target };
        debug!(tool = tool.as_str(), mode = ?self.mode, "tool toggled");
        Ok(self.mode)
    }

    pub fn color(&self, tool: Tool) -> Option<&str> {
        match tool {
            Tool::Highlight => Some(&self.highlight_color),
            Tool::Draw => Some(&self.draw_color),
            Tool::Text => Some(&self.text_color),
            Tool::Erase => None,
        }
    }

    fn color_slot(&mut self, tool: Tool) -> Option<&mut String> {
        match tool {
            Tool::Highlight => Some(&mut self.highlight_color),
            Tool::Draw => Some(&mut self.draw_color),
            Tool::Text => Some(&mut self.text_color),
            Tool::Erase => None,
        }
    }

    /// Make `color` the current colour of `tool`
    pub fn pick_color(&mut self, config: &AnnotatorConfig, tool: Tool, color: &str) -> Result<(), SessionError> {
        let offered = config.palettes.for_tool(tool).iter().any(|c| c == color);
        match self.color_slot(tool) {
            Some(slot) if offered => {
                *slot = color.to_string();
                Ok(())
            }
            _ => Err(SessionError::UnknownColor {
                tool: tool.as_str(),
                color: color.to_string(),
            }),
        }
    }

    /// Next colour in the tool's palette after the current one
    pub fn cycle_color(&mut self, config: &AnnotatorConfig, tool: Tool) -> Option<&str> {
        let palette = config.palettes.for_tool(tool);
        let current = self.color(tool)?;
        let index = palette.iter().position(|c| c == current).map_or(0, |i| (i + 1) % palette.len());
        let next = palette.get(index)?.clone();
        self.pick_color(config, tool, &next).ok()?;
        self.color(tool)
    }

    pub fn cursor_hint(&self, dom: &Dom, target: NodeId) -> CursorHint {
        match self.mode {
            Mode::Highlighting => CursorHint::Crosshair,
            Mode::Erasing => CursorHint::Pointer,
            Mode::Idle => {
                let text_like = dom.is_text(target)
                    || dom.tag(target).is_some_and(|tag| TEXT_LIKE_TAGS.contains(&tag));
                if text_like {
                    CursorHint::Text
                } else {
                    CursorHint::Default
                }
            }
        }
    }
}

/// Decoration under a pointer at `(node, offset)`
///
/// The innermost decoration among `node` and its ancestors wins. Otherwise,
/// when `node` is an element, the text under `offset` inside it is checked.
pub fn hit_test(applier: &DecorationApplier<'_>, dom: &Dom, node: NodeId, offset: usize) -> Option<NodeId> {
    if let Some(&decoration) = applier.enclosing(dom, node).first() {
        return Some(decoration);
    }
    if !dom.is_element(node) {
        return None;
    }
    let (text, _) = dom.locate_text(node, offset)?;
    dom.ancestors(text)
        .take_while(|&n| n != node)
        .find(|&n| applier.is_decoration(dom, n))
}
