use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::annotation::ShapeKind;

/// Which tool owns the overlay surface. Exactly one is selected at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// No drawing tool; clicks remove the highlight, shape or path they land on.
    #[default]
    Select,
    Highlight,
    Shape(ShapeKind),
    Freehand,
    Comment,
    /// Select and overwrite document text runs.
    Text,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::Select => "select",
            Tool::Highlight => "highlight",
            Tool::Shape(ShapeKind::Rectangle) => "rectangle",
            Tool::Shape(ShapeKind::Circle) => "circle",
            Tool::Freehand => "freehand",
            Tool::Comment => "comment",
            Tool::Text => "text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool: {0:?}")]
pub struct UnknownTool(pub String);

impl FromStr for Tool {
    type Err = UnknownTool;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(Tool::Select),
            "highlight" => Ok(Tool::Highlight),
            "rectangle" => Ok(Tool::Shape(ShapeKind::Rectangle)),
            "circle" => Ok(Tool::Shape(ShapeKind::Circle)),
            "freehand" | "draw" => Ok(Tool::Freehand),
            "comment" => Ok(Tool::Comment),
            "text" => Ok(Tool::Text),
            _ => Err(UnknownTool(value.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_round_trip() {
        for tool in [
            Tool::Select,
            Tool::Highlight,
            Tool::Shape(ShapeKind::Rectangle),
            Tool::Shape(ShapeKind::Circle),
            Tool::Freehand,
            Tool::Comment,
            Tool::Text,
        ] {
            assert_eq!(tool.to_string().parse::<Tool>(), Ok(tool));
        }
        assert!("lasso".parse::<Tool>().is_err());
    }
}
