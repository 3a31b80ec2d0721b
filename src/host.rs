//! Host session interface.
//!
//! The compositing application is reached only through [`Host`]. Everything
//! the Read-from-Write pipeline needs (selection, knobs, node creation,
//! dialogs) goes through this trait, so the pipeline can be driven by a live
//! session or by the in-memory [`crate::session::Session`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::range::FrameRange;

/// Node identifier. Nodes are addressed by their unique name.
pub type ItemId = String;

/// Value stored in a knob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KnobValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl KnobValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KnobValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view. Floats truncate, strings are parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            KnobValue::Int(v) => Some(*v),
            KnobValue::Float(v) => Some(*v as i64),
            KnobValue::Bool(v) => Some(*v as i64),
            KnobValue::Str(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        }
    }

    /// Checkbox view: non-zero numbers and "true"/"1" strings are set.
    pub fn as_bool(&self) -> bool {
        match self {
            KnobValue::Bool(v) => *v,
            KnobValue::Int(v) => *v != 0,
            KnobValue::Float(v) => *v != 0.0,
            KnobValue::Str(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        }
    }
}

impl fmt::Display for KnobValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnobValue::Bool(v) => write!(f, "{}", v),
            KnobValue::Int(v) => write!(f, "{}", v),
            KnobValue::Float(v) => write!(f, "{}", v),
            KnobValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for KnobValue {
    fn from(s: &str) -> Self {
        KnobValue::Str(s.to_string())
    }
}

impl From<String> for KnobValue {
    fn from(s: String) -> Self {
        KnobValue::Str(s)
    }
}

impl From<i64> for KnobValue {
    fn from(v: i64) -> Self {
        KnobValue::Int(v)
    }
}

impl From<bool> for KnobValue {
    fn from(v: bool) -> Self {
        KnobValue::Bool(v)
    }
}

/// Node placement in the DAG (top-left corner plus screen height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub height: i64,
}

/// Scripting API of the host session.
///
/// Knob access returns `None` for knobs the node does not expose; absence is
/// never an error at this level.
pub trait Host {
    /// Currently selected nodes, in selection order.
    fn selected_items(&self) -> Vec<ItemId>;

    /// Stored (unevaluated) knob value.
    fn knob(&self, item: &str, name: &str) -> Option<KnobValue>;

    /// Knob value after expression evaluation at the current frame.
    fn evaluate(&self, item: &str, name: &str) -> Option<String>;

    /// Set a knob. Returns `false` if the node has no such knob.
    fn set_knob(&mut self, item: &str, name: &str, value: KnobValue) -> bool;

    /// Create a new node of the given class and return its id.
    fn create_item(&mut self, class: &str) -> ItemId;

    fn item_class(&self, item: &str) -> Option<String>;

    fn position(&self, item: &str) -> Option<Position>;

    fn set_position(&mut self, item: &str, x: i64, y: i64);

    /// Frame range of whatever feeds into the node.
    fn upstream_range(&self, item: &str) -> FrameRange;

    /// Evaluated project directory of the script root, if configured.
    fn project_root(&self) -> Option<String>;

    /// Full path of the saved script, `None` while unsaved.
    fn script_name(&self) -> Option<String>;

    /// Modal yes/no dialog.
    fn confirm(&mut self, message: &str) -> bool;

    /// Modal message dialog.
    fn notify(&mut self, message: &str);

    fn has_knob(&self, item: &str, name: &str) -> bool {
        self.knob(item, name).is_some()
    }
}
