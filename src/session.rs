//! In-memory host session backed by a JSON scene.
//!
//! Mirrors the parts of a compositing script the Read-from-Write tool
//! touches: root settings, nodes with knobs and DAG positions, input links
//! and the selection. Used by the CLI and by tests.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::error::{ReadError, Result};
use crate::filter::{DriveMap, Platform, filename_filter};
use crate::host::{Host, ItemId, KnobValue, Position};
use crate::range::{FrameRange, KNOB_FIRST, KNOB_LAST};

lazy_static! {
    static ref VALUE_EXPR: Regex = Regex::new(r"\[value\s+(\w+)\.(\w+)\s*\]").unwrap();
    static ref ENV_VAR: Regex = Regex::new(r"\$\{(\w+)\}|\$(\w+)").unwrap();
    static ref HASHES: Regex = Regex::new(r"#+").unwrap();
    static ref PRINTF: Regex = Regex::new(r"%(0(\d+))?d").unwrap();
}

/// Default DAG height of a node
const NODE_HEIGHT: i64 = 26;

/// Script root settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Root {
    /// Saved script path, `None` while unsaved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base for relative file knobs (may contain expressions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_directory: Option<String>,
    pub first_frame: i64,
    pub last_frame: i64,
    /// Current frame, used when evaluating frame placeholders
    pub frame: i64,
}

impl Default for Root {
    fn default() -> Self {
        Self {
            name: None,
            project_directory: None,
            first_frame: 1,
            last_frame: 100,
            frame: 1,
        }
    }
}

/// Node as stored in a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub knobs: IndexMap<String, KnobValue>,
    #[serde(default)]
    pub xpos: i64,
    #[serde(default)]
    pub ypos: i64,
    #[serde(default = "default_height")]
    pub height: i64,
    /// Name of the node feeding input 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

fn default_height() -> i64 {
    NODE_HEIGHT
}

impl SceneNode {
    pub fn new(name: &str, class: &str) -> Self {
        Self {
            name: name.to_string(),
            class: class.to_string(),
            knobs: IndexMap::new(),
            xpos: 0,
            ypos: 0,
            height: NODE_HEIGHT,
            input: None,
        }
    }

    pub fn knob(mut self, name: &str, value: impl Into<KnobValue>) -> Self {
        self.knobs.insert(name.to_string(), value.into());
        self
    }

    pub fn at(mut self, xpos: i64, ypos: i64) -> Self {
        self.xpos = xpos;
        self.ypos = ypos;
        self
    }

    pub fn input(mut self, name: &str) -> Self {
        self.input = Some(name.to_string());
        self
    }
}

/// Knobs a freshly created node of `class` exposes.
fn default_knobs(class: &str) -> IndexMap<String, KnobValue> {
    let mut knobs = IndexMap::new();
    if class == "Read" {
        knobs.insert("file".into(), KnobValue::Str(String::new()));
        knobs.insert(KNOB_FIRST.into(), KnobValue::Int(1));
        knobs.insert(KNOB_LAST.into(), KnobValue::Int(1));
        knobs.insert("colorspace".into(), KnobValue::Str("default".into()));
        knobs.insert("premultiplied".into(), KnobValue::Bool(false));
        knobs.insert("raw".into(), KnobValue::Bool(false));
    }
    knobs
}

/// Serialized session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub root: Root,
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
    #[serde(default)]
    pub selected: Vec<String>,
}

/// How yes/no dialogs are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPolicy {
    Yes,
    No,
    /// Ask on stdin
    Interactive,
}

/// In-memory [`Host`] implementation.
#[derive(Debug, Clone)]
pub struct Session {
    root: Root,
    nodes: IndexMap<String, SceneNode>,
    selected: Vec<String>,
    policy: ConfirmPolicy,
    platform: Platform,
    drive_maps: Vec<DriveMap>,
    notifications: Vec<String>,
    prompts: Vec<String>,
}

impl Session {
    pub fn new(root: Root) -> Self {
        Self {
            root,
            nodes: IndexMap::new(),
            selected: Vec::new(),
            policy: ConfirmPolicy::No,
            platform: Platform::Other,
            drive_maps: Vec::new(),
            notifications: Vec::new(),
            prompts: Vec::new(),
        }
    }

    pub fn from_scene(scene: Scene) -> Result<Self> {
        let mut session = Self::new(scene.root);
        for node in scene.nodes {
            session.add_node(node);
        }
        session.select(&scene.selected)?;
        Ok(session)
    }

    /// Load a scene file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let scene: Scene = serde_json::from_str(&text)?;
        debug!("Loaded scene {} ({} nodes)", path.display(), scene.nodes.len());
        Self::from_scene(scene)
    }

    pub fn to_scene(&self) -> Scene {
        Scene {
            root: self.root.clone(),
            nodes: self.nodes.values().cloned().collect(),
            selected: self.selected.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.to_scene())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn add_node(&mut self, node: SceneNode) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn node(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.get(name)
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Root {
        &mut self.root
    }

    /// Replace the selection. Every name must exist.
    pub fn select(&mut self, names: &[String]) -> Result<()> {
        if let Some(missing) = names.iter().find(|n| !self.nodes.contains_key(n.as_str())) {
            return Err(ReadError::UnknownItem(missing.clone()));
        }
        self.selected = names.to_vec();
        Ok(())
    }

    pub fn set_confirm_policy(&mut self, policy: ConfirmPolicy) {
        self.policy = policy;
    }

    /// Enable drive-letter translation for evaluated paths.
    pub fn set_filename_filter(&mut self, platform: Platform, maps: Vec<DriveMap>) {
        self.platform = platform;
        self.drive_maps = maps;
    }

    /// Messages shown via [`Host::notify`], oldest first.
    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    /// Questions asked via [`Host::confirm`], oldest first.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    fn root_knob(&self, name: &str) -> Option<KnobValue> {
        match name {
            "name" => self.root.name.clone().map(KnobValue::Str),
            "project_directory" => self.root.project_directory.clone().map(KnobValue::Str),
            "first_frame" => Some(KnobValue::Int(self.root.first_frame)),
            "last_frame" => Some(KnobValue::Int(self.root.last_frame)),
            "frame" => Some(KnobValue::Int(self.root.frame)),
            _ => None,
        }
    }

    /// Evaluate TCL-style value references, environment variables and
    /// frame placeholders at the current frame, then apply the filename filter.
    pub fn evaluate_expression(&self, text: &str) -> String {
        let text = VALUE_EXPR.replace_all(text, |caps: &Captures| {
            let value = if &caps[1] == "root" {
                self.root_knob(&caps[2])
            } else {
                self.knob(&caps[1], &caps[2])
            };
            value.map(|v| v.to_string()).unwrap_or_default()
        });

        let text = ENV_VAR.replace_all(&text, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or_default();
            std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
        });

        let frame = self.root.frame;
        let text = HASHES.replace_all(&text, |caps: &Captures| {
            format!("{:0width$}", frame, width = caps[0].len())
        });
        let text = PRINTF.replace_all(&text, |caps: &Captures| {
            let width = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok()).unwrap_or(0);
            format!("{:0width$}", frame, width = width)
        });

        filename_filter(&text, self.platform, &self.drive_maps)
    }

    fn next_name(&self, class: &str) -> String {
        (1..)
            .map(|i| format!("{}{}", class, i))
            .find(|name| !self.nodes.contains_key(name))
            .unwrap_or_else(|| class.to_string())
    }
}

impl Host for Session {
    fn selected_items(&self) -> Vec<ItemId> {
        self.selected.clone()
    }

    fn knob(&self, item: &str, name: &str) -> Option<KnobValue> {
        self.nodes.get(item)?.knobs.get(name).cloned()
    }

    fn evaluate(&self, item: &str, name: &str) -> Option<String> {
        let raw = self.knob(item, name)?;
        Some(self.evaluate_expression(&raw.to_string()))
    }

    fn set_knob(&mut self, item: &str, name: &str, value: KnobValue) -> bool {
        match self.nodes.get_mut(item).and_then(|n| n.knobs.get_mut(name)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn create_item(&mut self, class: &str) -> ItemId {
        let name = self.next_name(class);
        let mut node = SceneNode::new(&name, class);
        node.knobs = default_knobs(class);
        debug!("Created node {}", name);
        self.add_node(node);
        name
    }

    fn item_class(&self, item: &str) -> Option<String> {
        self.nodes.get(item).map(|n| n.class.clone())
    }

    fn position(&self, item: &str) -> Option<Position> {
        self.nodes.get(item).map(|n| Position {
            x: n.xpos,
            y: n.ypos,
            height: n.height,
        })
    }

    fn set_position(&mut self, item: &str, x: i64, y: i64) {
        if let Some(node) = self.nodes.get_mut(item) {
            node.xpos = x;
            node.ypos = y;
        }
    }

    fn upstream_range(&self, item: &str) -> FrameRange {
        let mut visited = HashSet::new();
        let mut current = self.nodes.get(item).and_then(|n| n.input.clone());

        while let Some(name) = current {
            if !visited.insert(name.clone()) {
                break;
            }
            let Some(node) = self.nodes.get(&name) else {
                break;
            };
            let first = node.knobs.get(KNOB_FIRST).and_then(|v| v.as_i64());
            let last = node.knobs.get(KNOB_LAST).and_then(|v| v.as_i64());
            if let (Some(first), Some(last)) = (first, last) {
                return FrameRange::new(first, last);
            }
            current = node.input.clone();
        }

        FrameRange::new(self.root.first_frame, self.root.last_frame)
    }

    fn project_root(&self) -> Option<String> {
        let dir = self.root.project_directory.as_deref()?;
        if dir.trim().is_empty() {
            return None;
        }
        Some(self.evaluate_expression(dir))
    }

    fn script_name(&self) -> Option<String> {
        self.root.name.clone().filter(|n| !n.is_empty())
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.prompts.push(message.to_string());
        let answer = match self.policy {
            ConfirmPolicy::Yes => true,
            ConfirmPolicy::No => false,
            ConfirmPolicy::Interactive => {
                let mut stderr = std::io::stderr();
                let _ = write!(stderr, "{} [y/N] ", message);
                let _ = stderr.flush();
                let mut line = String::new();
                match std::io::stdin().lock().read_line(&mut line) {
                    Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
                    Err(_) => false,
                }
            }
        };
        debug!("confirm: {:?} -> {}", message, answer);
        answer
    }

    fn notify(&mut self, message: &str) {
        info!("{}", message);
        self.notifications.push(message.to_string());
    }
}
