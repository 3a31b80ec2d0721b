//! Optional knobs copied from source node to reader (colorspace, premult, raw).
//!
//! A knob is copied only if the source has it; it is applied only if the
//! reader has it too. Absence on either side is skipped silently.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::host::{Host, KnobValue};

/// Knob name -> stored value, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeOptions(IndexMap<String, KnobValue>);

impl NodeOptions {
    pub fn get(&self, name: &str) -> Option<&KnobValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &KnobValue)> {
        self.0.iter()
    }
}

/// Read the allowlisted knobs `names` present on `item`.
pub fn collect_options<H: Host + ?Sized>(host: &H, item: &str, names: &[String]) -> NodeOptions {
    NodeOptions(
        names
            .iter()
            .filter_map(|name| host.knob(item, name).map(|v| (name.clone(), v)))
            .collect(),
    )
}

/// Set collected options on `dest`. Returns the names actually applied.
pub fn apply_options<H: Host + ?Sized>(host: &mut H, dest: &str, options: &NodeOptions) -> Vec<String> {
    let mut applied = Vec::new();
    for (name, value) in options.iter() {
        if !host.has_knob(dest, name) {
            debug!("{} has no knob '{}', skipped", dest, name);
            continue;
        }
        if host.set_knob(dest, name, value.clone()) {
            applied.push(name.clone());
        }
    }
    applied
}
