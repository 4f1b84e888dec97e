use crate::prelude::*;

use serde::Serialize;

pub mod builder;

pub use builder::{Section, SnapshotBuilder};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Control {
    Switch {
        label_off: String,
        label_on: String,
        on: bool,
    },
    Slider {
        label_start: String,
        label_end: String,
        range_start: f32,
        range_end: f32,
        value: f32,
    },
    Button {
        label: String,
        label_pressed: String,
        grace_period: u64,
    },
    Numeric {
        value: String,
    },
}

impl Control {
    pub fn switch(label_off: &str, label_on: &str, on: bool) -> Self {
        Control::Switch {
            label_off: label_off.to_string(),
            label_on: label_on.to_string(),
            on,
        }
    }

    /// A slider labelled with its own bounds.
    pub fn slider(range_start: f32, range_end: f32, value: f32) -> Self {
        Control::Slider {
            label_start: range_start.to_string(),
            label_end: range_end.to_string(),
            range_start,
            range_end,
            value,
        }
    }

    /// Validates `value` for this control and stores it.
    pub fn apply(&mut self, value: &str) -> std::result::Result<(), String> {
        match self {
            Control::Switch { on, .. } => {
                *on = parse_switch(value)?;
            }
            Control::Slider {
                range_start,
                range_end,
                value: current,
                ..
            } => {
                let level = parse_slider(value, *range_start, *range_end)?;
                *current = level;
            }
            Control::Numeric { value: current } => {
                *current = value.to_string();
            }
            Control::Button { .. } => {}
        }
        Ok(())
    }
}

pub fn parse_switch(value: &str) -> std::result::Result<bool, String> {
    match value.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(format!("switch expects 0 or 1, got {:?}", other)),
    }
}

pub fn parse_slider(value: &str, start: f32, end: f32) -> std::result::Result<f32, String> {
    let level: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("{:?} is not a number", value))?;
    if !(start..=end).contains(&level) {
        return Err(format!("{} is outside [{}, {}]", level, start, end));
    }
    Ok(level)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllableElement {
    pub name: String,
    #[serde(flatten)]
    pub control: Control,
}

impl ControllableElement {
    pub fn new(name: impl Into<String>, control: Control) -> Self {
        Self {
            name: name.into(),
            control,
        }
    }
}

/// Properties and controls exposed to the caller after one poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub properties: BTreeMap<String, String>,
    pub controls: Vec<ControllableElement>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.controls.is_empty()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn control(&self, name: &str) -> Option<&ControllableElement> {
        self.controls.iter().find(|c| c.name == name)
    }

    pub fn control_mut(&mut self, name: &str) -> Option<&mut ControllableElement> {
        self.controls.iter_mut().find(|c| c.name == name)
    }

    /// Adds a control, replacing any existing one with the same name.
    pub fn upsert_control(&mut self, element: ControllableElement) {
        match self.control_mut(&element.name) {
            Some(existing) => *existing = element,
            None => self.controls.push(element),
        }
    }

    pub fn remove_control(&mut self, name: &str) {
        self.controls.retain(|c| c.name != name);
    }

    /// Property and control state after a successful write of `value` to `key`.
    pub fn patch(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        if let Some(element) = self.control_mut(key) {
            element.control.apply(value)?;
        }
        self.set_property(key, value);
        Ok(())
    }

    /// Replaces one section with `fresh`, keeping the entries of `self` for
    /// which `keep` holds.
    pub fn merge(&self, fresh: Snapshot, keep: impl Fn(&str) -> bool) -> Snapshot {
        let mut merged = fresh;

        for (key, value) in self.properties.iter().filter(|(k, _)| keep(k.as_str())) {
            merged.properties.insert(key.clone(), value.clone());
        }
        for element in self.controls.iter().filter(|c| keep(c.name.as_str())) {
            merged.upsert_control(element.clone());
        }

        merged
    }
}
