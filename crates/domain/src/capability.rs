use serde::{Deserialize, Serialize};

/// A single capability a model or provider may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Chat,
    Streaming,
    Tools,
    Vision,
    Completion,
}

/// A finite subset of [`Capability`], stored as a JSON array column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilitySet(pub Vec<Capability>);

impl CapabilitySet {
    pub fn has(&self, cap: Capability) -> bool {
        self.0.contains(&cap)
    }
}
