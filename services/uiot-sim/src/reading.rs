use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Node identifier, cheap to clone across hops.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Arc<str>);

impl NodeId {
    pub fn new(id: impl AsRef<str>) -> Self { Self(Arc::from(id.as_ref())) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self { Self(Arc::from(s)) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Normal,
    Emergency,
}

impl Classification {
    /// Strictly above the threshold is an emergency; equal stays normal.
    pub fn classify(value: f64, threshold: f64) -> Self {
        if value > threshold { Classification::Emergency } else { Classification::Normal }
    }
}

/// One sensor sample. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: u64,
    pub source: NodeId,
    pub value: f64,
    pub classification: Classification,
}

impl Reading {
    pub fn new(timestamp: u64, source: NodeId, value: f64, threshold: f64) -> Self {
        Self { timestamp, source, value, classification: Classification::classify(value, threshold) }
    }

    pub fn is_emergency(&self) -> bool { self.classification == Classification::Emergency }
}

/// Full RelayBuffer snapshot handed from the fog tier to the collector.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Batch(Vec<Reading>);

impl Batch {
    pub fn new(readings: Vec<Reading>) -> Self { Self(readings) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn readings(&self) -> &[Reading] { &self.0 }
    pub fn into_readings(self) -> Vec<Reading> { self.0 }
}
