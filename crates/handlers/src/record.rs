//! Node and edge records.
//!
//! The engine only ever needs identity, a type tag and an opaque extras blob,
//! so it talks to records through [`NodeRecord`] / [`EdgeRecord`]. [`Node`]
//! and [`Edge`] are the concrete records used by JSON process definitions.

use std::borrow::Borrow;
use std::fmt;

use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// What the engine needs from a workflow step.
pub trait NodeRecord: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    /// Tag selecting the on/before/after handlers.
    fn node_type(&self) -> &str;
    fn extras(&self) -> &[u8];
}

/// What the engine needs from a possible transition.
pub trait EdgeRecord: Send + Sync {
    fn id(&self) -> &str;
    fn src_id(&self) -> &str;
    fn dst_id(&self) -> &str;
    /// Tag selecting the decision handler.
    fn edge_type(&self) -> &str;
    /// Lower values are evaluated first.
    fn priority(&self) -> i64;
    fn extras(&self) -> &[u8];
}

// ---------------------------------------------------------------------------
// Type tags
// ---------------------------------------------------------------------------

macro_rules! type_tag {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(tag: impl Into<String>) -> Self {
                Self(tag.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(tag: &str) -> Self {
                Self(tag.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(tag: String) -> Self {
                Self(tag)
            }
        }
    };
}

type_tag!(
    /// Node type tag, e.g. `leave_request`.
    NodeType
);

type_tag!(
    /// Edge type tag, e.g. `approval`.
    EdgeType
);

// ---------------------------------------------------------------------------
// Extras
// ---------------------------------------------------------------------------

/// Opaque per-node / per-edge configuration.
///
/// The engine never looks inside. In JSON definitions the blob is the raw
/// text of whatever value sits in the extras field, byte for byte; `null` or
/// a missing field is the empty blob. Only blobs holding JSON text can be
/// written back out as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extras(Vec<u8>);

impl Extras {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Extras {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for Extras {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            return serializer.serialize_none();
        }
        let raw = std::str::from_utf8(&self.0)
            .ok()
            .and_then(|text| RawValue::from_string(text.to_owned()).ok())
            .ok_or_else(|| S::Error::custom("extras do not hold JSON text"))?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Extras {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        match raw.get() {
            "null" => Ok(Self::default()),
            text => Ok(Self(text.as_bytes().to_vec())),
        }
    }
}

// ---------------------------------------------------------------------------
// Concrete records
// ---------------------------------------------------------------------------

/// A workflow step as stored in a process definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "nodeType")]
    pub node_type: NodeType,
    #[serde(rename = "node_extras", default)]
    pub extras: Extras,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: impl Into<NodeType>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            extras: Extras::default(),
        }
    }

    pub fn with_extras(mut self, extras: impl Into<Extras>) -> Self {
        self.extras = extras.into();
        self
    }
}

impl NodeRecord for Node {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn node_type(&self) -> &str {
        self.node_type.as_str()
    }

    fn extras(&self) -> &[u8] {
        self.extras.as_bytes()
    }
}

/// A typed, prioritized transition between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    #[serde(rename = "srcId")]
    pub src_id: String,
    #[serde(rename = "dstId")]
    pub dst_id: String,
    #[serde(rename = "line_type")]
    pub edge_type: EdgeType,
    #[serde(default)]
    pub priority: i64,
    #[serde(rename = "line_extras", default)]
    pub extras: Extras,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        src_id: impl Into<String>,
        dst_id: impl Into<String>,
        edge_type: impl Into<EdgeType>,
        priority: i64,
    ) -> Self {
        Self {
            id: id.into(),
            src_id: src_id.into(),
            dst_id: dst_id.into(),
            edge_type: edge_type.into(),
            priority,
            extras: Extras::default(),
        }
    }

    pub fn with_extras(mut self, extras: impl Into<Extras>) -> Self {
        self.extras = extras.into();
        self
    }
}

impl EdgeRecord for Edge {
    fn id(&self) -> &str {
        &self.id
    }

    fn src_id(&self) -> &str {
        &self.src_id
    }

    fn dst_id(&self) -> &str {
        &self.dst_id
    }

    fn edge_type(&self) -> &str {
        self.edge_type.as_str()
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn extras(&self) -> &[u8] {
        self.extras.as_bytes()
    }
}
