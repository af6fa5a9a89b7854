use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// The kind of object an extended edit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Board,
    List,
    Card,
}

impl ObjectType {
    /// Upper-case form used in extended block headers
    pub fn header_name(self) -> &'static str {
        match self {
            ObjectType::Board => "BOARD",
            ObjectType::List => "LIST",
            ObjectType::Card => "CARD",
        }
    }

    pub fn from_header_name(s: &str) -> Option<Self> {
        match s {
            "BOARD" => Some(ObjectType::Board),
            "LIST" => Some(ObjectType::List),
            "CARD" => Some(ObjectType::Card),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Board => write!(f, "board"),
            ObjectType::List => write!(f, "list"),
            ObjectType::Card => write!(f, "card"),
        }
    }
}

/// Marker emitted by the reconciler for an object flagged with `!`.
/// Never applied itself; it tells the caller to run the extended editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedTarget {
    pub object: ObjectType,
    pub id: String,
    pub name: String,
}

/// One `# EDITING <TYPE>` block of an extended document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedSection {
    pub object: ObjectType,
    pub id: String,
    pub name: String,
    /// Field name to raw value, comments stripped, in document order.
    /// The description block is stored under `Description`.
    pub fields: IndexMap<String, String>,
}

/// One changed field inside a bulk update, for descriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}
