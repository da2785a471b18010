//! Identifiers and records shared by every pipeline stage.

use std::{borrow::Borrow, fmt, str::FromStr};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Separator between a negative id and its side tag.
pub const SIDE_SEPARATOR: char = '$';
/// Separator between consecutive negative samples in a stored row.
pub const NEGATIVE_SEPARATOR: char = '_';

/// Opaque drug identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(String);

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Entity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Entity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Entity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Integer interaction label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relation(pub i64);

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One observed positive interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triplet {
    pub head: Entity,
    pub tail: Entity,
    pub relation: Relation,
}

impl Triplet {
    pub fn new(head: impl Into<Entity>, tail: impl Into<Entity>, relation: i64) -> Self {
        Self {
            head: head.into(),
            tail: tail.into(),
            relation: Relation(relation),
        }
    }
}

/// Endpoint replaced by a corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Head,
    Tail,
}

impl Side {
    pub fn tag(self) -> char {
        match self {
            Self::Head => 'h',
            Self::Tail => 't',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Tail => f.write_str("tail"),
        }
    }
}

/// A corrupted entity together with the endpoint it replaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NegativeEntity {
    pub entity: Entity,
    pub side: Side,
}

impl NegativeEntity {
    pub fn new(entity: Entity, side: Side) -> Self {
        Self { entity, side }
    }
}

impl fmt::Display for NegativeEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.entity, SIDE_SEPARATOR, self.side.tag())
    }
}

impl FromStr for NegativeEntity {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        let (id, tag) = s
            .rsplit_once(SIDE_SEPARATOR)
            .ok_or_else(|| PrepError::InvalidInput(format!("negative sample {s:?} has no side tag")))?;
        let side = match tag {
            "h" => Side::Head,
            "t" => Side::Tail,
            other => {
                return Err(PrepError::InvalidInput(format!(
                    "negative sample {s:?} has unknown side tag {other:?}"
                )))
            }
        };
        if id.is_empty() {
            return Err(PrepError::InvalidInput(format!(
                "negative sample {s:?} has an empty id"
            )));
        }
        Ok(Self::new(Entity::new(id), side))
    }
}

/// Join negatives into the stored `<id>$h_<id>$t` form.
pub fn encode_negatives(negatives: &[NegativeEntity]) -> String {
    negatives
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&NEGATIVE_SEPARATOR.to_string())
}

/// Parse the stored negative-sample cell back into structured values.
pub fn decode_negatives(cell: &str) -> Result<Vec<NegativeEntity>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    cell.split(NEGATIVE_SEPARATOR).map(str::parse).collect()
}

/// Every drug eligible as a corruption candidate, in a stable order.
#[derive(Debug, Clone, Default)]
pub struct EntityUniverse {
    entities: IndexSet<Entity>,
}

impl EntityUniverse {
    /// Build the universe, rejecting ids that would not survive the stored row encoding.
    pub fn new<I>(ids: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Entity>,
    {
        let mut entities = IndexSet::new();
        for id in ids {
            let entity: Entity = id.into();
            let raw = entity.as_str();
            if raw.is_empty() {
                return Err(PrepError::InvalidInput("empty drug id in universe".into()));
            }
            if raw.contains(SIDE_SEPARATOR) || raw.contains(NEGATIVE_SEPARATOR) {
                return Err(PrepError::InvalidInput(format!(
                    "drug id {raw:?} contains a reserved separator"
                )));
            }
            entities.insert(entity);
        }
        Ok(Self { entities })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.entities.contains(entity)
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get_index(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}
