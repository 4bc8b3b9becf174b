//! Query envelopes and the single-record vs. bulk decision.
//!
//! ORM callers hand over loosely-shaped JSON. Before any wire request is built
//! that input is parsed into one of a small set of tagged shapes:
//!
//! - [`Target::Single`] / [`Target::Bulk`] for update and destroy,
//! - [`AssociationTarget`] for association mutations.
//!
//! Route construction in [`crate::routes`] only ever sees the parsed shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ContractError, RecordId};

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// One entry of a join plan produced by the ORM's query planner.
///
/// Only `alias` is used here; the rest is carried for completeness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinInstruction {
    pub alias: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JoinInstruction {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            extra: Map::new(),
        }
    }
}

/// Query criteria as sent by the ORM.
///
/// Unknown keys are kept in `extra` and forwarded to the server untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,

    /// Usually a string such as `"name ASC"`, but object forms are passed on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub populate: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joins: Option<Vec<JoinInstruction>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Criteria {
    /// Criteria addressing one key directly (`{id: ...}`).
    pub fn by_id(id: impl Into<Value>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Criteria with only a `where` clause.
    pub fn matching(where_clause: Value) -> Self {
        Self {
            where_clause: Some(where_clause),
            ..Self::default()
        }
    }

    /// Renders the criteria as a JSON object payload.
    pub fn to_payload(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(value @ Value::Object(_)) => value,
            // Criteria always serialises to an object; anything else means an
            // unrepresentable float slipped into `extra`.
            _ => Value::Object(Map::new()),
        }
    }

    /// Replaces a join plan by the equivalent `populate` list.
    ///
    /// The server performs the join; only the aliases travel, and they
    /// replace any `populate` list already present. Criteria without a join
    /// plan are returned unchanged.
    pub fn into_populate(mut self) -> Self {
        if let Some(joins) = self.joins.take() {
            self.populate = Some(joins.into_iter().map(|join| join.alias).collect());
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Single vs. bulk
// ---------------------------------------------------------------------------

/// Resolves the key of the single record an operation addresses.
///
/// Candidates are tried in order: `criteria.id`, `criteria.where.id`, then
/// `values.id` when `values` is a single record (not a list). `null` counts as
/// absent. The first present candidate decides: a scalar is the key, while an
/// object or array (`{in: [1, 2]}`, `[1, 2]`) means the operation is bulk and
/// `None` is returned.
pub fn extract_id(criteria: &Criteria, values: Option<&Value>) -> Option<RecordId> {
    let from_where = criteria
        .where_clause
        .as_ref()
        .and_then(|clause| clause.get("id"));
    let from_values = values
        .filter(|v| v.is_object())
        .and_then(|v| v.get("id"));

    let candidate = [criteria.id.as_ref(), from_where, from_values]
        .into_iter()
        .flatten()
        .find(|v| !v.is_null())?;

    RecordId::from_value(candidate)
}

/// How an update or destroy is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Exactly one record, addressed by key.
    Single(RecordId),
    /// Every record matching the criteria.
    Bulk,
}

impl Target {
    pub fn resolve(criteria: &Criteria, values: Option<&Value>) -> Self {
        match extract_id(criteria, values) {
            Some(id) => Self::Single(id),
            None => Self::Bulk,
        }
    }
}

// ---------------------------------------------------------------------------
// Association commands
// ---------------------------------------------------------------------------

/// Association mutation as sent by the ORM (`addTo` / `removeFrom`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationCommand {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub association: Option<String>,
    #[serde(default)]
    pub foreign_id: Option<Value>,
    #[serde(default)]
    pub foreign_data: Option<Value>,
}

/// What is attached to (or detached from) the association.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignTarget {
    /// An existing record, addressed by key in the path.
    Existing(RecordId),
    /// A record described by data sent as the body.
    Data(Value),
}

/// A validated association mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationTarget {
    pub id: RecordId,
    pub association: String,
    pub foreign: ForeignTarget,
}

impl AssociationTarget {
    /// Validates a command.
    ///
    /// A scalar `foreignId` wins over `foreignData`. A non-scalar `foreignId`
    /// is ignored.
    pub fn parse(command: &AssociationCommand) -> Result<Self, ContractError> {
        let id = command
            .id
            .as_ref()
            .and_then(RecordId::from_value)
            .ok_or(ContractError::MissingRecordId)?;

        let association = command
            .association
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or(ContractError::MissingAssociation)?
            .to_owned();

        let foreign = match (
            command.foreign_id.as_ref().and_then(RecordId::from_value),
            command.foreign_data.as_ref().filter(|v| !v.is_null()),
        ) {
            (Some(foreign_id), _) => ForeignTarget::Existing(foreign_id),
            (None, Some(data)) => ForeignTarget::Data(data.clone()),
            (None, None) => return Err(ContractError::MissingForeignTarget),
        };

        Ok(Self {
            id,
            association,
            foreign,
        })
    }
}
