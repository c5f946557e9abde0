//! Response Assembler
//!
//! Success: a JSON array of `{destination_id, weight}` ordered by ascending
//! destination id. Failure: `{error, message, field?, constraint?}`.

use hexconn_storage::IdKind;
use serde::Serialize;

use crate::errors::ConnectivityError;
use crate::normalization::NormalizedEdge;

/// Destination identifier as the store declares it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RenderedId {
    Numeric(i64),
    Text(String),
}

/// One entry of the success payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationWeight {
    pub destination_id: RenderedId,
    pub weight: f64,
}

/// Success payload; serializes as a bare array
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConnectivityPayload(pub Vec<DestinationWeight>);

impl ConnectivityPayload {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[DestinationWeight] {
        &self.0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Build the success payload, one entry per destination
pub fn assemble(normalized: &[NormalizedEdge], id_kind: IdKind) -> ConnectivityPayload {
    let mut sorted = normalized.to_vec();
    sorted.sort_by_key(|e| e.destination_id);

    ConnectivityPayload(
        sorted
            .into_iter()
            .map(|e| DestinationWeight {
                destination_id: match id_kind {
                    IdKind::Numeric => RenderedId::Numeric(e.destination_id.get()),
                    IdKind::Text => RenderedId::Text(e.destination_id.to_string()),
                },
                weight: e.weight,
            })
            .collect(),
    )
}

/// Failure body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<&'static str>,
}

impl ErrorBody {
    pub fn from_error(err: &ConnectivityError) -> Self {
        let (field, constraint) = match err {
            ConnectivityError::Validation(v) => {
                (Some(v.field.as_str()), Some(v.violation.constraint()))
            }
            _ => (None, None),
        };

        Self {
            error: err.kind().as_str(),
            message: err.to_string(),
            field,
            constraint,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
