use super::models::{ArrayValue, Document, MapValue, Value, ValueType};
use super::query::ExecutableQuery;
use super::snapshot::DocumentSnapshot;
use super::FirestoreError;
use crate::core::{parse_error_response, FirebaseErrorResponse};
use reqwest::{header, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use serde::de::Error;
use serde::ser::Error as SerError;
use serde::Serialize;
use serde_json::map::Map;
use serde_json::Value as SerdeValue;
use std::collections::HashMap;

// Firestore's typed value map -> plain serde_json::Value
pub(crate) fn convert_fields_to_serde_value(
    fields: HashMap<String, Value>,
) -> Result<SerdeValue, FirestoreError> {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key, convert_value_to_serde_value(value)?);
    }
    Ok(SerdeValue::Object(map))
}

fn convert_value_to_serde_value(value: Value) -> Result<SerdeValue, FirestoreError> {
    use serde_json::json;
    Ok(match value.value_type {
        ValueType::StringValue(s) => SerdeValue::String(s),
        ValueType::IntegerValue(s) => {
            let i: i64 = s.parse().map_err(|e| {
                <serde_json::Error as Error>::custom(format!(
                    "Failed to parse integer string '{}': {}",
                    s, e
                ))
            })?;
            SerdeValue::Number(i.into())
        }
        ValueType::DoubleValue(d) => SerdeValue::Number(
            serde_json::Number::from_f64(d).ok_or_else(|| {
                <serde_json::Error as Error>::custom(format!("Invalid f64 value: {}", d))
            })?,
        ),
        ValueType::BooleanValue(b) => SerdeValue::Bool(b),
        ValueType::MapValue(map_value) => convert_fields_to_serde_value(map_value.fields)?,
        ValueType::ArrayValue(array_value) => {
            let values = array_value
                .values
                .into_iter()
                .map(convert_value_to_serde_value)
                .collect::<Result<Vec<_>, _>>()?;
            SerdeValue::Array(values)
        }
        ValueType::NullValue(_) => SerdeValue::Null,
        ValueType::TimestampValue(s) => SerdeValue::String(s),
        ValueType::GeoPointValue(gp) => {
            json!({ "latitude": gp.latitude, "longitude": gp.longitude })
        }
        ValueType::BytesValue(s) => SerdeValue::String(s),
        ValueType::ReferenceValue(s) => SerdeValue::String(s),
    })
}

// Serializable Rust struct -> Firestore's typed value map
fn convert_serializable_to_fields<T: Serialize>(
    value: &T,
) -> Result<HashMap<String, Value>, FirestoreError> {
    if let SerdeValue::Object(map) = serde_json::to_value(value)? {
        let mut fields = HashMap::new();
        for (k, v) in map {
            fields.insert(k, convert_serde_value_to_firestore_value(v)?);
        }
        Ok(fields)
    } else {
        Err(FirestoreError::SerializationError(SerError::custom(
            "Can only set objects as documents",
        )))
    }
}

pub(crate) fn convert_serde_value_to_firestore_value(
    value: SerdeValue,
) -> Result<Value, FirestoreError> {
    let value_type = match value {
        SerdeValue::Null => ValueType::NullValue(()),
        SerdeValue::Bool(b) => ValueType::BooleanValue(b),
        SerdeValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                ValueType::IntegerValue(i.to_string())
            } else if let Some(f) = n.as_f64() {
                ValueType::DoubleValue(f)
            } else {
                return Err(FirestoreError::SerializationError(SerError::custom(format!(
                    "Unsupported number type: {}",
                    n
                ))));
            }
        }
        SerdeValue::String(s) => ValueType::StringValue(s),
        SerdeValue::Array(a) => {
            let values = a
                .into_iter()
                .map(convert_serde_value_to_firestore_value)
                .collect::<Result<Vec<_>, _>>()?;
            ValueType::ArrayValue(ArrayValue { values })
        }
        SerdeValue::Object(o) => {
            let mut fields = HashMap::new();
            for (k, v) in o {
                fields.insert(k, convert_serde_value_to_firestore_value(v)?);
            }
            ValueType::MapValue(MapValue { fields })
        }
    };
    Ok(Value { value_type })
}

#[derive(Clone)]
pub struct DocumentReference<'a> {
    pub(crate) client: &'a ClientWithMiddleware,
    pub(crate) path: String,
}

impl<'a> DocumentReference<'a> {
    /// The last path segment.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Reads the document. A missing document is a snapshot whose
    /// `data()` is `None`, not an error.
    pub async fn get(&self) -> Result<DocumentSnapshot, FirestoreError> {
        let response = self.client.get(&self.path).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DocumentSnapshot::missing(self.id()));
        }

        if !response.status().is_success() {
            return Err(FirestoreError::ApiError(
                parse_error_response(response, "Get document failed").await,
            ));
        }

        let doc: Document = response.json().await?;
        Ok(DocumentSnapshot::from_document(doc))
    }

    /// Creates the document, failing with `AlreadyExists` if it is present.
    ///
    /// The existence check is a write precondition, so concurrent creates
    /// cannot overwrite each other.
    pub async fn create<T: Serialize>(&self, value: &T) -> Result<(), FirestoreError> {
        let fields = convert_serializable_to_fields(value)?;
        let body = serde_json::to_vec(&serde_json::json!({ "fields": fields }))?;

        let response = self
            .client
            .patch(&self.path)
            .query(&[("currentDocument.exists", "false")])
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let details = serde_json::from_str::<FirebaseErrorResponse>(&text).ok();
        let precondition_failed = details.as_ref().is_some_and(|e| {
            matches!(
                e.error.status.as_deref(),
                Some("ALREADY_EXISTS" | "FAILED_PRECONDITION")
            )
        });

        if status == StatusCode::CONFLICT || precondition_failed {
            return Err(FirestoreError::AlreadyExists(self.id().to_string()));
        }

        Err(FirestoreError::ApiError(match details {
            Some(e) => e.display_message(),
            None => format!("Create document failed: {}", status),
        }))
    }
}

/// Whether `id` names exactly one document under a collection: non-empty,
/// not `.`/`..`, no reserved `__name__` form, and nothing that would change
/// the request path or query.
pub fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 1500
        && id != "."
        && id != ".."
        && !(id.starts_with("__") && id.ends_with("__"))
        && !id.contains(['/', '\\', '?', '#', '%'])
}

#[derive(Clone)]
pub struct CollectionReference<'a> {
    pub(crate) client: &'a ClientWithMiddleware,
    /// The documents root the collection lives under.
    pub(crate) parent: String,
    pub(crate) collection_id: String,
}

impl<'a> CollectionReference<'a> {
    pub fn doc(&self, document_id: &str) -> Result<DocumentReference<'a>, FirestoreError> {
        if !is_valid_document_id(document_id) {
            return Err(FirestoreError::InvalidDocumentId(document_id.to_string()));
        }

        Ok(DocumentReference {
            client: self.client,
            path: format!("{}/{}/{}", self.parent, self.collection_id, document_id),
        })
    }

    /// Starts a query over every document in the collection.
    pub fn query(&self) -> ExecutableQuery<'a> {
        ExecutableQuery::new(self.client, self.parent.clone(), &self.collection_id)
    }
}
