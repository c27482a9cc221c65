use super::models::{
    CollectionSelector, CompositeFilter, CompositeOperator, Direction, FieldFilter,
    FieldOperator, FieldReference, Order, QueryFilter, RunQueryRequest, RunQueryResponse,
    StructuredQuery,
};
use super::reference::convert_serde_value_to_firestore_value;
use super::snapshot::{DocumentSnapshot, QuerySnapshot};
use super::FirestoreError;
use crate::core::parse_error_response;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;

/// A query over one collection, executed with `:runQuery`.
///
/// Filters added with `where_filter` are ANDed together.
#[derive(Clone)]
pub struct ExecutableQuery<'a> {
    client: &'a ClientWithMiddleware,
    parent_path: String,
    query: StructuredQuery,
}

impl<'a> ExecutableQuery<'a> {
    pub(crate) fn new(client: &'a ClientWithMiddleware, parent_path: String, collection_id: &str) -> Self {
        Self {
            client,
            parent_path,
            query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection_id.to_string(),
                }],
                ..Default::default()
            },
        }
    }

    /// Adds a filter to the query.
    pub fn where_filter<T: Serialize>(
        mut self,
        field: &str,
        op: FieldOperator,
        value: T,
    ) -> Result<Self, FirestoreError> {
        let value = convert_serde_value_to_firestore_value(serde_json::to_value(value)?)?;

        let filter = QueryFilter::FieldFilter(FieldFilter {
            field: FieldReference {
                field_path: field.to_string(),
            },
            op,
            value,
        });

        self.query.where_clause = Some(match self.query.where_clause.take() {
            None => filter,
            Some(QueryFilter::CompositeFilter(mut composite)) => {
                composite.filters.push(filter);
                QueryFilter::CompositeFilter(composite)
            }
            Some(existing) => QueryFilter::CompositeFilter(CompositeFilter {
                op: CompositeOperator::And,
                filters: vec![existing, filter],
            }),
        });

        Ok(self)
    }

    /// Sorts the query results by the specified field.
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.query.order_by.push(Order {
            field: FieldReference {
                field_path: field.to_string(),
            },
            direction,
        });
        self
    }

    /// Limits the number of documents returned.
    pub fn limit(mut self, limit: i32) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Executes the query and returns the results as a `QuerySnapshot`.
    pub async fn get(&self) -> Result<QuerySnapshot, FirestoreError> {
        let url = format!("{}:runQuery", self.parent_path);

        let request = RunQueryRequest {
            structured_query: self.query.clone(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirestoreError::ApiError(
                parse_error_response(response, "Run query failed").await,
            ));
        }

        let responses: Vec<RunQueryResponse> = response.json().await?;

        let documents = responses
            .into_iter()
            .filter_map(|res| res.document)
            .map(DocumentSnapshot::from_document)
            .collect();

        Ok(QuerySnapshot { documents })
    }
}
