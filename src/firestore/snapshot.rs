use super::models::Document;
use super::reference::convert_fields_to_serde_value;
use super::FirestoreError;
use serde::de::DeserializeOwned;

/// A snapshot of a document in Firestore.
///
/// The data can be extracted with `.data()`.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub(crate) id: String,
    pub(crate) document: Option<Document>,
}

impl DocumentSnapshot {
    pub(crate) fn missing(id: &str) -> Self {
        Self {
            id: id.to_string(),
            document: None,
        }
    }

    pub(crate) fn from_document(doc: Document) -> Self {
        let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            id,
            document: Some(doc),
        }
    }

    /// The ID of the document.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Retrieves all fields in the document as a specific type.
    ///
    /// Returns `Ok(None)` if the document does not exist.
    pub fn data<T: DeserializeOwned>(&self) -> Result<Option<T>, FirestoreError> {
        match &self.document {
            Some(doc) => {
                let serde_value = convert_fields_to_serde_value(doc.fields.clone())?;
                Ok(Some(serde_json::from_value(serde_value)?))
            }
            None => Ok(None),
        }
    }
}

/// A `QuerySnapshot` contains zero or more `DocumentSnapshot` objects.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub(crate) documents: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    /// The number of documents in the snapshot.
    pub fn size(&self) -> usize {
        self.documents.len()
    }
}

impl<'a> IntoIterator for &'a QuerySnapshot {
    type Item = &'a DocumentSnapshot;
    type IntoIter = std::slice::Iter<'a, DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
