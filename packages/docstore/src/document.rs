use serde::Serialize;

use crate::collection::ID_FIELD;
use crate::value::{FieldValue, Fields};

/// A stored document together with its id.
///
/// Stored fields never contain the id; it is carried alongside and merged in on output under
/// [`ID_FIELD`], which is also how the struct serializes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Fields with the id merged in under [`ID_FIELD`].
    pub fn into_record(self) -> Fields {
        let mut fields = self.fields;
        fields.insert(ID_FIELD.to_string(), FieldValue::String(self.id));
        fields
    }
}
