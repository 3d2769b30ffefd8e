use serde_json::{Map, Value};

/// Reserved record key carrying the document identifier.
pub const ID_FIELD: &str = "id";

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Flattens the document into its fields plus the identifier under
    /// [`ID_FIELD`]. A stored `id` field is shadowed by the real identifier.
    pub fn into_record(self) -> Fields {
        let mut record = self.fields;
        record.insert(ID_FIELD.to_string(), Value::String(self.id));
        record
    }
}
