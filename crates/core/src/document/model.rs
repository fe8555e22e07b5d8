use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name of the store-generated document id.
pub const ID_FIELD: &str = "_id";
/// Field name of the first-insertion timestamp.
pub const CREATED_AT_FIELD: &str = "created_at";
/// Field name of the last-write timestamp.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Keys owned by the store. Callers cannot write them.
pub const RESERVED_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// Arbitrary document fields, keyed by field name.
pub type Fields = Map<String, Value>;

/// Exact-match selector: every entry must equal the document's field.
pub type Filter = Map<String, Value>;

/// A schema-flexible record as returned by every store read or write.
///
/// Serializes flat: `{"_id": "...", "created_at": ..., "updated_at": ..., ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    /// Look up a business field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Deserialize the business fields into a typed record.
    /// The id and timestamps are not part of the record.
    pub fn into_record<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields))
    }
}

/// Drop the reserved keys from caller-provided fields.
pub fn strip_reserved(mut fields: Fields) -> Fields {
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }
    fields
}

/// Current UTC time at the precision the database keeps (microseconds),
/// so a timestamp returned by a write equals the one read back later.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Parameters of a list query. All parts are optional.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Option<Filter>,
    /// `None` and `Some(0)` both mean "no limit".
    pub limit: Option<u64>,
    pub sort: Option<Vec<(String, SortDirection)>>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort
            .get_or_insert_with(Vec::new)
            .push((field.into(), direction));
        self
    }

    /// The effective row cap, with zero folded into "unlimited".
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|&n| n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_serializes_flat() {
        let ts = now();
        let mut fields = Fields::new();
        fields.insert("name".into(), json!("A"));
        let doc = Document {
            id: "abc".into(),
            created_at: ts,
            updated_at: ts,
            fields,
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], "abc");
        assert_eq!(value["name"], "A");
        assert!(value.get("fields").is_none());
        assert_eq!(value["created_at"], value["updated_at"]);
    }

    #[test]
    fn strip_reserved_keeps_business_fields() {
        let fields = json!({"_id": "x", "created_at": 1, "updated_at": 2, "title": "T"});
        let Value::Object(map) = fields else { unreachable!() };
        let stripped = strip_reserved(map);
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped["title"], "T");
    }

    #[test]
    fn zero_limit_means_unlimited() {
        assert_eq!(ListQuery::new().limit(0).effective_limit(), None);
        assert_eq!(ListQuery::new().effective_limit(), None);
        assert_eq!(ListQuery::new().limit(3).effective_limit(), Some(3));
    }

    #[test]
    fn sort_by_accumulates_in_order() {
        let query = ListQuery::new()
            .sort_by("title", SortDirection::Ascending)
            .sort_by("price", SortDirection::Descending);
        let sort = query.sort.unwrap();
        assert_eq!(sort[0].0, "title");
        assert_eq!(sort[1], ("price".to_string(), SortDirection::Descending));
    }
}
