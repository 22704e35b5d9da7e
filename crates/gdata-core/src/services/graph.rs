//! Graph metadata queries answered with a JSON result envelope.

use serde_json::{Map, Value, json};
use url::Url;

use crate::error::ParseError;
use crate::parsable::{JsonParsable, json_object, json_str};

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Mql(Value),
    Raw(String),
}

/// A read query against a metadata graph.
///
/// An MQL object is a single query and an MQL array a batch; a raw string is
/// passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    body: Body,
    limit: Option<u32>,
    cursor: Option<String>,
}

impl GraphQuery {
    /// Query with an MQL document.
    pub fn mql(query: Value) -> Self {
        Self {
            body: Body::Mql(query),
            limit: None,
            cursor: None,
        }
    }

    /// Query with a raw query string.
    pub fn raw(query: impl Into<String>) -> Self {
        Self {
            body: Body::Raw(query.into()),
            limit: None,
            cursor: None,
        }
    }

    /// Maximum results, injected as `limit` into single (object) queries.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Continue from the cursor of a previous result.
    pub fn set_cursor(&mut self, cursor: Option<String>) {
        self.cursor = cursor;
    }

    pub fn is_batch(&self) -> bool {
        matches!(self.body, Body::Mql(Value::Array(_)))
    }

    /// The `query` parameter value.
    pub fn query_text(&self) -> String {
        match &self.body {
            Body::Raw(q) => q.clone(),
            Body::Mql(value) => {
                let mut value = value.clone();
                if let (Some(limit), Value::Object(object)) = (self.limit, &mut value) {
                    object.insert("limit".to_string(), json!(limit));
                }
                value.to_string()
            }
        }
    }

    /// `endpoint` with the query parameters appended.
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", &self.query_text());
            if let Some(cursor) = &self.cursor {
                pairs.append_pair("cursor", cursor);
            }
        }
        url
    }

    /// Carry the cursor of `result` forward. Returns false when there are no
    /// further results.
    pub fn advance(&mut self, result: &GraphResult) -> bool {
        match result.cursor() {
            Some(cursor) => {
                self.cursor = Some(cursor.to_string());
                true
            }
            None => false,
        }
    }
}

/// The `{"result": ..., "cursor": ...}` envelope of a graph query response.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphResult {
    result: Value,
    cursor: Option<String>,
    extra: Map<String, Value>,
}

impl GraphResult {
    /// The result document: an object for single queries, an array for batches.
    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn into_result(self) -> Value {
        self.result
    }

    /// Cursor for the next page; absent (or `false` on the wire) at the end.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

impl JsonParsable for GraphResult {
    fn from_json(value: &Value) -> Result<Self, ParseError> {
        let object = json_object(value, "response")?;
        let result = object
            .get("result")
            .cloned()
            .ok_or_else(|| ParseError::missing("response", "result"))?;
        let cursor = match object.get("cursor") {
            Some(Value::Bool(false)) => None,
            _ => json_str(object, "response", "cursor")?.map(str::to_string),
        };
        let extra = object
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "result" | "cursor"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            result,
            cursor,
            extra,
        })
    }

    fn to_json(&self) -> Value {
        let mut object = self.extra.clone();
        object.insert("result".to_string(), self.result.clone());
        if let Some(cursor) = &self.cursor {
            object.insert("cursor".to_string(), Value::String(cursor.clone()));
        }
        Value::Object(object)
    }
}
