//! Query descriptor and per-page request types

use crate::types::{JsonObject, JsonValue};
use serde::Serialize;
use std::sync::Arc;

/// Variable carrying the page-size bound
pub const FIRST_VARIABLE: &str = "first";

/// Variable carrying the pagination cursor
pub const AFTER_VARIABLE: &str = "after";

/// Immutable (query document, base variables) pair for one pull
///
/// The base variables hold the domain filters (date range, identifiers).
/// Page size and cursor are layered on per request by [`QueryDescriptor::page_variables`]
/// so the descriptor itself never changes while a pull is running.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    document: Arc<str>,
    variables: JsonObject,
}

impl QueryDescriptor {
    /// Create a descriptor with no filters
    pub fn new(document: impl Into<Arc<str>>) -> Self {
        Self {
            document: document.into(),
            variables: JsonObject::new(),
        }
    }

    /// Add a filter variable
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Add several filter variables
    #[must_use]
    pub fn variables(mut self, vars: JsonObject) -> Self {
        self.variables.extend(vars);
        self
    }

    /// The GraphQL document
    pub fn document(&self) -> &str {
        &self.document
    }

    /// The base filter variables
    pub fn base_variables(&self) -> &JsonObject {
        &self.variables
    }

    /// Variables for one page: base filters plus `first` and `after`
    pub fn page_variables(&self, cursor: Option<&str>, page_size: u32) -> JsonObject {
        let mut vars = self.variables.clone();
        vars.insert(FIRST_VARIABLE.to_string(), JsonValue::from(page_size));
        vars.insert(
            AFTER_VARIABLE.to_string(),
            cursor.map_or(JsonValue::Null, JsonValue::from),
        );
        vars
    }
}

/// Everything the fetcher needs for one page
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    /// Pre-formatted `Authorization` header value
    pub credential: &'a str,
    /// Query and base variables
    pub descriptor: &'a QueryDescriptor,
    /// Cursor of the page to fetch (`None` for the first page)
    pub cursor: Option<&'a str>,
    /// Page-size bound, already validated as positive
    pub page_size: u32,
}

/// JSON body sent to the GraphQL endpoint
#[derive(Debug, Serialize)]
pub(crate) struct GraphqlBody<'a> {
    pub query: &'a str,
    pub variables: JsonObject,
}

impl<'a> GraphqlBody<'a> {
    pub fn from_request(request: &PageRequest<'a>) -> Self {
        Self {
            query: request.descriptor.document(),
            variables: request
                .descriptor
                .page_variables(request.cursor, request.page_size),
        }
    }
}
