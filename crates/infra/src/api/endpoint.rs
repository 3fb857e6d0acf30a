//! Declarative endpoint descriptors
//!
//! An [`Endpoint`] describes one logical request: path, method, extra
//! headers, parameters, and how those parameters are encoded. Descriptors
//! are stateless values; credentials are attached by the executor, never
//! here.

use reqwest::Method;
use serde_json::{Map, Value};

/// How request parameters are serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamEncoding {
    /// Parameters become URL query items
    Query,
    /// Parameters become the JSON request body
    JsonBody,
}

impl ParamEncoding {
    /// Default encoding for a method
    ///
    /// Read methods encode into the query string, write methods into the
    /// body.
    #[must_use]
    pub fn default_for(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::DELETE {
            Self::Query
        } else {
            Self::JsonBody
        }
    }
}

/// Immutable description of one logical API request
#[derive(Debug, Clone)]
pub struct Endpoint {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    params: Option<Map<String, Value>>,
    encoding: ParamEncoding,
}

impl Endpoint {
    /// Create a descriptor with the method's default parameter encoding
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let encoding = ParamEncoding::default_for(&method);
        Self { method, path: path.into(), headers: Vec::new(), params: None, encoding }
    }

    /// GET descriptor
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST descriptor
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT descriptor
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE descriptor
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach request parameters
    ///
    /// # Panics
    /// Panics when `params` is not a JSON object. A descriptor with
    /// non-object parameters is a construction-time programmer error, not
    /// a runtime condition.
    #[must_use]
    pub fn params(mut self, params: Value) -> Self {
        match params {
            Value::Object(map) => {
                self.params = Some(map);
                self
            }
            other => panic!("endpoint parameters must be a JSON object, got: {other}"),
        }
    }

    /// Add a header beyond the standard set
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Override the method-derived parameter encoding
    #[must_use]
    pub fn encoding(mut self, encoding: ParamEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// HTTP method of this endpoint
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the API base URL
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Extra headers beyond the standard set
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Effective parameter encoding
    #[must_use]
    pub fn param_encoding(&self) -> ParamEncoding {
        self.encoding
    }

    /// Parameters as a JSON body, when present
    pub(crate) fn body_params(&self) -> Option<&Map<String, Value>> {
        self.params.as_ref()
    }

    /// Parameters rendered as query pairs
    ///
    /// Scalar values render as their plain string form; compound values
    /// fall back to their JSON text.
    pub(crate) fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .flat_map(|map| map.iter())
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }
}
