//! Dimension code lists.

use census_core::Error;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct CodelistDocument {
    structure: Structure,
}

#[derive(Debug, Deserialize)]
struct Structure {
    codelists: Codelists,
}

#[derive(Debug, Deserialize)]
struct Codelists {
    #[serde(default)]
    codelist: Vec<RawCodelist>,
}

#[derive(Debug, Deserialize)]
struct RawCodelist {
    #[serde(default)]
    code: Vec<RawCode>,
}

#[derive(Debug, Deserialize)]
struct RawCode {
    value: Value,
    #[serde(default)]
    description: Option<Description>,
}

#[derive(Debug, Deserialize)]
struct Description {
    value: String,
}

/// One enumerated value of a dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub value: String,
    pub description: Option<String>,
}

/// The codes of one dimension, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeList(pub Vec<Code>);

impl CodeList {
    /// Parse a code definition document; the first code list in it is used.
    pub fn parse(body: &str) -> Result<Self, Error> {
        let document: CodelistDocument =
            serde_json::from_str(body).map_err(|e| Error::InvalidResponse(format!("code list: {e}")))?;
        let first = document
            .structure
            .codelists
            .codelist
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("code list document has no code lists".into()))?;

        first
            .code
            .into_iter()
            .map(|code| {
                let value = match code.value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    other => return Err(Error::InvalidResponse(format!("unexpected code value {other}"))),
                };
                Ok(Code { value, description: code.description.map(|d| d.value) })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn codes(&self) -> &[Code] {
        &self.0
    }

    pub fn values(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.value.as_str()).collect()
    }

    /// Values joined with commas, as the data endpoint expects.
    pub fn joined(&self) -> String {
        self.values().join(",")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
