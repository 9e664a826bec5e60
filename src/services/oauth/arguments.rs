use serde::{Deserialize, Serialize};

/// Ordered set of OAuth2 arguments (grant types, scopes, ...).
///
/// Insertion order is kept and duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(Vec<String>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a space-delimited parameter such as `scope`.
    pub fn from_space_delimited(value: &str) -> Self {
        let mut args = Self::new();
        for item in value.split(' ').filter(|s| !s.is_empty()) {
            args.append(item);
        }
        args
    }

    pub fn append(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !self.has(&value) {
            self.0.push(value);
        }
    }

    pub fn has(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    /// True when exactly one argument is present and it equals `value`.
    pub fn exact_one(&self, value: &str) -> bool {
        self.0.len() == 1 && self.0[0] == value
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_space_delimited(&self) -> String {
        self.0.join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for Arguments {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut args = Self::new();
        for item in iter {
            args.append(item);
        }
        args
    }
}
