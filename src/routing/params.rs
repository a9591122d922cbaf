//! Captured path parameters.
//!
//! The matcher inserts a [`PathParams`] into the request extensions before a
//! bound handler runs; handlers read it back through [`PathParamsExt`].

use axum::http::Request;

/// Values captured by `{name}` and `{name...}` segments, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    /// Value captured for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub(crate) fn push(&mut self, name: &str, value: &str) {
        self.params.push((name.to_string(), value.to_string()));
    }
}

impl<'k, 'v> From<&matchit::Params<'k, 'v>> for PathParams {
    fn from(params: &matchit::Params<'k, 'v>) -> Self {
        Self {
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Read captured path parameters from a request.
pub trait PathParamsExt {
    fn path_params(&self) -> Option<&PathParams>;

    fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params()?.get(name)
    }
}

impl<B> PathParamsExt for Request<B> {
    fn path_params(&self) -> Option<&PathParams> {
        self.extensions().get::<PathParams>()
    }
}
