use crate::error::{AppError, AppResult, HttpError};

use super::choices::ChoiceSource;

pub const HEALTH_PATH: &str = "/api/v1/health";
pub const STATUS_PATH: &str = "/api/v1/status";
pub const MODELS_PATH: &str = "/api/v1/models";
pub const PREDICT_PATH: &str = "/api/v1/predict";
pub const METRICS_PATH: &str = "/api/v1/metrics";

const STANDARD_PATHS: [&str; 5] = [
    HEALTH_PATH,
    STATUS_PATH,
    MODELS_PATH,
    PREDICT_PATH,
    METRICS_PATH,
];

/// How an endpoint is requested and which extra checks apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Health,
    Prediction,
    Other,
}

impl EndpointKind {
    #[must_use]
    pub fn of(path: &str) -> Self {
        match path {
            HEALTH_PATH => EndpointKind::Health,
            PREDICT_PATH => EndpointKind::Prediction,
            _ => EndpointKind::Other,
        }
    }
}

/// Ordered, non-empty set of request paths, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCatalog {
    head: String,
    tail: Vec<String>,
}

impl EndpointCatalog {
    /// Builds a catalog from the given paths, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error when `paths` is empty.
    pub fn new<I, S>(paths: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = paths.into_iter().map(Into::into);
        let head = iter
            .next()
            .ok_or_else(|| AppError::http(HttpError::EndpointCatalogEmpty))?;
        Ok(Self {
            head,
            tail: iter.collect(),
        })
    }

    /// The five inference API paths exercised by default.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            head: HEALTH_PATH.to_owned(),
            tail: STANDARD_PATHS
                .iter()
                .skip(1)
                .map(|path| (*path).to_owned())
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tail.len().saturating_add(1)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        match index.checked_sub(1) {
            None => Some(self.head.as_str()),
            Some(tail_index) => self.tail.get(tail_index).map(String::as_str),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.head.as_str()).chain(self.tail.iter().map(String::as_str))
    }

    /// Draws one path uniformly, independent of any previous draw.
    pub fn choose<C>(&self, choices: &mut C) -> &str
    where
        C: ChoiceSource + ?Sized,
    {
        let upper = u64::try_from(self.len()).unwrap_or(u64::MAX);
        let index = usize::try_from(choices.pick(upper)).unwrap_or(0);
        self.get(index).unwrap_or(self.head.as_str())
    }
}
