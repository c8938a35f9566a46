use std::fmt;
use std::sync::Arc;

use super::tag::Tag;
use crate::error::TemplateError;
use crate::value::ScopeValue;

/// One step of the logical data path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    Tag(Tag),
    Index(usize),
}

impl PathPart {
    /// The segment as the resolver sees it: the tag name or the index.
    pub fn segment(&self) -> String {
        match self {
            PathPart::Tag(tag) => tag.name_or_empty().to_string(),
            PathPart::Index(index) => index.to_string(),
        }
    }
}

/// Why a path could not be resolved against the data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("no value named '{segment}'")]
    Missing { segment: String },

    #[error("'{segment}' is not a valid sequence index")]
    InvalidIndex { segment: String },

    #[error("can not look up '{segment}' inside a {kind} value")]
    NotContainer {
        segment: String,
        kind: &'static str,
    },

    #[error("{0}")]
    Custom(String),
}

/// What a resolver gets to work with.
pub struct ScopeDataArgs<'a> {
    pub path: &'a [PathPart],
    /// `path` as strings, one per part.
    pub str_path: &'a [String],
    pub data: &'a ScopeValue,
}

pub type ScopeDataResolver =
    Arc<dyn Fn(&ScopeDataArgs<'_>) -> Result<ScopeValue, ResolveError> + Send + Sync>;

/// Walks `data` one path segment at a time.
///
/// Sequences are indexed by number and maps by key. A segment missing at the
/// last step yields `Null`, so optional values render empty. A segment
/// missing earlier, or a lookup inside a scalar, is an error.
pub fn default_resolver(args: &ScopeDataArgs<'_>) -> Result<ScopeValue, ResolveError> {
    let mut current = args.data;
    let last = args.str_path.len().saturating_sub(1);

    for (i, segment) in args.str_path.iter().enumerate() {
        let next = match current.untyped() {
            ScopeValue::Sequence(items) => {
                let index: usize = segment.parse().map_err(|_| ResolveError::InvalidIndex {
                    segment: segment.clone(),
                })?;
                items.get(index)
            }
            ScopeValue::Map(map) => map.get(segment),
            other => {
                return Err(ResolveError::NotContainer {
                    segment: segment.clone(),
                    kind: other.kind_name(),
                });
            }
        };

        match next {
            Some(value) => current = value,
            None if i == last => return Ok(ScopeValue::Null),
            None => {
                return Err(ResolveError::Missing {
                    segment: segment.clone(),
                });
            }
        }
    }

    Ok(current.clone())
}

/// The data being rendered plus the path to the tag currently compiled.
///
/// The path follows container nesting, not tree depth: it grows by one for
/// each open container and by one more for the loop index.
pub struct ScopeData {
    path: Vec<PathPart>,
    str_path: Vec<String>,
    data: ScopeValue,
    resolver: Option<ScopeDataResolver>,
}

impl ScopeData {
    pub fn new(data: ScopeValue) -> Self {
        Self {
            path: Vec::new(),
            str_path: Vec::new(),
            data,
            resolver: None,
        }
    }

    /// Replaces [`default_resolver`] with a custom one.
    pub fn with_resolver(mut self, resolver: ScopeDataResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn path_push(&mut self, part: PathPart) {
        self.str_path.push(part.segment());
        self.path.push(part);
    }

    pub fn path_pop(&mut self) -> Option<PathPart> {
        self.str_path.pop();
        self.path.pop()
    }

    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Segments joined with `.`, e.g. `items.0.name`.
    pub fn path_string(&self) -> String {
        self.str_path.join(".")
    }

    pub fn all_data(&self) -> &ScopeValue {
        &self.data
    }

    /// Resolves the current path.
    pub fn get_scope_data(&self) -> Result<ScopeValue, TemplateError> {
        let args = ScopeDataArgs {
            path: &self.path,
            str_path: &self.str_path,
            data: &self.data,
        };
        let resolved = match &self.resolver {
            Some(resolver) => resolver(&args),
            None => default_resolver(&args),
        };
        resolved.map_err(|source| TemplateError::Resolve {
            path: self.path_string(),
            source,
        })
    }
}

impl fmt::Debug for ScopeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeData")
            .field("path", &self.path_string())
            .field("custom_resolver", &self.resolver.is_some())
            .finish()
    }
}
