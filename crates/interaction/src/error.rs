use layers::MapError;

/// Failure taxonomy of the interaction layer. None of these is fatal; each
/// call site logs and degrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    /// A named layer, table, control or element is absent.
    NotFound { what: &'static str, name: String },
    /// A collaborator query or view request rejected.
    Fetch(MapError),
    /// A newer request superseded this one.
    Stale,
    /// An observed condition never held within its bound.
    TimedOut { what: &'static str, after_ms: u32 },
}

impl InteractionError {
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        InteractionError::NotFound {
            what,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for InteractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionError::NotFound { what, name } => write!(f, "{what} not found: {name}"),
            InteractionError::Fetch(err) => write!(f, "{err}"),
            InteractionError::Stale => write!(f, "superseded by a newer request"),
            InteractionError::TimedOut { what, after_ms } => {
                write!(f, "{what} did not appear within {after_ms} ms")
            }
        }
    }
}

impl std::error::Error for InteractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InteractionError::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MapError> for InteractionError {
    fn from(err: MapError) -> Self {
        InteractionError::Fetch(err)
    }
}
