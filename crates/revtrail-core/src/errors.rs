use thiserror::Error;

/// Result type alias using TrailError
pub type Result<T> = std::result::Result<T, TrailError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised while tracking revisions. Each kind maps to a stable error code that
/// can be used for programmatic error handling, testing, and external API
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    InvalidConfig,
    NotFound,

    // Sequencing
    /// An update reached the sequencer without a committed revision counter
    MissingRevisionCounter,
    /// Fail-hard mode is on and no actor could be resolved
    MissingActor,
    /// The revision counter was not stamped before the revision was built
    InvariantViolation,

    // Integration/IO
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::MissingRevisionCounter => "ERR_MISSING_REVISION_COUNTER",
            ExErrorKind::MissingActor => "ERR_MISSING_ACTOR",
            ExErrorKind::InvariantViolation => "ERR_INVARIANT_VIOLATION",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether an error of this kind can only be fixed by correcting the
    /// wiring around the engine rather than by retrying the mutation
    pub fn is_wiring_fault(&self) -> bool {
        matches!(
            self,
            ExErrorKind::MissingRevisionCounter | ExErrorKind::InvariantViolation
        )
    }
}

/// Canonical structured error type
///
/// This error type provides a structured representation of errors with
/// classification fields for programmatic handling and rich context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    model: Option<String>,
    document_id: Option<String>,
    revision: Option<i64>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            model: None,
            document_id: None,
            revision: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add tracked model context
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add document ID context
    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    /// Add revision number context
    pub fn with_revision(mut self, revision: i64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the tracked model context, if any
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Get the document ID context, if any
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Get the revision number context, if any
    pub fn revision(&self) -> Option<i64> {
        self.revision
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(model) = &self.model {
            write!(f, " (model: {})", model)?;
        }
        if let Some(document_id) = &self.document_id {
            write!(f, " (document_id: {})", document_id)?;
        }
        if let Some(revision) = self.revision {
            write!(f, " (revision: {})", revision)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for revision tracking operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrailError {
    /// An update was attempted on an entity whose prior counter cannot be resolved
    #[error("Revision counter missing on update of {model} {document_id}")]
    MissingRevisionCounter { model: String, document_id: String },

    /// Fail-hard mode is enabled and no actor was supplied or resolved
    #[error("No actor available for revision of {model} {document_id}")]
    MissingActor { model: String, document_id: String },

    /// Counter unset at build time; the sequencing step was skipped
    #[error("Invariant violated for {model} {document_id}: {reason}")]
    InvariantViolation {
        model: String,
        document_id: String,
        reason: String,
    },

    /// A field value could not be rendered for diffing or storage
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A revision or change-record save failed
    #[error("Persistence failure in {op}: {message}")]
    Persistence { op: String, message: String },

    /// Configuration rejected at initialization
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<serde_json::Error> for TrailError {
    fn from(err: serde_json::Error) -> Self {
        TrailError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<TrailError> for ExError {
    fn from(err: TrailError) -> Self {
        match err {
            TrailError::MissingRevisionCounter { model, document_id } => {
                ExError::new(ExErrorKind::MissingRevisionCounter)
                    .with_op("sequence")
                    .with_model(model)
                    .with_document_id(document_id)
                    .with_message("Revision counter was undefined")
            }

            TrailError::MissingActor { model, document_id } => {
                ExError::new(ExErrorKind::MissingActor)
                    .with_op("build_revision")
                    .with_model(model)
                    .with_document_id(document_id)
                    .with_message("No actor supplied and the resolver returned none")
            }

            TrailError::InvariantViolation {
                model,
                document_id,
                reason,
            } => ExError::new(ExErrorKind::InvariantViolation)
                .with_op("build_revision")
                .with_model(model)
                .with_document_id(document_id)
                .with_message(reason),

            TrailError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            TrailError::Persistence { op, message } => ExError::new(ExErrorKind::Persistence)
                .with_op(op)
                .with_message(message),

            TrailError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(reason)
            }
        }
    }
}
