use thiserror::Error;

/// Errors that can occur while resolving a definition query.
#[derive(Error, Debug)]
pub enum DefjumpError {
    #[error("malformed query: {message}")]
    QueryMalformed { message: String },

    /// No identifier encloses the queried range. Internal fallthrough;
    /// surfaced only if every later tier also fails.
    #[error("no identifier at {path}:#{offset}")]
    NoIdentifier { path: String, offset: usize },

    /// The identifier exists but the single-unit binder cannot link it.
    /// Internal fallthrough.
    #[error("identifier {name:?} has no binding in this unit")]
    UnresolvedIdentifier { name: String },

    #[error("cannot find unit for import path {import_path:?}")]
    UnitNotFound { import_path: String },

    #[error("couldn't find declaration of {member} in {import_path:?}")]
    MemberNotFound {
        member: String,
        import_path: String,
    },

    #[error("failed to load program: {message}")]
    FrontendLoadFailure { message: String },

    #[error("no binding for identifier {name:?}")]
    NoBindingForIdentifier { name: String },

    #[error("{name} is built in")]
    BuiltinDeclaration { name: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results using `DefjumpError`.
pub type Result<T> = std::result::Result<T, DefjumpError>;
