//! Rich diagnostic error types for the antirec engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains. External-service
//! failures are wrapped once and otherwise passed through unchanged: the core
//! never retries.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the antirec engine.
#[derive(Debug, Error, Diagnostic)]
pub enum AntirecError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("relation graph query failed for \"{subject}\": {message}")]
    #[diagnostic(
        code(antirec::graph::query),
        help(
            "The relation graph could not answer a subject lookup. \
             Check that the graph store is loaded and the query is well formed. \
             The caller may fall back to a global scan."
        )
    )]
    Query { subject: String, message: String },

    #[error("failed to load relation graph from {path}: {message}")]
    #[diagnostic(
        code(antirec::graph::load),
        help(
            "The relation source could not be read or parsed. \
             Verify the file exists and that its format matches the configured one."
        )
    )]
    Load { path: String, message: String },

    #[error("invalid base IRI \"{iri}\": {message}")]
    #[diagnostic(
        code(antirec::graph::base_iri),
        help("The ARKG base IRI must be an absolute IRI, e.g. `http://example.org/arkg/`.")
    )]
    BaseIri { iri: String, message: String },
}

// ---------------------------------------------------------------------------
// History errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum HistoryError {
    #[error("history backend error for user {user}: {message}")]
    #[diagnostic(
        code(antirec::history::backend),
        help(
            "The history service failed to read or write. \
             Retry policy belongs to the history client; the navigation state was not changed."
        )
    )]
    Backend { user: String, message: String },

    #[error("failed to decode history for user {user}: {message}")]
    #[diagnostic(
        code(antirec::history::decode),
        help(
            "The stored history could not be deserialized. \
             The history database may have been written by an incompatible version."
        )
    )]
    Decode { user: String, message: String },

    #[error("I/O error opening history store: {source}")]
    #[diagnostic(
        code(antirec::history::io),
        help("Check that the data directory exists and is writable.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Catalog errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    #[diagnostic(
        code(antirec::catalog::read),
        help("Ensure the catalog file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog record at {location}: {message}")]
    #[diagnostic(
        code(antirec::catalog::parse),
        help(
            "Catalog files are a JSON array or JSON lines of objects \
             with a non-blank `key` (or `title`) field."
        )
    )]
    Parse { location: String, message: String },
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("session not found: {session}")]
    #[diagnostic(
        code(antirec::session::not_found),
        help("Open the session with `SessionRegistry::open` before navigating.")
    )]
    NotFound { session: String },

    #[error("session {session} is poisoned")]
    #[diagnostic(
        code(antirec::session::poisoned),
        help(
            "A previous call panicked while holding this session. \
             Close and reopen the session to start over."
        )
    )]
    Poisoned { session: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(antirec::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(antirec::config::parse),
        help("Check the TOML syntax and field names in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(antirec::config::invalid), help("{message}"))]
    Invalid { message: String },

    #[error("cannot determine home directory")]
    #[diagnostic(
        code(antirec::config::no_home),
        help("Set the HOME environment variable or pass explicit paths on the command line.")
    )]
    NoHome,
}

/// Convenience alias for functions returning antirec results.
pub type AntirecResult<T> = std::result::Result<T, AntirecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_converts_to_antirec_error() {
        let err = GraphError::Query {
            subject: "Octopus".into(),
            message: "store closed".into(),
        };
        let top: AntirecError = err.into();
        assert!(matches!(top, AntirecError::Graph(GraphError::Query { .. })));
    }

    #[test]
    fn history_error_converts_to_antirec_error() {
        let err = HistoryError::Backend {
            user: "u1".into(),
            message: "timeout".into(),
        };
        let top: AntirecError = err.into();
        assert!(matches!(top, AntirecError::History(HistoryError::Backend { .. })));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = GraphError::Query {
            subject: "Octopus".into(),
            message: "store closed".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Octopus"));
        assert!(msg.contains("store closed"));
    }
}
