use thiserror::Error;

/// Error taxonomy for the search core.
///
/// Variants line up with the classes of failure the crate actually needs to
/// distinguish at call sites: input malformation, the two flavours of
/// collaborator failure (transient vs permanent), and blob (de)serialisation.
/// Malformed HTML is deliberately absent — per policy it degrades to a
/// best-effort extract and is logged, never returned as an error. Duplicate
/// `doc_id` on index `add` is a silent no-op for the same reason.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("empty query")]
    EmptyQuery,

    #[error("collaborator call failed transiently: {0}")]
    CollaboratorTransient(String),

    #[error("collaborator call failed permanently: {0}")]
    CollaboratorPermanent(String),

    #[error("serialisation failure: {0}")]
    Serialisation(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
