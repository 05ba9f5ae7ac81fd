//! Error taxonomy shared by the whole crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong in this crate.
///
/// [`Decryption`] and [`Verification`] deliberately carry no detail and
/// render the same message no matter which internal check tripped, so a
/// caller relaying the error cannot be used as a padding oracle.
///
/// [`Decryption`]: Error::Decryption
/// [`Verification`]: Error::Verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A caller-supplied parameter is unusable: key size below the
    /// minimum, an unknown hash name, a non-coprime modular inverse.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A value does not fit in the space the caller asked for.
    #[error("overflow: {0}")]
    Overflow(String),

    /// Decryption failed.
    #[error("decryption failed")]
    Decryption,

    /// Signature verification failed.
    #[error("verification failed")]
    Verification,

    /// Malformed DER or PEM key material.
    #[error("malformed key material: {0}")]
    Codec(String),

    /// Key generation was aborted through its [`CancelToken`].
    ///
    /// [`CancelToken`]: crate::cancel::CancelToken
    #[error("operation cancelled")]
    Cancelled,
}
