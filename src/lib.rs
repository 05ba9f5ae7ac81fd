//! [RSA](https://en.wikipedia.org/wiki/RSA_(cryptosystem)) public-key
//! cryptography per [PKCS#1 v1.5](https://tools.ietf.org/html/rfc8017).
//!
//! Key generation, encryption and decryption with type-2 padding,
//! signatures with DigestInfo-wrapped digests, and PKCS#1 DER/PEM key
//! files (the traditional OpenSSL form, not SubjectPublicKeyInfo).
//!
//! ```no_run
//! use rsa_pkcs1::{decrypt, encrypt, newkeys, sign, verify, HashAlgorithm};
//!
//! let (public, private) = newkeys(1024)?;
//!
//! let ciphertext = encrypt(b"attack at dawn", &public)?;
//! assert_eq!(decrypt(&ciphertext, &private)?, b"attack at dawn");
//!
//! let signature = sign(b"attack at dawn", &private, HashAlgorithm::Sha256)?;
//! assert_eq!(verify(b"attack at dawn", &signature, &public)?, HashAlgorithm::Sha256);
//! # Ok::<(), rsa_pkcs1::Error>(())
//! ```
//!
//! # Security
//!
//! The big-integer arithmetic underneath is **not constant-time**.
//! Private-key operations are wrapped in multiplicative blinding to
//! decouple their timing from the operand, and the decrypt/verify error
//! paths collapse into a single uniform error each, but this crate has
//! not been hardened beyond that. Don't point it at adversaries who can
//! measure you.

#![deny(clippy::correctness)]
#![warn(clippy::style)]
#![warn(clippy::complexity)]
#![warn(clippy::perf)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cancel;
pub mod der;
pub mod error;
pub mod hash;
pub mod key;
pub mod math;
pub mod padding;
pub mod pem;
pub mod pkcs1;
pub mod prime;
pub mod rand;

pub use crate::cancel::CancelToken;
pub use crate::error::{Error, Result};
pub use crate::hash::HashAlgorithm;
pub use crate::key::{newkeys, newkeys_with, KeyFormat, PrivateKey, PublicKey, DEFAULT_EXPONENT};
pub use crate::pkcs1::{
    decrypt, decrypt_with, encrypt, encrypt_with, find_signature_hash, sign, sign_hash,
    sign_hash_with, sign_with, verify,
};
