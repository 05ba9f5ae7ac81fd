//! The closed set of digest algorithms usable in PKCS#1 v1.5 signatures.

use std::fmt;
use std::str::FromStr;

use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::error::{Error, Result};

// DigestInfo DER prefixes: AlgorithmIdentifier plus the OCTET STRING
// header, so `prefix || digest` is the full DigestInfo encoding.
const MD5_PREFIX: &[u8] = &[
    0x30, 0x20, 0x30, 0x0c, 0x06, 0x08, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x05, 0x05,
    0x00, 0x04, 0x10,
];
const SHA1_PREFIX: &[u8] = &[
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];
const SHA224_PREFIX: &[u8] = &[
    0x30, 0x2d, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x04,
    0x05, 0x00, 0x04, 0x1c,
];
const SHA256_PREFIX: &[u8] = &[
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01,
    0x05, 0x00, 0x04, 0x20,
];
const SHA384_PREFIX: &[u8] = &[
    0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02,
    0x05, 0x00, 0x04, 0x30,
];
const SHA512_PREFIX: &[u8] = &[
    0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03,
    0x05, 0x00, 0x04, 0x40,
];

/// Digest algorithms accepted by [`sign`] and recoverable by [`verify`].
///
/// The set is closed: signature verification only ever matches against
/// these six DigestInfo encodings, and anything else is rejected.
///
/// [`sign`]: crate::pkcs1::sign
/// [`verify`]: crate::pkcs1::verify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm, in DigestInfo-matching order.
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// The wire name. Case-sensitive, matches [`from_name`](Self::from_name).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha224 => "SHA-224",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Parse a case-sensitive algorithm name.
    pub fn from_name(name: &str) -> Result<HashAlgorithm> {
        HashAlgorithm::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.name() == name)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown hash algorithm {:?}", name)))
    }

    /// Digest `message` with this algorithm.
    #[must_use]
    pub fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Md5 => Md5::digest(message).to_vec(),
            HashAlgorithm::Sha1 => Sha1::digest(message).to_vec(),
            HashAlgorithm::Sha224 => Sha224::digest(message).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(message).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(message).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(message).to_vec(),
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// The constant DigestInfo DER prefix that precedes the raw digest
    /// in a type-1 signature block.
    #[must_use]
    pub fn asn1_prefix(self) -> &'static [u8] {
        match self {
            HashAlgorithm::Md5 => MD5_PREFIX,
            HashAlgorithm::Sha1 => SHA1_PREFIX,
            HashAlgorithm::Sha224 => SHA224_PREFIX,
            HashAlgorithm::Sha256 => SHA256_PREFIX,
            HashAlgorithm::Sha384 => SHA384_PREFIX,
            HashAlgorithm::Sha512 => SHA512_PREFIX,
        }
    }

    /// Whether the algorithm is cryptographically broken for signatures.
    /// Such algorithms stay verifiable for interop but are discouraged
    /// on the signing side.
    #[must_use]
    pub fn broken_for_signing(self) -> bool {
        matches!(self, HashAlgorithm::Md5 | HashAlgorithm::Sha1)
    }

    /// Split an unpadded signature block into the algorithm it names and
    /// the raw digest that follows, by matching the known DigestInfo
    /// prefixes. `None` when no prefix matches exactly.
    #[must_use]
    pub fn split_clearsig(cleartext: &[u8]) -> Option<(HashAlgorithm, &[u8])> {
        for algorithm in HashAlgorithm::ALL.iter().copied() {
            let prefix = algorithm.asn1_prefix();

            if cleartext.starts_with(prefix) {
                let digest = &cleartext[prefix.len()..];

                if digest.len() == algorithm.digest_len() {
                    return Some((algorithm, digest));
                }
            }
        }

        None
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(name: &str) -> Result<HashAlgorithm> {
        HashAlgorithm::from_name(name)
    }
}
