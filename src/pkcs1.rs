//! High-level PKCS#1 v1.5 operations over byte strings.
//!
//! Encryption and signing take and return byte strings whose length is
//! the key's byte length. Every size check happens before any modular
//! exponentiation, so malformed inputs are rejected cheaply.

use log::warn;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use crate::key::{PrivateKey, PublicKey};
use crate::math;
use crate::padding;

/// Encrypt `message` with type-2 padding, using operating-system
/// entropy for the padding string.
///
/// The message can be at most `key.byte_length() - 11` bytes.
pub fn encrypt(message: &[u8], key: &PublicKey) -> Result<Vec<u8>> {
    encrypt_with(&mut OsRng, message, key)
}

/// [`encrypt`] with a caller-supplied random source.
pub fn encrypt_with<R>(rng: &mut R, message: &[u8], key: &PublicKey) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng,
{
    let keylength = key.byte_length();

    let block = padding::pad_for_encryption(rng, message, keylength)?;
    let payload = math::bytes_to_int(&block);
    let encrypted = key.encrypt_int(&payload);

    math::int_to_bytes(&encrypted, Some(keylength))
}

/// Decrypt a ciphertext produced by [`encrypt`].
///
/// Fails with the uniform [`Error::Decryption`] on any problem: wrong
/// ciphertext length, bad padding markers, short padding string.
pub fn decrypt(ciphertext: &[u8], key: &PrivateKey) -> Result<Vec<u8>> {
    decrypt_with(&mut OsRng, ciphertext, key)
}

/// [`decrypt`] with a caller-supplied random source (used for blinding).
pub fn decrypt_with<R>(rng: &mut R, ciphertext: &[u8], key: &PrivateKey) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng,
{
    let keylength = key.byte_length();

    if ciphertext.len() != keylength {
        return Err(Error::Decryption);
    }

    let payload = math::bytes_to_int(ciphertext);
    let decrypted = key.blinded_decrypt(rng, &payload);
    let block = math::int_to_bytes(&decrypted, Some(keylength)).map_err(|_| Error::Decryption)?;

    padding::unpad_encryption(&block)
}

/// Sign a precomputed `digest` under `algorithm`.
///
/// The digest length must match the algorithm. Signing with MD5 or
/// SHA-1 still works for interop but logs a warning; both are broken
/// for new signatures.
pub fn sign_hash(digest: &[u8], key: &PrivateKey, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
    sign_hash_with(&mut OsRng, digest, key, algorithm)
}

/// [`sign_hash`] with a caller-supplied random source (used for blinding).
pub fn sign_hash_with<R>(
    rng: &mut R,
    digest: &[u8],
    key: &PrivateKey,
    algorithm: HashAlgorithm,
) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng,
{
    if digest.len() != algorithm.digest_len() {
        return Err(Error::InvalidArgument(format!(
            "{} digests are {} bytes, got {}",
            algorithm,
            algorithm.digest_len(),
            digest.len()
        )));
    }

    if algorithm.broken_for_signing() {
        warn!("signing with {}, which is unfit for new signatures", algorithm);
    }

    let keylength = key.byte_length();

    let block = padding::pad_for_signing(algorithm, digest, keylength)?;
    let payload = math::bytes_to_int(&block);
    let signed = key.blinded_decrypt(rng, &payload);

    math::int_to_bytes(&signed, Some(keylength))
}

/// Hash `message` with `algorithm` and sign the digest.
pub fn sign(message: &[u8], key: &PrivateKey, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
    sign_hash(&algorithm.digest(message), key, algorithm)
}

/// [`sign`] with a caller-supplied random source (used for blinding).
pub fn sign_with<R>(
    rng: &mut R,
    message: &[u8],
    key: &PrivateKey,
    algorithm: HashAlgorithm,
) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng,
{
    sign_hash_with(rng, &algorithm.digest(message), key, algorithm)
}

/// Verify `signature` over `message`, returning the algorithm the
/// signature names.
///
/// The algorithm is recovered from the signature block itself by
/// DigestInfo prefix matching, never trusted from the caller. Fails
/// with the uniform [`Error::Verification`] on any problem.
pub fn verify(message: &[u8], signature: &[u8], key: &PublicKey) -> Result<HashAlgorithm> {
    let (algorithm, signature_digest) = open_signature(signature, key)?;
    let message_digest = algorithm.digest(message);

    if signature_digest != message_digest {
        return Err(Error::Verification);
    }

    Ok(algorithm)
}

/// Recover which digest algorithm `signature` used, without checking it
/// against any message.
pub fn find_signature_hash(signature: &[u8], key: &PublicKey) -> Result<HashAlgorithm> {
    let (algorithm, _) = open_signature(signature, key)?;

    Ok(algorithm)
}

// Public-exponent the signature, strip the type-1 padding, and split
// the DigestInfo cleartext
fn open_signature(signature: &[u8], key: &PublicKey) -> Result<(HashAlgorithm, Vec<u8>)> {
    let keylength = key.byte_length();

    if signature.len() != keylength {
        return Err(Error::Verification);
    }

    let payload = math::bytes_to_int(signature);
    let decrypted = key.encrypt_int(&payload);
    let block = math::int_to_bytes(&decrypted, Some(keylength)).map_err(|_| Error::Verification)?;

    let cleartext = padding::unpad_signing(&block)?;
    let (algorithm, digest) =
        HashAlgorithm::split_clearsig(cleartext).ok_or(Error::Verification)?;

    Ok((algorithm, digest.to_vec()))
}

#[cfg(test)]
mod test {
    use num_bigint::BigUint;
    use once_cell::sync::Lazy;
    use rand::thread_rng;

    use super::{decrypt, encrypt, find_signature_hash, sign, sign_hash, verify};
    use crate::error::Error;
    use crate::hash::HashAlgorithm;
    use crate::key::{newkeys_with, PrivateKey, PublicKey};

    static KEYPAIR: Lazy<(PublicKey, PrivateKey)> =
        Lazy::new(|| newkeys_with(&mut thread_rng(), 512, true, 65_537, None).unwrap());

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let (public, private) = &*KEYPAIR;

        let ciphertext = encrypt(b"attack at dawn", public).unwrap();

        assert_eq!(ciphertext.len(), public.byte_length());
        assert_eq!(decrypt(&ciphertext, private).unwrap(), b"attack at dawn");
    }

    #[test]
    fn test_encrypt_empty_message() {
        let (public, private) = &*KEYPAIR;

        let ciphertext = encrypt(b"", public).unwrap();

        assert_eq!(decrypt(&ciphertext, private).unwrap(), b"");
    }

    #[test]
    fn test_encrypt_message_length_boundary() {
        let (public, _) = &*KEYPAIR;
        let keylength = public.byte_length();

        assert!(encrypt(&vec![0x42; keylength - 11], public).is_ok());
        assert!(matches!(
            encrypt(&vec![0x42; keylength - 10], public),
            Err(Error::Overflow(_))
        ));
    }

    #[test]
    fn test_encryption_is_randomized() {
        let (public, private) = &*KEYPAIR;

        let first = encrypt(b"same plaintext", public).unwrap();
        let second = encrypt(b"same plaintext", public).unwrap();

        assert_ne!(first, second);
        assert_eq!(decrypt(&first, private).unwrap(), b"same plaintext");
        assert_eq!(decrypt(&second, private).unwrap(), b"same plaintext");
    }

    #[test]
    fn test_decrypt_reject_wrong_length() {
        let (public, private) = &*KEYPAIR;
        let ciphertext = encrypt(b"hi", public).unwrap();

        assert_eq!(
            decrypt(&ciphertext[..ciphertext.len() - 1], private),
            Err(Error::Decryption)
        );
    }

    #[test]
    fn test_decrypt_reject_tampered_ciphertext() {
        let (public, private) = &*KEYPAIR;
        let mut ciphertext = encrypt(b"hi", public).unwrap();
        ciphertext[3] ^= 0x40;

        assert_eq!(decrypt(&ciphertext, private), Err(Error::Decryption));
    }

    #[test]
    fn test_sign_verify_round_trip_all_algorithms() {
        let (public, private) = &*KEYPAIR;

        for algorithm in HashAlgorithm::ALL.iter().copied() {
            let signature = sign(b"attack at dawn", private, algorithm).unwrap();

            assert_eq!(signature.len(), public.byte_length());
            assert_eq!(
                verify(b"attack at dawn", &signature, public).unwrap(),
                algorithm,
            );
        }
    }

    #[test]
    fn test_verify_reject_tampered_message() {
        let (public, private) = &*KEYPAIR;
        let signature = sign(b"attack at dawn", private, HashAlgorithm::Sha256).unwrap();

        assert_eq!(
            verify(b"attack at noon", &signature, public),
            Err(Error::Verification)
        );
    }

    #[test]
    fn test_verify_reject_tampered_signature() {
        let (public, private) = &*KEYPAIR;
        let mut signature = sign(b"attack at dawn", private, HashAlgorithm::Sha256).unwrap();
        signature[7] ^= 0x01;

        assert_eq!(
            verify(b"attack at dawn", &signature, public),
            Err(Error::Verification)
        );
    }

    #[test]
    fn test_verify_reject_wrong_length() {
        let (public, private) = &*KEYPAIR;
        let signature = sign(b"attack at dawn", private, HashAlgorithm::Sha256).unwrap();

        assert_eq!(
            verify(b"attack at dawn", &signature[1..], public),
            Err(Error::Verification)
        );
    }

    #[test]
    fn test_verify_reject_foreign_key() {
        let (_, private) = &*KEYPAIR;
        let (other_public, _) = newkeys_with(&mut thread_rng(), 512, true, 65_537, None).unwrap();

        let signature = sign(b"attack at dawn", private, HashAlgorithm::Sha256).unwrap();

        assert_eq!(
            verify(b"attack at dawn", &signature, &other_public),
            Err(Error::Verification)
        );
    }

    #[test]
    fn test_find_signature_hash() {
        let (public, private) = &*KEYPAIR;

        for algorithm in HashAlgorithm::ALL.iter().copied() {
            let signature = sign(b"whatever", private, algorithm).unwrap();

            assert_eq!(find_signature_hash(&signature, public).unwrap(), algorithm);
        }
    }

    #[test]
    fn test_sign_hash_rejects_wrong_digest_length() {
        let (_, private) = &*KEYPAIR;

        let result = sign_hash(&[0_u8; 20], private, HashAlgorithm::Sha256);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_small_key_cannot_hold_large_digest() {
        // A 30-byte block cannot hold a SHA-512 DigestInfo
        let mut rng = thread_rng();
        let (_, private) = newkeys_with(&mut rng, 240, true, 65_537, None).unwrap();

        let digest = HashAlgorithm::Sha512.digest(b"x");
        let result = sign_hash(&digest, &private, HashAlgorithm::Sha512);

        assert!(matches!(result, Err(Error::Overflow(_))));
    }

    #[test]
    fn test_textbook_fixture_key_round_trip() {
        // p = 61, q = 53: the modulus is two bytes, far too small for
        // padded operation, so only the raw integer layer is exercised
        let private = PrivateKey::new(
            BigUint::from(3233_usize),
            BigUint::from(17_usize),
            BigUint::from(413_usize),
            BigUint::from(61_usize),
            BigUint::from(53_usize),
        )
        .unwrap();
        let public = private.public_key();
        let mut rng = thread_rng();

        let message = BigUint::from(65_usize);
        let ciphertext = public.encrypt_int(&message);

        assert_eq!(ciphertext, BigUint::from(2790_usize));
        assert_eq!(private.blinded_decrypt(&mut rng, &ciphertext), message);
    }
}
