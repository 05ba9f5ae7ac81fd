//! PKCS#1 v1.5 block framing: type 2 (random padding, encryption) and
//! type 1 (`0xFF` padding, signatures).
//!
//! Both unpad paths collapse every failure into the single coarse error
//! of their direction, so nothing about the position of the failing byte
//! is observable to callers.

use rand::{CryptoRng, Rng, RngCore};

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;

/// Minimum framing overhead of a v1.5 block: two marker bytes, the zero
/// separator, and an 8-byte padding string.
const MIN_PAD_OVERHEAD: usize = 11;

// Draw exactly `length` random bytes, none of them zero. Zero draws are
// resampled byte-wise.
fn nonzero_random_bytes<R>(rng: &mut R, length: usize) -> Vec<u8>
where
    R: RngCore + CryptoRng,
{
    let mut padding = vec![0_u8; length];

    for byte in &mut padding {
        loop {
            let draw = rng.gen::<u8>();

            if draw != 0 {
                *byte = draw;
                break;
            }
        }
    }

    padding
}

/// Type-2 pad: `00 02 || PS || 00 || message`, `target_len` bytes total,
/// with `PS` random and zero-free.
///
/// Fails with an overflow when the message needs more room than the
/// block can give it (`target_len - 11`).
pub fn pad_for_encryption<R>(rng: &mut R, message: &[u8], target_len: usize) -> Result<Vec<u8>>
where
    R: RngCore + CryptoRng,
{
    if message.len() + MIN_PAD_OVERHEAD > target_len {
        return Err(Error::Overflow(format!(
            "message needs {} bytes, block has space for {}",
            message.len(),
            target_len.saturating_sub(MIN_PAD_OVERHEAD)
        )));
    }

    let padding_len = target_len - message.len() - 3;

    let mut block = Vec::with_capacity(target_len);
    block.push(0x00);
    block.push(0x02);
    block.extend(nonzero_random_bytes(rng, padding_len));
    block.push(0x00);
    block.extend_from_slice(message);

    Ok(block)
}

/// Strip type-2 padding, returning the embedded message.
pub fn unpad_encryption(block: &[u8]) -> Result<Vec<u8>> {
    if block.len() < MIN_PAD_OVERHEAD || block[0] != 0x00 || block[1] != 0x02 {
        return Err(Error::Decryption);
    }

    let padding_len = block[2..]
        .iter()
        .position(|&byte| byte == 0x00)
        .ok_or(Error::Decryption)?;

    if padding_len < 8 {
        return Err(Error::Decryption);
    }

    Ok(block[padding_len + 3..].to_vec())
}

/// Type-1 pad: `00 01 || FF... || 00 || DigestInfo || digest`,
/// `target_len` bytes total.
pub fn pad_for_signing(
    algorithm: HashAlgorithm,
    digest: &[u8],
    target_len: usize,
) -> Result<Vec<u8>> {
    let prefix = algorithm.asn1_prefix();
    let payload_len = prefix.len() + digest.len();

    if payload_len + MIN_PAD_OVERHEAD > target_len {
        return Err(Error::Overflow(format!(
            "{} digest info needs {} bytes, block has space for {}",
            algorithm,
            payload_len,
            target_len.saturating_sub(MIN_PAD_OVERHEAD)
        )));
    }

    let padding_len = target_len - payload_len - 3;

    let mut block = Vec::with_capacity(target_len);
    block.push(0x00);
    block.push(0x01);
    block.extend(std::iter::repeat(0xff).take(padding_len));
    block.push(0x00);
    block.extend_from_slice(prefix);
    block.extend_from_slice(digest);

    Ok(block)
}

/// Strip type-1 padding, returning the trailing `DigestInfo || digest`
/// cleartext. The padding string must be all `0xFF` and at least 8
/// bytes long.
pub fn unpad_signing(block: &[u8]) -> Result<&[u8]> {
    if block.len() < MIN_PAD_OVERHEAD || block[0] != 0x00 || block[1] != 0x01 {
        return Err(Error::Verification);
    }

    let padding_len = block[2..]
        .iter()
        .position(|&byte| byte == 0x00)
        .ok_or(Error::Verification)?;

    if padding_len < 8 || !block[2..2 + padding_len].iter().all(|&byte| byte == 0xff) {
        return Err(Error::Verification);
    }

    Ok(&block[padding_len + 3..])
}
