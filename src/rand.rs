//! Random-number plumbing for key generation and padding.
//!
//! The crate obtains all of its randomness through these functions and
//! retains none of it. Callers pick the generator; the high-level API in
//! [`crate::pkcs1`] and [`crate::key`] uses [`rand::rngs::OsRng`].

use num_bigint::BigUint;
use num_traits::Zero;
use rand::{CryptoRng, RngCore};

use crate::math;

/// Read `nbits` bits of randomness as `ceil(nbits / 8)` big-endian bytes
/// with the excess top bits cleared.
pub fn read_random_bits<R>(rng: &mut R, nbits: usize) -> Vec<u8>
where
    R: RngCore + CryptoRng,
{
    let nbytes = math::ceil_div(nbits, 8);
    let mut bytes = vec![0_u8; nbytes];
    rng.fill_bytes(&mut bytes);

    let excess_bits = nbytes * 8 - nbits;
    if excess_bits > 0 {
        bytes[0] &= 0xff >> excess_bits;
    }

    bytes
}

/// Uniform random integer in `[0, bound)`.
///
/// Rejection-samples `bit_size(bound)`-bit draws until one lands below
/// `bound`, so the result is unbiased.
pub fn read_random_int<R>(rng: &mut R, bound: &BigUint) -> BigUint
where
    R: RngCore + CryptoRng,
{
    debug_assert!(!bound.is_zero());

    let nbits = math::bit_size(bound);

    loop {
        let candidate = BigUint::from_bytes_be(&read_random_bits(rng, nbits));

        if &candidate < bound {
            return candidate;
        }
    }
}

/// Random odd integer of exactly `nbits` bits.
///
/// The top bit is set so the value has the requested size, the bottom
/// bit so it is a usable prime candidate.
pub fn read_random_odd_int<R>(rng: &mut R, nbits: usize) -> BigUint
where
    R: RngCore + CryptoRng,
{
    assert!(nbits >= 1);

    let mut candidate = BigUint::from_bytes_be(&read_random_bits(rng, nbits));

    candidate.set_bit(nbits as u64 - 1, true);
    candidate.set_bit(0, true);

    candidate
}
