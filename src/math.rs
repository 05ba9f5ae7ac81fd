//! Arbitrary-precision helpers: modular arithmetic and byte conversion.
//!
//! Everything here operates on non-negative integers. Nothing in this
//! module is constant-time; see the crate documentation for how
//! private-key operations compensate.

use num_bigint::{BigInt, BigUint, ToBigInt};
use num_traits::{One, Zero};

use crate::error::{Error, Result};

/// Does mathematical modulo (similar to remainder `%`).
///
/// The difference is that `-1 % 5 = -1`, but `-1 mod 5 = 4`.
fn math_mod(x: &BigInt, n: &BigUint) -> BigUint {
    let n_bigint = n.to_bigint().expect("BigUint always converts to BigInt");

    (((x % &n_bigint) + &n_bigint) % &n_bigint)
        .to_biguint()
        .expect("value is reduced into [0, n)")
}

/// [Extended Euclidean algorithm](https://en.wikipedia.org/wiki/Extended_Euclidean_algorithm)
///
/// Returns `(g, x, y)` such that `a*x + b*y = g = gcd(a, b)`.
#[allow(clippy::many_single_char_names)]
pub fn egcd(a: BigInt, b: BigInt) -> (BigInt, BigInt, BigInt) {
    if a.is_zero() {
        return (b, BigInt::from(0_usize), BigInt::from(1_usize));
    }

    let (g, y, x) = egcd(&b % &a, a.clone());

    (g, x - (b / a) * &y, y)
}

/// [Modular multiplicative inverse](https://en.wikipedia.org/wiki/Modular_multiplicative_inverse)
/// of `a` modulo `m`.
///
/// Fails when `gcd(a, m) != 1`, i.e. when no inverse exists.
pub fn modinv(a: &BigUint, m: &BigUint) -> Result<BigUint> {
    if m.is_zero() {
        return Err(Error::InvalidArgument(
            "modular inverse with zero modulus".to_owned(),
        ));
    }

    let (g, x, _) = egcd(
        BigInt::from(a % m),
        m.to_bigint().expect("BigUint always converts to BigInt"),
    );

    if !g.is_one() {
        return Err(Error::InvalidArgument(format!(
            "{} has no inverse modulo {}: operands are not coprime",
            a, m
        )));
    }

    Ok(math_mod(&x, m))
}

/// Number of bits needed to represent `n`. `bit_size(0) = 0`.
#[must_use]
pub fn bit_size(n: &BigUint) -> usize {
    n.bits() as usize
}

/// Number of bytes needed to represent `n`.
#[must_use]
pub fn byte_size(n: &BigUint) -> usize {
    ceil_div(bit_size(n), 8)
}

/// `ceil(dividend / divisor)` over machine integers.
#[must_use]
pub fn ceil_div(dividend: usize, divisor: usize) -> usize {
    let quotient = dividend / divisor;

    if dividend % divisor == 0 {
        quotient
    } else {
        quotient + 1
    }
}

/// Big-endian encoding of `n`.
///
/// With `length`, the output is left-padded with zeros to exactly that
/// many bytes and the call fails when `n` does not fit. Without it, the
/// output is minimal (`0` encodes as the empty string).
pub fn int_to_bytes(n: &BigUint, length: Option<usize>) -> Result<Vec<u8>> {
    let minimal = if n.is_zero() {
        Vec::new()
    } else {
        n.to_bytes_be()
    };

    match length {
        None => Ok(minimal),
        Some(length) if minimal.len() > length => Err(Error::Overflow(format!(
            "integer needs {} bytes, only space for {}",
            minimal.len(),
            length
        ))),
        Some(length) => {
            let mut out = vec![0; length - minimal.len()];
            out.extend_from_slice(&minimal);
            Ok(out)
        }
    }
}

/// Big-endian interpretation of `bytes`. The empty string reads as `0`.
#[must_use]
pub fn bytes_to_int(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

#[cfg(test)]
mod test {
    use num_bigint::{BigInt, BigUint};
    use num_traits::{One, Zero};

    use super::{bit_size, byte_size, bytes_to_int, ceil_div, egcd, int_to_bytes, modinv};
    use crate::error::Error;

    #[test]
    fn test_egcd() {
        let a = BigInt::from(3_usize);
        let b = BigInt::from(26_usize);
        let (gcd, x, y) = egcd(a.clone(), b.clone());

        assert_eq!(gcd, BigInt::from(1_usize));
        assert_eq!(a * x + b * y, gcd);
    }

    #[test]
    fn test_modinv() {
        assert_eq!(
            modinv(&BigUint::from(17_usize), &BigUint::from(3120_usize)),
            Ok(BigUint::from(2753_usize)),
        );

        // Inputs larger than the modulus are reduced first
        assert_eq!(
            modinv(&BigUint::from(3137_usize), &BigUint::from(3120_usize)),
            Ok(BigUint::from(2753_usize)),
        );
    }

    #[test]
    fn test_modinv_not_coprime() {
        let result = modinv(&BigUint::from(4_usize), &BigUint::from(8_usize));

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_modexp_edge_cases() {
        // The modexp primitive is `BigUint::modpow`; pin the two edge
        // cases the rest of the crate relies on.
        let five = BigUint::from(5_usize);

        assert_eq!(
            five.modpow(&BigUint::zero(), &BigUint::from(7_usize)),
            BigUint::one(),
        );
        assert_eq!(
            five.modpow(&BigUint::from(3_usize), &BigUint::one()),
            BigUint::zero(),
        );
    }

    #[test]
    fn test_bit_size() {
        assert_eq!(bit_size(&BigUint::zero()), 0);
        assert_eq!(bit_size(&BigUint::one()), 1);
        assert_eq!(bit_size(&BigUint::from(255_usize)), 8);
        assert_eq!(bit_size(&BigUint::from(256_usize)), 9);
    }

    #[test]
    fn test_byte_size() {
        assert_eq!(byte_size(&BigUint::from(255_usize)), 1);
        assert_eq!(byte_size(&BigUint::from(256_usize)), 2);
        assert_eq!(byte_size(&BigUint::from(0xffff_usize)), 2);
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(0, 8), 0);
        assert_eq!(ceil_div(1, 8), 1);
        assert_eq!(ceil_div(8, 8), 1);
        assert_eq!(ceil_div(9, 8), 2);
    }

    #[test]
    fn test_int_to_bytes_fixed_length() {
        assert_eq!(
            int_to_bytes(&BigUint::zero(), Some(4)).unwrap(),
            vec![0, 0, 0, 0],
        );
        assert_eq!(
            int_to_bytes(&BigUint::from(0x0102_usize), Some(4)).unwrap(),
            vec![0, 0, 1, 2],
        );
    }

    #[test]
    fn test_int_to_bytes_overflow() {
        let result = int_to_bytes(&BigUint::one(), Some(0));

        assert!(matches!(result, Err(Error::Overflow(_))));
    }

    #[test]
    fn test_int_to_bytes_minimal() {
        assert_eq!(int_to_bytes(&BigUint::zero(), None).unwrap(), vec![]);
        assert_eq!(
            int_to_bytes(&BigUint::from(0x0102_usize), None).unwrap(),
            vec![1, 2],
        );
    }

    #[test]
    fn test_bytes_to_int() {
        assert_eq!(bytes_to_int(b""), BigUint::zero());
        assert_eq!(bytes_to_int(&[1, 2]), BigUint::from(0x0102_usize));
        assert_eq!(bytes_to_int(&[0, 0, 1, 2]), BigUint::from(0x0102_usize));
    }

    #[test]
    fn test_round_trip() {
        let value = BigUint::from(0xdead_beef_usize);

        assert_eq!(
            bytes_to_int(&int_to_bytes(&value, Some(16)).unwrap()),
            value,
        );
    }
}
