//! Probabilistic prime generation: small-prime trial division followed
//! by Miller-Rabin witness testing.

use log::debug;
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::cancel::{self, CancelToken};
use crate::error::{Error, Result};
use crate::math;
use crate::rand::read_random_odd_int;

const SMALL_PRIME_LIMIT: usize = 1000;

/// Primes below 1000, for cheap trial division ahead of Miller-Rabin.
static SMALL_PRIMES: Lazy<Vec<BigUint>> = Lazy::new(|| {
    let mut primes = vec![2_usize];

    for x in (3..SMALL_PRIME_LIMIT).step_by(2) {
        let is_prime = primes.iter().all(|&prime| x % prime != 0);

        if is_prime {
            primes.push(x);
        }
    }

    primes.into_iter().map(BigUint::from).collect()
});

// Trial division verdict: `Some(true)` when the candidate is one of the
// small primes, `Some(false)` when one of them divides it, `None` when
// the candidate survives and needs a real test.
fn trial_division(candidate: &BigUint) -> Option<bool> {
    for prime in SMALL_PRIMES.iter() {
        if candidate == prime {
            return Some(true);
        }

        if (candidate % prime).is_zero() {
            return Some(false);
        }
    }

    None
}

// Witness rounds to push the false-positive probability below 2^-80,
// per the FIPS 186-4 appendix C.3 table.
fn miller_rabin_rounds(candidate: &BigUint) -> usize {
    let bits = math::bit_size(candidate);

    if bits >= 1536 {
        3
    } else if bits >= 1024 {
        4
    } else if bits >= 512 {
        7
    } else {
        10
    }
}

// Rewrite `n - 1` into `2^r * s` with odd `s`.
fn rewrite(mut s: BigUint) -> (u64, BigUint) {
    let mut r = 0;

    while s.is_even() {
        s >>= 1;
        r += 1;
    }

    (r, s)
}

// [Miller-Rabin primality test](https://en.wikipedia.org/wiki/Miller%E2%80%93Rabin_primality_test)
// over an odd candidate > 3.
fn miller_rabin<R>(
    rng: &mut R,
    candidate: &BigUint,
    rounds: usize,
    cancel: Option<&CancelToken>,
) -> Result<bool>
where
    R: RngCore + CryptoRng,
{
    let one = BigUint::one();
    let two = &one + &one;
    let candidate_minus_one = candidate - &one;

    let (r, s) = rewrite(candidate_minus_one.clone());

    for _ in 0..rounds {
        cancel::check(cancel)?;

        // Witness in [2, candidate - 2]
        let witness = rng.gen_biguint_range(&two, &candidate_minus_one);

        let mut v = witness.modpow(&s, candidate);

        if v.is_one() || v == candidate_minus_one {
            continue;
        }

        let mut is_witness_passed = false;

        for _ in 1..r {
            v = v.modpow(&two, candidate);

            if v == candidate_minus_one {
                is_witness_passed = true;
                break;
            }

            // A non-trivial square root of 1 proves compositeness
            if v.is_one() {
                return Ok(false);
            }
        }

        if !is_witness_passed {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Primality check with an operating-system entropy source and no
/// cancellation. See [`is_probable_prime_with`].
#[must_use]
pub fn is_probable_prime(candidate: &BigUint) -> bool {
    matches!(
        is_probable_prime_with(&mut OsRng, candidate, None),
        Ok(true)
    )
}

/// Probabilistic primality check.
///
/// Candidates below 1000 and candidates with a factor below 1000 are
/// decided by trial division; the rest get Miller-Rabin with a round
/// count keyed on the candidate's bit size. Only fails with
/// [`Error::Cancelled`].
pub fn is_probable_prime_with<R>(
    rng: &mut R,
    candidate: &BigUint,
    cancel: Option<&CancelToken>,
) -> Result<bool>
where
    R: RngCore + CryptoRng,
{
    let two = BigUint::from(2_usize);
    let three = BigUint::from(3_usize);

    if candidate < &two {
        return Ok(false);
    }

    if candidate == &two || candidate == &three {
        return Ok(true);
    }

    if let Some(verdict) = trial_division(candidate) {
        return Ok(verdict);
    }

    miller_rabin(rng, candidate, miller_rabin_rounds(candidate), cancel)
}

/// Generate a prime of exactly `nbits` bits.
pub fn getprime<R>(rng: &mut R, nbits: usize, cancel: Option<&CancelToken>) -> Result<BigUint>
where
    R: RngCore + CryptoRng,
{
    if nbits < 2 {
        return Err(Error::InvalidArgument(format!(
            "cannot generate a {}-bit prime",
            nbits
        )));
    }

    let mut candidates = 0_usize;

    loop {
        cancel::check(cancel)?;

        candidates += 1;
        let candidate = read_random_odd_int(rng, nbits);

        if is_probable_prime_with(rng, &candidate, cancel)? {
            debug!("found {}-bit prime after {} candidates", nbits, candidates);
            return Ok(candidate);
        }
    }
}

/// Whether `gcd(a, b) = 1`.
#[must_use]
pub fn are_relatively_prime(a: &BigUint, b: &BigUint) -> bool {
    a.gcd(b).is_one()
}
