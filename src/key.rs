//! RSA key material: structure invariants, generation, and the raw
//! integer operations the PKCS#1 layer builds on.

use log::debug;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

use crate::cancel::{self, CancelToken};
use crate::der;
use crate::error::{Error, Result};
use crate::math;
use crate::pem;
use crate::prime;

/// The Fermat prime `F4`, the conventional public exponent.
pub const DEFAULT_EXPONENT: u64 = 65_537;

/// Serialization formats understood by `load_pkcs1`/`save_pkcs1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Pem,
    Der,
}

/// An RSA public key: modulus `n` and public exponent `e`.
///
/// Allows encrypting a message (decryptable with the corresponding
/// private key) or verifying a signature (generated with the
/// corresponding private key). Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    n: BigUint,
    e: BigUint,
}

impl PublicKey {
    /// Construct from raw components, enforcing `e >= 3`, `e` odd and
    /// `e < n`.
    pub fn new(n: BigUint, e: BigUint) -> Result<PublicKey> {
        if e < BigUint::from(3_usize) || e.is_even() {
            return Err(Error::InvalidArgument(format!(
                "public exponent must be odd and at least 3, got {}",
                e
            )));
        }

        if e >= n {
            return Err(Error::InvalidArgument(
                "public exponent must be smaller than the modulus".to_owned(),
            ));
        }

        Ok(PublicKey { n, e })
    }

    #[must_use]
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    #[must_use]
    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Modulus size in bits.
    #[must_use]
    pub fn bit_size(&self) -> usize {
        math::bit_size(&self.n)
    }

    /// Size of ciphertexts and signatures under this key, in bytes.
    #[must_use]
    pub fn byte_length(&self) -> usize {
        math::byte_size(&self.n)
    }

    // Raw RSA: `message^e mod n`. The PKCS#1 layer frames the operand.
    pub(crate) fn encrypt_int(&self, message: &BigUint) -> BigUint {
        message.modpow(&self.e, &self.n)
    }

    /// Load a key from PKCS#1 `RSAPublicKey` material.
    pub fn load_pkcs1(data: &[u8], format: KeyFormat) -> Result<PublicKey> {
        match format {
            KeyFormat::Der => der::decode_public_key(data),
            KeyFormat::Pem => der::decode_public_key(&pem::decode(data, pem::PUBLIC_KEY_LABEL)?),
        }
    }

    /// Serialize to PKCS#1 `RSAPublicKey` material.
    #[must_use]
    pub fn save_pkcs1(&self, format: KeyFormat) -> Vec<u8> {
        let body = der::encode_public_key(self);

        match format {
            KeyFormat::Der => body,
            KeyFormat::Pem => pem::encode(&body, pem::PUBLIC_KEY_LABEL),
        }
    }
}

/// An RSA private key.
///
/// Holds `(n, e, d, p, q)` plus the derived CRT parameters
/// `exp1 = d mod (p-1)`, `exp2 = d mod (q-1)` and `coef = q^-1 mod p`.
/// `p > q` always holds; constructors swap the primes when needed.
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    n: BigUint,
    e: BigUint,
    d: BigUint,
    p: BigUint,
    q: BigUint,
    exp1: BigUint,
    exp2: BigUint,
    coef: BigUint,
}

impl PrivateKey {
    /// Assemble a key from `(n, e, d, p, q)`, deriving the CRT
    /// parameters. Swaps `p` and `q` so that `p > q`.
    pub fn new(n: BigUint, e: BigUint, d: BigUint, p: BigUint, q: BigUint) -> Result<PrivateKey> {
        if p == q {
            return Err(Error::InvalidArgument(
                "the two primes of a private key must differ".to_owned(),
            ));
        }

        let (p, q) = if p < q { (q, p) } else { (p, q) };

        if &p * &q != n {
            return Err(Error::InvalidArgument(
                "modulus is not the product of the key's primes".to_owned(),
            ));
        }

        let one = BigUint::one();
        let exp1 = &d % (&p - &one);
        let exp2 = &d % (&q - &one);
        let coef = math::modinv(&q, &p)?;

        Ok(PrivateKey {
            n,
            e,
            d,
            p,
            q,
            exp1,
            exp2,
            coef,
        })
    }

    #[must_use]
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    #[must_use]
    pub fn e(&self) -> &BigUint {
        &self.e
    }

    #[must_use]
    pub fn d(&self) -> &BigUint {
        &self.d
    }

    #[must_use]
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    #[must_use]
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// `d mod (p - 1)`.
    #[must_use]
    pub fn exp1(&self) -> &BigUint {
        &self.exp1
    }

    /// `d mod (q - 1)`.
    #[must_use]
    pub fn exp2(&self) -> &BigUint {
        &self.exp2
    }

    /// `q^-1 mod p`.
    #[must_use]
    pub fn coef(&self) -> &BigUint {
        &self.coef
    }

    /// Modulus size in bits.
    #[must_use]
    pub fn bit_size(&self) -> usize {
        math::bit_size(&self.n)
    }

    /// Size of ciphertexts and signatures under this key, in bytes.
    #[must_use]
    pub fn byte_length(&self) -> usize {
        math::byte_size(&self.n)
    }

    /// The public half of this key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            n: self.n.clone(),
            e: self.e.clone(),
        }
    }

    /// `ciphertext^d mod n`, computed through the CRT parameters and
    /// wrapped in multiplicative blinding.
    ///
    /// The modular arithmetic itself is not constant-time; the blinding
    /// factor (fresh per call, coprime to `n`) keeps the timing of the
    /// exponentiation decoupled from the ciphertext.
    pub fn blinded_decrypt<R>(&self, rng: &mut R, ciphertext: &BigUint) -> BigUint
    where
        R: RngCore + CryptoRng,
    {
        let (blinded, unblinder) = self.blind(rng, ciphertext);
        let decrypted = self.crt_decrypt(&blinded);

        decrypted * unblinder % &self.n
    }

    // (c * r^e mod n, r^-1 mod n) for a fresh r coprime to n.
    fn blind<R>(&self, rng: &mut R, ciphertext: &BigUint) -> (BigUint, BigUint)
    where
        R: RngCore + CryptoRng,
    {
        loop {
            let blinder = crate::rand::read_random_int(rng, &self.n);

            if let Ok(unblinder) = math::modinv(&blinder, &self.n) {
                let blinded = ciphertext * blinder.modpow(&self.e, &self.n) % &self.n;

                return (blinded, unblinder);
            }
        }
    }

    // CRT recombination: m_p = c^exp1 mod p, m_q = c^exp2 mod q,
    // m = ((m_p - m_q) * coef mod p) * q + m_q.
    fn crt_decrypt(&self, ciphertext: &BigUint) -> BigUint {
        let m_p = ciphertext.modpow(&self.exp1, &self.p);
        let m_q = ciphertext.modpow(&self.exp2, &self.q);

        // m_q < q < p, so adding p keeps the difference non-negative
        let h = (&m_p + &self.p - &m_q) * &self.coef % &self.p;

        h * &self.q + m_q
    }

    /// Load a key from PKCS#1 `RSAPrivateKey` material.
    pub fn load_pkcs1(data: &[u8], format: KeyFormat) -> Result<PrivateKey> {
        match format {
            KeyFormat::Der => der::decode_private_key(data),
            KeyFormat::Pem => der::decode_private_key(&pem::decode(data, pem::PRIVATE_KEY_LABEL)?),
        }
    }

    /// Serialize to PKCS#1 `RSAPrivateKey` material.
    #[must_use]
    pub fn save_pkcs1(&self, format: KeyFormat) -> Vec<u8> {
        let body = der::encode_private_key(self);

        match format {
            KeyFormat::Der => body,
            KeyFormat::Pem => pem::encode(&body, pem::PRIVATE_KEY_LABEL),
        }
    }
}

/// Generate a fresh keypair of exactly `nbits` modulus bits with the
/// conventional exponent, using operating-system entropy.
pub fn newkeys(nbits: usize) -> Result<(PublicKey, PrivateKey)> {
    newkeys_with(&mut OsRng, nbits, true, DEFAULT_EXPONENT, None)
}

/// Generate a keypair with full control over the parameters.
///
/// With `accurate` the modulus has exactly `nbits` bits (candidate prime
/// pairs whose product falls short are resampled); without it the
/// modulus may come out one bit small. `exponent` must be odd and at
/// least 3. A cancelled `cancel` token aborts the search with
/// [`Error::Cancelled`].
pub fn newkeys_with<R>(
    rng: &mut R,
    nbits: usize,
    accurate: bool,
    exponent: u64,
    cancel: Option<&CancelToken>,
) -> Result<(PublicKey, PrivateKey)>
where
    R: RngCore + CryptoRng,
{
    if nbits < 9 {
        return Err(Error::InvalidArgument(format!(
            "key size must be at least 9 bits, got {}",
            nbits
        )));
    }

    if exponent < 3 || exponent % 2 == 0 {
        return Err(Error::InvalidArgument(format!(
            "public exponent must be odd and at least 3, got {}",
            exponent
        )));
    }

    let e = BigUint::from(exponent);

    let (p, q) = find_p_q(rng, nbits, accurate, &e, cancel)?;

    let one = BigUint::one();
    let lambda = (&p - &one).lcm(&(&q - &one));
    let d = math::modinv(&e, &lambda)?;
    let n = &p * &q;

    let public = PublicKey::new(n.clone(), e.clone())?;
    let private = PrivateKey::new(n, e, d, p, q)?;

    Ok((public, private))
}

// Pick two primes whose product has `nbits` bits. Their individual
// sizes are offset by a small random shift so p and q do not align.
fn find_p_q<R>(
    rng: &mut R,
    nbits: usize,
    accurate: bool,
    e: &BigUint,
    cancel: Option<&CancelToken>,
) -> Result<(BigUint, BigUint)>
where
    R: RngCore + CryptoRng,
{
    let half = nbits / 2;
    let shift_cap = half / 16;
    let one = BigUint::one();

    loop {
        cancel::check(cancel)?;

        let shift = if shift_cap == 0 {
            0
        } else {
            rng.gen_range(0..=shift_cap)
        };
        let pbits = (nbits - half) + shift;
        let qbits = half - shift;

        let p = prime::getprime(rng, pbits, cancel)?;
        let q = prime::getprime(rng, qbits, cancel)?;

        if p == q {
            continue;
        }

        // d only exists when e is invertible modulo lcm(p-1, q-1);
        // checking against the product covers that
        let phi = (&p - &one) * (&q - &one);
        if !prime::are_relatively_prime(e, &phi) {
            debug!("discarding prime pair: e not coprime to (p-1)(q-1)");
            continue;
        }

        if accurate && math::bit_size(&(&p * &q)) != nbits {
            debug!("discarding prime pair: modulus missed {} bits", nbits);
            continue;
        }

        return Ok((p, q));
    }
}
