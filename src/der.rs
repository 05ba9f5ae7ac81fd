//! DER codec for the two PKCS#1 key shapes.
//!
//! This is deliberately not a general ASN.1 library: it encodes and
//! parses exactly `RSAPublicKey` and `RSAPrivateKey` (RFC 8017 appendix
//! A.1), i.e. SEQUENCEs of non-negative INTEGERs with definite lengths.

use log::warn;
use num_bigint::BigUint;

use crate::error::{Error, Result};
use crate::key::{PrivateKey, PublicKey};

const TAG_INTEGER: u8 = 0x02;
const TAG_SEQUENCE: u8 = 0x30;

fn encode_length(out: &mut Vec<u8>, length: usize) {
    if length < 0x80 {
        out.push(length as u8);
        return;
    }

    let mut be = length.to_be_bytes().to_vec();
    while be.len() > 1 && be[0] == 0 {
        be.remove(0);
    }

    out.push(0x80 | be.len() as u8);
    out.extend_from_slice(&be);
}

// Minimum-length two's complement INTEGER; a leading 0x00 keeps values
// with the high bit set non-negative.
fn encode_uint(out: &mut Vec<u8>, value: &BigUint) {
    let mut content = value.to_bytes_be();

    if content[0] & 0x80 != 0 {
        content.insert(0, 0x00);
    }

    out.push(TAG_INTEGER);
    encode_length(out, content.len());
    out.extend_from_slice(&content);
}

fn encode_sequence(fields: &[&BigUint]) -> Vec<u8> {
    let mut body = Vec::new();

    for field in fields {
        encode_uint(&mut body, field);
    }

    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(TAG_SEQUENCE);
    encode_length(&mut out, body.len());
    out.extend_from_slice(&body);

    out
}

/// `RSAPublicKey ::= SEQUENCE { modulus, publicExponent }`
#[must_use]
pub fn encode_public_key(key: &PublicKey) -> Vec<u8> {
    encode_sequence(&[key.n(), key.e()])
}

/// `RSAPrivateKey ::= SEQUENCE { version, n, e, d, p, q, exp1, exp2, coef }`
#[must_use]
pub fn encode_private_key(key: &PrivateKey) -> Vec<u8> {
    let version = BigUint::from(0_usize);

    encode_sequence(&[
        &version,
        key.n(),
        key.e(),
        key.d(),
        key.p(),
        key.q(),
        key.exp1(),
        key.exp2(),
        key.coef(),
    ])
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8]) -> Reader<'a> {
        Reader { input, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8> {
        let bytes = self.take(1)?;
        Ok(bytes[0])
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.input.len() - self.pos < count {
            return Err(Error::Codec("truncated DER structure".to_owned()));
        }

        let bytes = &self.input[self.pos..self.pos + count];
        self.pos += count;

        Ok(bytes)
    }

    fn expect_tag(&mut self, tag: u8) -> Result<()> {
        let found = self.byte()?;

        if found != tag {
            return Err(Error::Codec(format!(
                "expected DER tag 0x{:02x}, found 0x{:02x}",
                tag, found
            )));
        }

        Ok(())
    }

    // Definite length, short or long form
    fn length(&mut self) -> Result<usize> {
        let first = self.byte()?;

        if first & 0x80 == 0 {
            return Ok(first as usize);
        }

        let count = (first & 0x7f) as usize;
        if count == 0 || count > std::mem::size_of::<usize>() {
            return Err(Error::Codec(
                "indefinite or oversized DER length".to_owned(),
            ));
        }

        let mut length = 0_usize;
        for _ in 0..count {
            length = length << 8 | self.byte()? as usize;
        }

        Ok(length)
    }

    fn uint(&mut self) -> Result<BigUint> {
        self.expect_tag(TAG_INTEGER)?;
        let length = self.length()?;
        let content = self.take(length)?;

        if content.is_empty() {
            return Err(Error::Codec("empty DER integer".to_owned()));
        }

        if content[0] & 0x80 != 0 {
            return Err(Error::Codec(
                "negative integer in key material".to_owned(),
            ));
        }

        Ok(BigUint::from_bytes_be(content))
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.input.len() {
            return Err(Error::Codec("trailing garbage after DER structure".to_owned()));
        }

        Ok(())
    }
}

// Unwrap the outer SEQUENCE, rejecting anything before or after it
fn sequence_body(data: &[u8]) -> Result<&[u8]> {
    let mut outer = Reader::new(data);

    outer.expect_tag(TAG_SEQUENCE)?;
    let length = outer.length()?;
    let body = outer.take(length)?;
    outer.finish()?;

    Ok(body)
}

/// Parse an `RSAPublicKey` structure.
pub fn decode_public_key(data: &[u8]) -> Result<PublicKey> {
    let mut fields = Reader::new(sequence_body(data)?);

    let n = fields.uint()?;
    let e = fields.uint()?;
    fields.finish()?;

    PublicKey::new(n, e)
}

/// Parse an `RSAPrivateKey` structure.
///
/// The stored CRT parameters are read but the key is rebuilt from
/// `(n, e, d, p, q)`; a file whose stored values disagree with the
/// recomputed ones is accepted with a warning.
pub fn decode_private_key(data: &[u8]) -> Result<PrivateKey> {
    let mut fields = Reader::new(sequence_body(data)?);

    let version = fields.uint()?;
    if version != BigUint::from(0_usize) {
        return Err(Error::Codec(format!(
            "unsupported RSAPrivateKey version {}",
            version
        )));
    }

    let n = fields.uint()?;
    let e = fields.uint()?;
    let d = fields.uint()?;
    let p = fields.uint()?;
    let q = fields.uint()?;
    let exp1 = fields.uint()?;
    let exp2 = fields.uint()?;
    let coef = fields.uint()?;
    fields.finish()?;

    let key = PrivateKey::new(n, e, d, p, q)?;

    if &exp1 != key.exp1() || &exp2 != key.exp2() || &coef != key.coef() {
        warn!("stored CRT parameters disagree with p, q and d; using recomputed values");
    }

    Ok(key)
}

#[cfg(test)]
mod test {
    use num_bigint::BigUint;

    use super::{decode_private_key, decode_public_key, encode_private_key, encode_public_key};
    use crate::error::Error;
    use crate::key::{PrivateKey, PublicKey};

    fn fixture_public() -> PublicKey {
        PublicKey::new(BigUint::from(3233_usize), BigUint::from(17_usize)).unwrap()
    }

    fn fixture_private() -> PrivateKey {
        PrivateKey::new(
            BigUint::from(3233_usize),
            BigUint::from(17_usize),
            BigUint::from(413_usize),
            BigUint::from(61_usize),
            BigUint::from(53_usize),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_public_key_exact_bytes() {
        // SEQUENCE { INTEGER 3233, INTEGER 17 }
        assert_eq!(
            encode_public_key(&fixture_public()),
            hex::decode("300702020ca1020111").unwrap(),
        );
    }

    #[test]
    fn test_encode_private_key_exact_bytes() {
        // SEQUENCE { 0, 3233, 17, 413, 61, 53, 53, 49, 38 }
        let expected = hex::decode(concat!(
            "301d",
            "020100",   // version
            "02020ca1", // n = 3233
            "020111",   // e = 17
            "0202019d", // d = 413
            "02013d",   // p = 61
            "020135",   // q = 53
            "020135",   // exp1 = 53
            "020131",   // exp2 = 49
            "020126",   // coef = 38
        ))
        .unwrap();

        assert_eq!(encode_private_key(&fixture_private()), expected);
    }

    #[test]
    fn test_high_bit_gets_zero_prefix() {
        // A modulus whose leading byte has the high bit set must pick up
        // a 0x00 prefix: INTEGER 0x80FF encodes as 02 03 00 80 FF
        let key = PublicKey::new(BigUint::from(0x80ff_usize), BigUint::from(17_usize)).unwrap();
        let der = encode_public_key(&key);

        assert_eq!(&der[2..7], &[0x02, 0x03, 0x00, 0x80, 0xff]);
    }

    #[test]
    fn test_public_key_round_trip() {
        let key = fixture_public();

        assert_eq!(decode_public_key(&encode_public_key(&key)).unwrap(), key);
    }

    #[test]
    fn test_private_key_round_trip() {
        let key = fixture_private();

        assert_eq!(decode_private_key(&encode_private_key(&key)).unwrap(), key);
    }

    #[test]
    fn test_reject_trailing_garbage() {
        let mut der = encode_public_key(&fixture_public());
        der.push(0x00);

        assert!(matches!(decode_public_key(&der), Err(Error::Codec(_))));
    }

    #[test]
    fn test_reject_truncated() {
        let der = encode_private_key(&fixture_private());

        assert!(matches!(
            decode_private_key(&der[..der.len() - 1]),
            Err(Error::Codec(_))
        ));
    }

    #[test]
    fn test_reject_negative_integer() {
        // SEQUENCE { INTEGER -1, INTEGER 17 }
        let der = hex::decode("30060201ff020111").unwrap();

        assert!(matches!(decode_public_key(&der), Err(Error::Codec(_))));
    }

    #[test]
    fn test_reject_bad_version() {
        let mut der = encode_private_key(&fixture_private());
        // version INTEGER content is at offset 4
        der[4] = 0x01;

        let result = decode_private_key(&der);

        assert!(matches!(result, Err(Error::Codec(_))));
    }

    #[test]
    fn test_reject_wrong_outer_tag() {
        let mut der = encode_public_key(&fixture_public());
        der[0] = 0x31;

        assert!(matches!(decode_public_key(&der), Err(Error::Codec(_))));
    }

    #[test]
    fn test_reject_indefinite_length() {
        let der = [0x30, 0x80, 0x02, 0x01, 0x05, 0x00, 0x00];

        assert!(matches!(decode_public_key(&der), Err(Error::Codec(_))));
    }
}
