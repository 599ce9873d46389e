//! Minimal DER support
//!
//! Just enough ASN.1 to lay out the two X25519 key records: SEQUENCE,
//! small INTEGER, OCTET STRING, BIT STRING and OBJECT IDENTIFIER, all with
//! definite lengths.

use std::fmt;

use crate::errors::{CryptoError, CryptoResult};

/// Universal tag for INTEGER
pub const TAG_INTEGER: u8 = 0x02;
/// Universal tag for BIT STRING
pub const TAG_BIT_STRING: u8 = 0x03;
/// Universal tag for OCTET STRING
pub const TAG_OCTET_STRING: u8 = 0x04;
/// Universal tag for OBJECT IDENTIFIER
pub const TAG_OID: u8 = 0x06;
/// Constructed SEQUENCE tag
pub const TAG_SEQUENCE: u8 = 0x30;

/// Arcs of id-X25519 (RFC 8410)
pub const X25519_ARCS: [u64; 4] = [1, 3, 101, 110];

/// An ASN.1 object identifier, stored as its arcs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier {
    arcs: Vec<u64>,
}

impl ObjectIdentifier {
    /// Build an identifier from its arcs
    ///
    /// Needs at least two arcs; the first must be 0, 1 or 2 and, under
    /// 0 and 1, the second must be below 40.
    pub fn new(arcs: &[u64]) -> CryptoResult<Self> {
        if arcs.len() < 2 {
            return Err(CryptoError::MalformedAsn1(
                "object identifier needs at least two arcs".into(),
            ));
        }
        if arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
            return Err(CryptoError::MalformedAsn1(format!(
                "invalid leading arcs {}.{}",
                arcs[0], arcs[1]
            )));
        }
        if arcs[0] == 2 && arcs[1] > u64::MAX - 80 {
            return Err(CryptoError::MalformedAsn1("arc out of range".into()));
        }
        Ok(Self {
            arcs: arcs.to_vec(),
        })
    }

    /// id-X25519, 1.3.101.110
    pub fn x25519() -> Self {
        Self {
            arcs: X25519_ARCS.to_vec(),
        }
    }

    /// The arcs of this identifier
    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    /// DER content octets (without tag and length)
    pub fn to_der_content(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.arcs.len() + 1);
        push_base128(&mut out, self.arcs[0] * 40 + self.arcs[1]);
        for &arc in &self.arcs[2..] {
            push_base128(&mut out, arc);
        }
        out
    }

    /// Parse DER content octets (without tag and length)
    pub fn from_der_content(content: &[u8]) -> CryptoResult<Self> {
        if content.is_empty() {
            return Err(CryptoError::MalformedAsn1(
                "empty object identifier".into(),
            ));
        }

        let mut subids = Vec::new();
        let mut value: u64 = 0;
        let mut in_progress = false;
        for &byte in content {
            // 0x80 as the first octet of a subidentifier is a non-minimal encoding
            if !in_progress && byte == 0x80 {
                return Err(CryptoError::MalformedAsn1(
                    "non-minimal object identifier arc".into(),
                ));
            }
            if value > (u64::MAX >> 7) {
                return Err(CryptoError::MalformedAsn1(
                    "object identifier arc overflows".into(),
                ));
            }
            value = (value << 7) | u64::from(byte & 0x7f);
            if byte & 0x80 == 0 {
                subids.push(value);
                value = 0;
                in_progress = false;
            } else {
                in_progress = true;
            }
        }
        if in_progress {
            return Err(CryptoError::MalformedAsn1(
                "truncated object identifier".into(),
            ));
        }

        let first = subids[0];
        let (a, b) = match first {
            0..=39 => (0, first),
            40..=79 => (1, first - 40),
            _ => (2, first - 80),
        };
        let mut arcs = Vec::with_capacity(subids.len() + 1);
        arcs.push(a);
        arcs.push(b);
        arcs.extend_from_slice(&subids[1..]);
        Ok(Self { arcs })
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

fn push_base128(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = [0u8; 10];
    let mut n = 0;
    loop {
        groups[n] = (value & 0x7f) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}

/// Append a DER definite length
fn push_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// Parse a DER definite length, returning (length, octets consumed)
fn parse_length(data: &[u8]) -> CryptoResult<(usize, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| CryptoError::MalformedAsn1("missing length".into()))?;

    if first < 0x80 {
        return Ok((first as usize, 1));
    }

    let num_bytes = (first & 0x7f) as usize;
    if num_bytes == 0 {
        return Err(CryptoError::MalformedAsn1(
            "indefinite length not allowed in DER".into(),
        ));
    }
    if num_bytes > std::mem::size_of::<usize>() || data.len() <= num_bytes {
        return Err(CryptoError::MalformedAsn1("length out of range".into()));
    }
    if data[1] == 0 {
        return Err(CryptoError::MalformedAsn1("non-minimal length".into()));
    }

    let mut len = 0usize;
    for &b in &data[1..=num_bytes] {
        len = (len << 8) | b as usize;
    }
    if len < 0x80 {
        return Err(CryptoError::MalformedAsn1("non-minimal length".into()));
    }
    Ok((len, 1 + num_bytes))
}

/// Builds a DER byte string front to back
#[derive(Debug, Default)]
pub struct DerWriter {
    buf: Vec<u8>,
}

impl DerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn tlv(&mut self, tag: u8, content: &[u8]) -> &mut Self {
        self.buf.push(tag);
        push_length(&mut self.buf, content.len());
        self.buf.extend_from_slice(content);
        self
    }

    /// Write a SEQUENCE whose body is produced by `body`
    pub fn sequence(&mut self, body: impl FnOnce(&mut DerWriter)) -> &mut Self {
        let mut inner = DerWriter::new();
        body(&mut inner);
        self.tlv(TAG_SEQUENCE, &inner.buf)
    }

    /// Write a non-negative INTEGER in minimal two's complement form
    pub fn integer(&mut self, value: u64) -> &mut Self {
        let bytes = value.to_be_bytes();
        let skip = bytes
            .iter()
            .take_while(|&&b| b == 0)
            .count()
            .min(bytes.len() - 1);
        let mut content = Vec::with_capacity(9);
        if bytes[skip] & 0x80 != 0 {
            content.push(0);
        }
        content.extend_from_slice(&bytes[skip..]);
        self.tlv(TAG_INTEGER, &content)
    }

    pub fn octet_string(&mut self, bytes: &[u8]) -> &mut Self {
        self.tlv(TAG_OCTET_STRING, bytes)
    }

    /// Write a BIT STRING covering every bit of `bytes` (no unused bits)
    pub fn bit_string(&mut self, bytes: &[u8]) -> &mut Self {
        let mut content = Vec::with_capacity(bytes.len() + 1);
        content.push(0);
        content.extend_from_slice(bytes);
        self.tlv(TAG_BIT_STRING, &content)
    }

    pub fn oid(&mut self, oid: &ObjectIdentifier) -> &mut Self {
        self.tlv(TAG_OID, &oid.to_der_content())
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a DER byte string
#[derive(Debug, Clone)]
pub struct DerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// True once every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read one TLV with the given tag and return its content
    pub fn read_tlv(&mut self, tag: u8) -> CryptoResult<&'a [u8]> {
        let rest = &self.data[self.pos..];
        let found = *rest.first().ok_or_else(|| {
            CryptoError::MalformedAsn1(format!("expected tag 0x{:02x}, found end of data", tag))
        })?;
        if found != tag {
            return Err(CryptoError::MalformedAsn1(format!(
                "expected tag 0x{:02x}, found 0x{:02x}",
                tag, found
            )));
        }

        let (len, header) = parse_length(&rest[1..])?;
        let start = 1 + header;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= rest.len())
            .ok_or_else(|| CryptoError::MalformedAsn1("element overruns input".into()))?;

        self.pos += end;
        Ok(&rest[start..end])
    }

    /// Read a SEQUENCE and return a reader over its body
    pub fn read_sequence(&mut self) -> CryptoResult<DerReader<'a>> {
        self.read_tlv(TAG_SEQUENCE).map(DerReader::new)
    }

    /// Read a non-negative INTEGER that fits in a u64
    pub fn read_integer(&mut self) -> CryptoResult<u64> {
        let content = self.read_tlv(TAG_INTEGER)?;
        match content {
            [] => Err(CryptoError::MalformedAsn1("empty integer".into())),
            [first, ..] if *first & 0x80 != 0 => {
                Err(CryptoError::MalformedAsn1("negative integer".into()))
            }
            [0, second, ..] if *second & 0x80 == 0 => {
                Err(CryptoError::MalformedAsn1("non-minimal integer".into()))
            }
            _ => {
                let digits = if content[0] == 0 { &content[1..] } else { content };
                if digits.len() > 8 {
                    return Err(CryptoError::MalformedAsn1("integer too large".into()));
                }
                Ok(digits.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
            }
        }
    }

    pub fn read_octet_string(&mut self) -> CryptoResult<&'a [u8]> {
        self.read_tlv(TAG_OCTET_STRING)
    }

    /// Read a BIT STRING, which must have no unused trailing bits
    pub fn read_bit_string(&mut self) -> CryptoResult<&'a [u8]> {
        let content = self.read_tlv(TAG_BIT_STRING)?;
        match content.split_first() {
            Some((0, bits)) => Ok(bits),
            Some((unused, _)) => Err(CryptoError::MalformedAsn1(format!(
                "bit string has {} unused bits",
                unused
            ))),
            None => Err(CryptoError::MalformedAsn1("empty bit string".into())),
        }
    }

    pub fn read_oid(&mut self) -> CryptoResult<ObjectIdentifier> {
        let content = self.read_tlv(TAG_OID)?;
        ObjectIdentifier::from_der_content(content)
    }

    /// Fail if any bytes remain
    pub fn finish(self) -> CryptoResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CryptoError::MalformedAsn1(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )))
        }
    }
}
