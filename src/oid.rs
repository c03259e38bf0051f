//! Object identifier type.
//!
//! OIDs are stored as a small inline vector of arcs; the tables this crate
//! walks rarely exceed 16 arcs, so most OIDs never touch the heap.

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::{Error, OidErrorKind, Result};

/// Maximum number of arcs accepted when parsing or decoding.
pub const MAX_OID_LEN: usize = 128;

/// An SNMP object identifier.
///
/// Ordering is lexicographic over the arcs, which is the order agents
/// return entries in during a walk.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

/// Build an [`Oid`] from literal arcs.
///
/// ```
/// use dot1q_discovery::oid;
/// let if_type = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3);
/// assert_eq!(if_type.to_string(), "1.3.6.1.2.1.2.2.1.3");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),+ $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),+])
    };
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an OID from a slice of arcs. No validation is performed.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse dotted notation (`1.3.6.1.2.1.1`, a leading dot is accepted).
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut arcs = SmallVec::new();
        for part in body.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }

        if arcs.len() < 2 {
            return Err(Error::invalid_oid_with_input(OidErrorKind::TooShort, s));
        }
        if arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::TooManyArcs {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                },
                s,
            ));
        }
        if arcs[0] > 2 {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::InvalidFirstArc(arcs[0]),
                s,
            ));
        }

        Ok(Self { arcs })
    }

    /// The arcs of this OID.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// True if `prefix` is a prefix of (or equal to) this OID.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.starts_with(&prefix.arcs)
    }

    /// True if this OID lies strictly below `root`.
    pub fn is_descendant_of(&self, root: &Oid) -> bool {
        self.arcs.len() > root.arcs.len() && self.starts_with(root)
    }

    /// Arcs below `root`, or `None` if this OID is not a strict descendant.
    pub fn suffix(&self, root: &Oid) -> Option<&[u32]> {
        if self.is_descendant_of(root) {
            Some(&self.arcs[root.arcs.len()..])
        } else {
            None
        }
    }

    /// A new OID with one more arc appended.
    pub fn child(&self, arc: u32) -> Self {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Self { arcs }
    }

    /// BER content octets of this OID (no tag or length).
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut out = SmallVec::new();
        let arcs = &self.arcs;
        if arcs.is_empty() {
            return out;
        }

        let first = if arcs.len() == 1 {
            u64::from(arcs[0]) * 40
        } else {
            u64::from(arcs[0]) * 40 + u64::from(arcs[1])
        };
        push_subidentifier(&mut out, first);
        for &arc in arcs.iter().skip(2) {
            push_subidentifier(&mut out, u64::from(arc));
        }
        out
    }

    /// Decode BER content octets (no tag or length).
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::malformed(
                0,
                crate::error::BerErrorKind::InvalidOidEncoding,
            ));
        }

        let mut arcs: SmallVec<[u32; 16]> = SmallVec::new();
        let mut value: u64 = 0;
        let mut in_progress = false;

        for (i, &byte) in data.iter().enumerate() {
            value = (value << 7) | u64::from(byte & 0x7F);
            in_progress = true;
            if value > u64::from(u32::MAX) + 80 {
                return Err(Error::malformed(
                    i,
                    crate::error::BerErrorKind::InvalidOidEncoding,
                ));
            }
            if byte & 0x80 == 0 {
                if arcs.is_empty() {
                    let (a, b) = match value {
                        v if v < 40 => (0, v),
                        v if v < 80 => (1, v - 40),
                        v => (2, v - 80),
                    };
                    arcs.push(a);
                    arcs.push(u32::try_from(b).map_err(|_| {
                        Error::malformed(i, crate::error::BerErrorKind::InvalidOidEncoding)
                    })?);
                } else {
                    arcs.push(u32::try_from(value).map_err(|_| {
                        Error::malformed(i, crate::error::BerErrorKind::InvalidOidEncoding)
                    })?);
                }
                if arcs.len() > MAX_OID_LEN {
                    return Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
                        count: arcs.len(),
                        max: MAX_OID_LEN,
                    }));
                }
                value = 0;
                in_progress = false;
            }
        }

        if in_progress {
            return Err(Error::malformed(
                data.len(),
                crate::error::BerErrorKind::InvalidOidEncoding,
            ));
        }

        Ok(Self { arcs })
    }
}

fn push_subidentifier(out: &mut SmallVec<[u8; 64]>, value: u64) {
    let mut tmp = [0u8; 10];
    let mut n = 0;
    let mut v = value;
    loop {
        tmp[n] = (v & 0x7F) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(tmp[i] | continuation);
    }
}

impl fmt::Display for Oid {
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

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}
