// OSC 1.0 message model and binary encoding
//
// Layout of an encoded message:
//   address     NUL-terminated, zero-padded to a multiple of 4 bytes
//   type tags   "," followed by one tag per argument, padded the same way
//   arguments   big-endian i32 / f32, strings padded like the address

use crate::error::TransportError;

/// A single OSC argument
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Str(String),
}

impl OscArg {
    fn tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
            OscArg::Str(_) => 's',
        }
    }
}

/// An OSC message: address pattern plus arguments
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    address: String,
    args: Vec<OscArg>,
}

impl OscMessage {
    /// Create a message, checking the address
    ///
    /// # Errors
    /// `InvalidAddress` if the address is not of the form `/part/part`.
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Result<Self, TransportError> {
        let address = address.into();
        validate_address(&address)?;
        Ok(Self { address, args })
    }

    /// Message carrying one float
    pub fn float(address: impl Into<String>, value: f32) -> Result<Self, TransportError> {
        Self::new(address, vec![OscArg::Float(value)])
    }

    /// Message carrying one int
    pub fn int(address: impl Into<String>, value: i32) -> Result<Self, TransportError> {
        Self::new(address, vec![OscArg::Int(value)])
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn args(&self) -> &[OscArg] {
        &self.args
    }

    /// Encode to the OSC 1.0 wire format
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.address.len() + 8 + 4 * self.args.len());
        write_padded_str(&mut out, &self.address);

        let tags: String = std::iter::once(',').chain(self.args.iter().map(OscArg::tag)).collect();
        write_padded_str(&mut out, &tags);

        for arg in &self.args {
            match arg {
                OscArg::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
                OscArg::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
                OscArg::Str(s) => write_padded_str(&mut out, s),
            }
        }
        out
    }
}

/// Check an address pattern: leading '/', non-empty parts, no OSC
/// reserved characters or whitespace
pub fn validate_address(address: &str) -> Result<(), TransportError> {
    let invalid = || TransportError::InvalidAddress {
        address: address.to_string(),
    };

    let rest = address.strip_prefix('/').ok_or_else(invalid)?;
    if rest.is_empty() {
        return Err(invalid());
    }
    for part in rest.split('/') {
        if part.is_empty() {
            return Err(invalid());
        }
        let forbidden = |c: char| {
            c.is_whitespace()
                || c.is_control()
                || matches!(c, '#' | '*' | ',' | '?' | '[' | ']' | '{' | '}')
        };
        if part.chars().any(forbidden) {
            return Err(invalid());
        }
    }
    Ok(())
}

fn write_padded_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
    while out.len() % 4 != 0 {
        out.push(0);
    }
}
