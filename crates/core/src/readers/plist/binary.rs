//! `bplist00` decoding.
//!
//! Layout: 8-byte magic, object table, offset table, 32-byte trailer. The
//! trailer gives the width of offsets and object references, the object
//! count, the index of the top object and where the offset table starts.

use chrono::{DateTime, Utc};

use super::FORMAT;
use crate::document::{Dictionary, Value};
use crate::error::ReadError;

const HEADER_LEN: usize = 8;
const TRAILER_LEN: usize = 32;

/// Deepest container nesting accepted before the file is rejected.
const MAX_DEPTH: usize = 256;

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
const APPLE_EPOCH_OFFSET: f64 = 978_307_200.0;

pub(super) fn parse(raw: &[u8]) -> Result<Value, ReadError> {
    let trailer = Trailer::read(raw)?;
    let mut decoder = Decoder {
        raw,
        visiting: vec![false; trailer.num_objects],
        depth: 0,
        trailer,
    };
    decoder.object(decoder.trailer.top_object)
}

fn malformed(detail: impl Into<String>) -> ReadError {
    ReadError::malformed(FORMAT, detail)
}

/// Big-endian unsigned integer of up to eight bytes.
fn be_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

fn to_usize(v: u64) -> Result<usize, ReadError> {
    usize::try_from(v).map_err(|_| malformed("offset does not fit in memory"))
}

struct Trailer {
    offset_size: usize,
    ref_size: usize,
    num_objects: usize,
    top_object: usize,
    offset_table: usize,
}

impl Trailer {
    fn read(raw: &[u8]) -> Result<Self, ReadError> {
        if raw.len() < HEADER_LEN + TRAILER_LEN {
            return Err(malformed("binary property list is truncated"));
        }
        let trailer_start = raw.len() - TRAILER_LEN;
        let t = &raw[trailer_start..];

        let trailer = Trailer {
            offset_size: usize::from(t[6]),
            ref_size: usize::from(t[7]),
            num_objects: to_usize(be_uint(&t[8..16]))?,
            top_object: to_usize(be_uint(&t[16..24]))?,
            offset_table: to_usize(be_uint(&t[24..32]))?,
        };

        if !(1..=8).contains(&trailer.offset_size) || !(1..=8).contains(&trailer.ref_size) {
            return Err(malformed("invalid offset or reference width in trailer"));
        }
        if trailer.top_object >= trailer.num_objects {
            return Err(malformed("top object index out of range"));
        }
        let table_end = trailer
            .num_objects
            .checked_mul(trailer.offset_size)
            .and_then(|len| len.checked_add(trailer.offset_table));
        match table_end {
            Some(end) if trailer.offset_table >= HEADER_LEN && end <= trailer_start => {}
            _ => return Err(malformed("offset table out of range")),
        }
        Ok(trailer)
    }
}

struct Decoder<'a> {
    raw: &'a [u8],
    trailer: Trailer,
    /// Objects on the current decoding path; revisiting one means a cycle.
    visiting: Vec<bool>,
    depth: usize,
}

impl Decoder<'_> {
    fn slice(&self, start: usize, len: usize) -> Result<&[u8], ReadError> {
        start
            .checked_add(len)
            .and_then(|end| self.raw.get(start..end))
            .ok_or_else(|| malformed("object extends past end of file"))
    }

    fn offset_of(&self, index: usize) -> Result<usize, ReadError> {
        let entry = self.trailer.offset_table + index * self.trailer.offset_size;
        let offset = to_usize(be_uint(self.slice(entry, self.trailer.offset_size)?))?;
        if offset < HEADER_LEN || offset >= self.trailer.offset_table {
            return Err(malformed(format!("object {index} has invalid offset {offset}")));
        }
        Ok(offset)
    }

    fn reference(&self, at: usize) -> Result<usize, ReadError> {
        to_usize(be_uint(self.slice(at, self.trailer.ref_size)?))
    }

    fn object(&mut self, index: usize) -> Result<Value, ReadError> {
        if index >= self.trailer.num_objects {
            return Err(malformed(format!("object reference {index} out of range")));
        }
        if self.visiting[index] {
            return Err(malformed(format!("object {index} references itself")));
        }
        if self.depth >= MAX_DEPTH {
            return Err(malformed("nesting too deep"));
        }
        let offset = self.offset_of(index)?;
        self.visiting[index] = true;
        self.depth += 1;
        let value = self.decode_at(offset);
        self.depth -= 1;
        self.visiting[index] = false;
        value
    }

    /// Length encoded in the marker's low nibble, or in a following integer
    /// object when the nibble is 0xF. Returns the length and where content starts.
    fn length(&self, info: u8, body: usize) -> Result<(usize, usize), ReadError> {
        if info != 0x0F {
            return Ok((usize::from(info), body));
        }
        let marker = self.slice(body, 1)?[0];
        if marker >> 4 != 0x1 || marker & 0x0F > 3 {
            return Err(malformed("invalid extended length"));
        }
        let width = 1usize << (marker & 0x0F);
        let len = to_usize(be_uint(self.slice(body + 1, width)?))?;
        Ok((len, body + 1 + width))
    }

    fn decode_at(&mut self, offset: usize) -> Result<Value, ReadError> {
        let marker = self.slice(offset, 1)?[0];
        let (kind, info) = (marker >> 4, marker & 0x0F);
        let body = offset + 1;

        match kind {
            0x0 => match info {
                0x0 => Ok(Value::Null),
                0x8 => Ok(Value::Boolean(false)),
                0x9 => Ok(Value::Boolean(true)),
                _ => Err(malformed(format!("unknown marker 0x{marker:02x}"))),
            },
            0x1 => {
                if info > 3 {
                    return Err(malformed("integers wider than 64 bits are not supported"));
                }
                let bytes = self.slice(body, 1 << info)?;
                let value = if bytes.len() == 8 {
                    i64::from_be_bytes(bytes.try_into().map_err(|_| malformed("bad integer"))?)
                } else {
                    be_uint(bytes) as i64
                };
                Ok(Value::Integer(value))
            }
            0x2 => match info {
                2 => {
                    let bytes = self.slice(body, 4)?;
                    let raw: [u8; 4] = bytes.try_into().map_err(|_| malformed("bad real"))?;
                    Ok(Value::Real(f64::from(f32::from_be_bytes(raw))))
                }
                3 => {
                    let bytes = self.slice(body, 8)?;
                    let raw: [u8; 8] = bytes.try_into().map_err(|_| malformed("bad real"))?;
                    Ok(Value::Real(f64::from_be_bytes(raw)))
                }
                _ => Err(malformed(format!("unsupported real width marker 0x{marker:02x}"))),
            },
            0x3 if info == 0x3 => {
                let bytes = self.slice(body, 8)?;
                let raw: [u8; 8] = bytes.try_into().map_err(|_| malformed("bad date"))?;
                apple_date(f64::from_be_bytes(raw)).map(Value::Date)
            }
            0x4 => {
                let (len, start) = self.length(info, body)?;
                Ok(Value::Data(self.slice(start, len)?.to_vec()))
            }
            0x5 => {
                let (len, start) = self.length(info, body)?;
                let bytes = self.slice(start, len)?;
                std::str::from_utf8(bytes)
                    .map(|s| Value::String(s.to_string()))
                    .map_err(|_| malformed("invalid ASCII string"))
            }
            0x6 => {
                let (chars, start) = self.length(info, body)?;
                let len = chars
                    .checked_mul(2)
                    .ok_or_else(|| malformed("string length overflow"))?;
                let units: Vec<u16> = self
                    .slice(start, len)?
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units)
                    .map(Value::String)
                    .map_err(|_| malformed("invalid UTF-16 string"))
            }
            0x8 => Err(malformed("UID values are not supported")),
            0xA => {
                let (count, start) = self.length(info, body)?;
                let mut items = Vec::with_capacity(count.min(self.trailer.num_objects));
                for i in 0..count {
                    let index = self.reference(start + i * self.trailer.ref_size)?;
                    items.push(self.object(index)?);
                }
                Ok(Value::Array(items))
            }
            0xD => {
                let (count, start) = self.length(info, body)?;
                let values_start = count
                    .saturating_mul(self.trailer.ref_size)
                    .saturating_add(start);
                let mut map = Dictionary::with_capacity(count.min(self.trailer.num_objects));
                for i in 0..count {
                    let key_index = self.reference(start + i * self.trailer.ref_size)?;
                    let key = match self.object(key_index)? {
                        Value::String(s) => s,
                        other => {
                            return Err(malformed(format!(
                                "dictionary key is a {}, not a string",
                                other.kind()
                            )))
                        }
                    };
                    let value_index = self.reference(values_start + i * self.trailer.ref_size)?;
                    map.insert(key, self.object(value_index)?);
                }
                Ok(Value::Dictionary(map))
            }
            _ => Err(malformed(format!("unknown marker 0x{marker:02x}"))),
        }
    }
}

fn apple_date(seconds: f64) -> Result<DateTime<Utc>, ReadError> {
    let unix = seconds + APPLE_EPOCH_OFFSET;
    if !unix.is_finite() {
        return Err(malformed("invalid date"));
    }
    let whole = unix.floor();
    let nanos = ((unix - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos).ok_or_else(|| malformed("date out of range"))
}
