//! Day 16: decoder for the hex-encoded BITS packet transmission.
//!
//! A transmission is one outermost packet. Every packet starts with a 3-bit version and a
//! 3-bit type id; type 4 is a literal, anything else is an operator over sub-packets.

use std::fmt;
use std::ops::Range;

use bitvec::prelude::*;
use itertools::Itertools;
use tracing::trace;

use crate::error::{Error, Result};

const LITERAL_TYPE_ID: u8 = 4;

/// Bits with a read cursor. Reads never move the cursor past the end.
pub struct BitStream {
    bits: BitVec<u8, Msb0>,
    position: usize,
}

impl BitStream {
    /// Expands each hex digit (either case) into four bits, most significant first.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let mut bits = BitVec::with_capacity(4 * hex.len());
        for (offset, digit) in hex.char_indices() {
            let nibble = digit.to_digit(16).ok_or(Error::InvalidHexDigit { digit, offset })?;
            bits.extend_from_bitslice(&(nibble as u8).view_bits::<Msb0>()[4..]);
        }
        Ok(BitStream { bits, position: 0 })
    }

    pub fn from_bits(bits: &BitSlice<u8, Msb0>) -> Self {
        BitStream { bits: bits.to_bitvec(), position: 0 }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bits.len() - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, wanted: usize) -> Result<Range<usize>> {
        if wanted > self.remaining() {
            return Err(Error::TruncatedStream { position: self.position, wanted, len: self.len() });
        }
        let range = self.position .. self.position + wanted;
        self.position += wanted;
        Ok(range)
    }

    pub fn read_flag(&mut self) -> Result<bool> {
        let range = self.take(1)?;
        Ok(self.bits[range.start])
    }

    /// Reads `width` bits (1 to 64) as a big-endian unsigned number.
    pub fn read_uint(&mut self, width: usize) -> Result<u64> {
        debug_assert!((1 ..= 64).contains(&width));
        let range = self.take(width)?;
        let value = self.bits[range.clone()].load_be::<u64>();
        trace!(width, value, at = range.start, "read bits");
        Ok(value)
    }

    /// Moves the next `width` bits into a stream of their own.
    pub fn split_off(&mut self, width: usize) -> Result<BitStream> {
        let range = self.take(width)?;
        Ok(BitStream::from_bits(&self.bits[range]))
    }
}

impl fmt::Debug for BitStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BitStream<total_bits={}, position={}, remaining={}>",
               self.len(), self.position, self.remaining())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {Sum, Product, Min, Max, GreaterThan, LessThan, Equal}

impl OpKind {
    pub fn type_id(self) -> u8 {
        match self {
            OpKind::Sum => 0, OpKind::Product => 1, OpKind::Min => 2, OpKind::Max => 3,
            OpKind::GreaterThan => 5, OpKind::LessThan => 6, OpKind::Equal => 7,
        }
    }

    fn apply(self, operands: &[u64]) -> Result<u64> {
        match self {
            OpKind::Sum => operands.iter().try_fold(0u64, |acc, &v| acc.checked_add(v))
                                   .ok_or(Error::Overflow { what: "sum" }),
            OpKind::Product => operands.iter().try_fold(1u64, |acc, &v| acc.checked_mul(v))
                                       .ok_or(Error::Overflow { what: "product" }),
            OpKind::Min => operands.iter().min().copied().ok_or(Error::arity(self, 0)),
            OpKind::Max => operands.iter().max().copied().ok_or(Error::arity(self, 0)),
            OpKind::GreaterThan | OpKind::LessThan | OpKind::Equal => {
                let &[left, right] = operands else {
                    return Err(Error::arity(self, operands.len()));
                };
                Ok(u64::from(match self {
                    OpKind::GreaterThan => left > right,
                    OpKind::LessThan => left < right,
                    _ => left == right,
                }))
            }
        }
    }
}

impl TryFrom<u8> for OpKind {
    type Error = Error;

    fn try_from(type_id: u8) -> Result<Self> {
        Ok(match type_id {
            0 => OpKind::Sum, 1 => OpKind::Product, 2 => OpKind::Min, 3 => OpKind::Max,
            5 => OpKind::GreaterThan, 6 => OpKind::LessThan, 7 => OpKind::Equal,
            _ => return Err(Error::InvalidOperator { type_id, operands: 0 }),
        })
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            OpKind::Sum => "sum", OpKind::Product => "product",
            OpKind::Min => "min", OpKind::Max => "max",
            OpKind::GreaterThan => "gt", OpKind::LessThan => "lt", OpKind::Equal => "eq",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    Literal {version: u8, value: u64},
    Operator {version: u8, op: OpKind, children: Vec<Packet>},
}

impl Packet {
    /// Decodes the outermost packet of a transmission. Trailing padding is left unread.
    pub fn from_hex(hex: &str) -> Result<Packet> {
        parse_packet(&mut BitStream::from_hex(hex)?)
    }

    pub fn version(&self) -> u8 {
        match self {
            Packet::Literal {version, ..} | Packet::Operator {version, ..} => *version,
        }
    }

    pub fn version_sum(&self) -> u64 {
        match self {
            Packet::Literal {version, ..} => *version as u64,
            Packet::Operator {version, children, ..} =>
                *version as u64 + children.iter().map(Packet::version_sum).sum::<u64>(),
        }
    }

    pub fn evaluate(&self) -> Result<u64> {
        match self {
            Packet::Literal {value, ..} => Ok(*value),
            Packet::Operator {op, children, ..} => {
                let operands = children.iter().map(Packet::evaluate).collect::<Result<Vec<_>>>()?;
                op.apply(&operands)
            }
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            Packet::Literal {version, value} =>
                writeln!(f, "{}v{} literal {}", indent, version, value),
            Packet::Operator {version, op, children} => {
                writeln!(f, "{}v{} {} ({})", indent, version, op, children.len())?;
                children.iter().try_for_each(|child| child.fmt_tree(f, depth + 1))
            }
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// Reads exactly one packet (and everything nested in it) from the cursor.
pub fn parse_packet(stream: &mut BitStream) -> Result<Packet> {
    let version = stream.read_uint(3)? as u8;
    let type_id = stream.read_uint(3)? as u8;

    if type_id == LITERAL_TYPE_ID {
        let mut value = 0u64;
        loop {
            let more = stream.read_flag()?;
            if value.leading_zeros() < 4 {
                return Err(Error::Overflow { what: "literal" });
            }
            value = value << 4 | stream.read_uint(4)?;
            if !more {break};
        }
        return Ok(Packet::Literal {version, value});
    }

    let op = OpKind::try_from(type_id)?;
    let mut children = vec![];
    if stream.read_flag()? {
        let count = stream.read_uint(11)?;
        for _ in 0 .. count {
            children.push(parse_packet(stream)?);
        }
    } else {
        let total_bits = stream.read_uint(15)? as usize;
        let mut sub = stream.split_off(total_bits)?;
        while !sub.is_exhausted() {
            children.push(parse_packet(&mut sub)?);
        }
    }
    trace!(version, %op, children = %children.iter().map(Packet::version).join(","), "operator");
    Ok(Packet::Operator {version, op, children})
}

pub fn sum_versions(hex: &str) -> Result<u64> {
    Ok(Packet::from_hex(hex)?.version_sum())
}

pub fn evaluate(hex: &str) -> Result<u64> {
    Packet::from_hex(hex)?.evaluate()
}
