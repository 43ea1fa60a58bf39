//! Day 18: snailfish numbers.
//!
//! A number is a binary tree of pairs with regular numbers at the leaves. Nodes live in an
//! arena and point back at their parent, so depth is found by walking up and the nearest
//! regular neighbours are found by flattening the leaves in order.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::error::{Error, Result};

type NodeId = usize;

/// Pairs nested inside this many pairs explode.
const EXPLODE_DEPTH: usize = 4;
const SPLIT_THRESHOLD: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {Regular(u64), Pair(NodeId, NodeId)}

#[derive(Clone, Debug)]
struct Node {parent: Option<NodeId>, kind: Kind}

#[derive(Clone, Debug)]
pub struct SnailfishNumber {
    nodes: Vec<Node>,
    root: NodeId,
}

fn top_level_comma(inner: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (at, c) in inner.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some(at),
            _ => ()
        }
    }
    None
}

fn parse_node(nodes: &mut Vec<Node>, text: &str, parent: Option<NodeId>) -> Result<NodeId> {
    let id = nodes.len();
    nodes.push(Node {parent, kind: Kind::Regular(0)});
    nodes[id].kind = if let Some(rest) = text.strip_prefix('[') {
        let inner = rest.strip_suffix(']').ok_or_else(|| Error::syntax(text, "unclosed bracket"))?;
        let comma = top_level_comma(inner)
            .ok_or_else(|| Error::syntax(text, "pair has no top-level comma"))?;
        let left = parse_node(nodes, &inner[.. comma], Some(id))?;
        let right = parse_node(nodes, &inner[comma + 1 ..], Some(id))?;
        Kind::Pair(left, right)
    } else {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::syntax(text, "expected a pair or a regular number"));
        }
        if text.len() > 1 && text.starts_with('0') {
            return Err(Error::syntax(text, "leading zero"));
        }
        Kind::Regular(text.parse().map_err(|_| Error::Overflow { what: "regular number" })?)
    };
    Ok(id)
}

impl SnailfishNumber {
    pub fn parse(text: &str) -> Result<Self> {
        let mut nodes = vec![];
        let root = parse_node(&mut nodes, text, None)?;
        Ok(SnailfishNumber {nodes, root})
    }

    fn alloc(&mut self, parent: Option<NodeId>, kind: Kind) -> NodeId {
        self.nodes.push(Node {parent, kind});
        self.nodes.len() - 1
    }

    /// Number of pairs this node is nested in.
    fn depth(&self, mut id: NodeId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.nodes[id].parent {
            depth += 1;
            id = parent;
        }
        depth
    }

    /// Regular numbers, left to right.
    fn regulars(&self) -> Vec<NodeId> {
        let mut order = vec![];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.nodes[id].kind {
                Kind::Regular(_) => order.push(id),
                Kind::Pair(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        order
    }

    fn value(&self, id: NodeId) -> u64 {
        match self.nodes[id].kind {
            Kind::Regular(v) => v,
            Kind::Pair(..) => 0,
        }
    }

    /// `id`'s value plus `by`, for a neighbour that receives an exploded value.
    fn bumped(&self, id: NodeId, by: u64) -> Result<(NodeId, u64)> {
        let sum = self.value(id).checked_add(by).ok_or(Error::Overflow { what: "regular number" })?;
        Ok((id, sum))
    }

    /// Explodes the leftmost pair nested inside four pairs. Returns whether anything changed.
    ///
    /// That pair must hold two regular numbers; anything nested deeper is a syntax error.
    pub fn explode(&mut self) -> Result<bool> {
        let order = self.regulars();
        let Some(at) = order.iter().position(|&id| self.depth(id) > EXPLODE_DEPTH) else {
            return Ok(false);
        };

        let left = order[at];
        let mut pair = left;
        for _ in EXPLODE_DEPTH .. self.depth(left) {
            pair = self.nodes[pair].parent.unwrap_or(pair);
        }
        let Some(&right) = order.get(at + 1)
            .filter(|&&right| self.nodes[pair].kind == Kind::Pair(left, right)) else {
            return Err(Error::syntax(&self.to_string(), "pair nested inside more than four pairs"));
        };

        let (left_value, right_value) = (self.value(left), self.value(right));
        let prev = at.checked_sub(1).map(|i| self.bumped(order[i], left_value)).transpose()?;
        let next = order.get(at + 2).map(|&id| self.bumped(id, right_value)).transpose()?;
        for (id, v) in prev.into_iter().chain(next) {
            self.nodes[id].kind = Kind::Regular(v);
        }
        self.nodes[left].parent = None;
        self.nodes[right].parent = None;
        self.nodes[pair].kind = Kind::Regular(0);
        trace!(left_value, right_value, "explode");
        Ok(true)
    }

    /// Splits the leftmost regular number of ten or more. Returns whether anything changed.
    pub fn split(&mut self) -> bool {
        let Some((id, v)) = self.regulars().into_iter().find_map(|id| match self.nodes[id].kind {
            Kind::Regular(v) if v >= SPLIT_THRESHOLD => Some((id, v)),
            _ => None
        }) else {return false};

        let left = self.alloc(Some(id), Kind::Regular(v / 2));
        let right = self.alloc(Some(id), Kind::Regular(v - v / 2));
        self.nodes[id].kind = Kind::Pair(left, right);
        trace!(value = v, "split");
        true
    }

    /// Explodes, else splits, until neither applies.
    pub fn reduce(&mut self) -> Result<()> {
        let mut steps = 0;
        while self.explode()? || self.split() {
            steps += 1;
        }
        trace!(steps, "reduced");
        Ok(())
    }

    /// True when no pair is deep enough to explode and every regular is below ten.
    pub fn is_reduced(&self) -> bool {
        self.regulars().into_iter().all(|id|
            self.value(id) < SPLIT_THRESHOLD && self.depth(id) <= EXPLODE_DEPTH
        )
    }

    /// Copies the subtree at `id` into `into`, hanging it off `parent`.
    fn graft(&self, into: &mut Vec<Node>, id: NodeId, parent: Option<NodeId>) -> NodeId {
        let new = into.len();
        into.push(Node {parent, kind: self.nodes[id].kind});
        if let Kind::Pair(left, right) = self.nodes[id].kind {
            let left = self.graft(into, left, Some(new));
            let right = self.graft(into, right, Some(new));
            into[new].kind = Kind::Pair(left, right);
        }
        new
    }

    /// Pairs up both numbers under a new root and reduces the result.
    pub fn add(self, other: SnailfishNumber) -> Result<SnailfishNumber> {
        let mut nodes = Vec::with_capacity(1 + self.nodes.len() + other.nodes.len());
        nodes.push(Node {parent: None, kind: Kind::Regular(0)});
        let left = self.graft(&mut nodes, self.root, Some(0));
        let right = other.graft(&mut nodes, other.root, Some(0));
        nodes[0].kind = Kind::Pair(left, right);

        let mut sum = SnailfishNumber {nodes, root: 0};
        sum.reduce()?;
        Ok(sum)
    }

    pub fn magnitude(&self) -> Result<u64> {
        self.magnitude_of(self.root).ok_or(Error::Overflow { what: "magnitude" })
    }

    fn magnitude_of(&self, id: NodeId) -> Option<u64> {
        match self.nodes[id].kind {
            Kind::Regular(v) => Some(v),
            Kind::Pair(left, right) => self.magnitude_of(left)?.checked_mul(3)?
                .checked_add(self.magnitude_of(right)?.checked_mul(2)?),
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter, id: NodeId) -> fmt::Result {
        match self.nodes[id].kind {
            Kind::Regular(v) => write!(f, "{}", v),
            Kind::Pair(left, right) => {
                f.write_str("[")?;
                self.fmt_node(f, left)?;
                f.write_str(",")?;
                self.fmt_node(f, right)?;
                f.write_str("]")
            }
        }
    }
}

impl FromStr for SnailfishNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SnailfishNumber::parse(s)
    }
}

impl fmt::Display for SnailfishNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_node(f, self.root)
    }
}

/// Adds the numbers in order, reducing after each addition.
pub fn add_list<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<SnailfishNumber> {
    lines.into_iter()
         .try_fold(None, |sum: Option<SnailfishNumber>, line| {
             let n = SnailfishNumber::parse(line)?;
             Ok::<_, Error>(Some(match sum {
                 Some(sum) => sum.add(n)?,
                 None => n,
             }))
         })?
         .ok_or(Error::NotEnoughNumbers { count: 0 })
}

/// Largest magnitude of `a + b` over every ordered pair of different lines.
pub fn max_pairwise_magnitude(lines: &[&str]) -> Result<u64> {
    let numbers = lines.iter().map(|line| line.parse()).collect::<Result<Vec<SnailfishNumber>>>()?;
    let (magnitude, a, b) = (0 .. numbers.len()).permutations(2).map(|ab| {
        let sum = numbers[ab[0]].clone().add(numbers[ab[1]].clone())?;
        Ok::<_, Error>((sum.magnitude()?, ab[0], ab[1]))
    }).fold_ok(None, |best, candidate| best.max(Some(candidate)))?
      .ok_or(Error::NotEnoughNumbers { count: numbers.len() })?;
    debug!(magnitude, a = %lines[a], b = %lines[b], "best pair");
    Ok(magnitude)
}
