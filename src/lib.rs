//! Advent of Code 2021: the BITS packet decoder (day 16) and snailfish arithmetic (day 18).

pub mod bits;
pub mod error;
pub mod snailfish;
