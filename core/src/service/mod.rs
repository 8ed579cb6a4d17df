pub mod board;

pub use board::{Board, Column, FailurePolicy, WriteOp, WriteOutcome};
