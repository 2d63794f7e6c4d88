//! Request middleware: per-request trace identifiers and request spans.

pub mod trace;

pub use trace::Trace;
