//! Edges of the crate: the webhook contract providers call into and the CSV
//! formats the command line tool reads and writes.

pub mod csv;
pub mod webhook;
