//! Outbound adapters implementing domain ports for the database server.
//!
//! - **http**: reqwest-backed `Connection` posting form-encoded commands
//! - **result_set**: `fmresultset.xml` decoding behind `ResultSetClient`
//!
//! Adapters translate between wire formats and domain types. They contain no
//! repository or identity-map logic.

pub mod http;
pub mod result_set;
