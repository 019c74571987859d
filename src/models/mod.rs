//! Domain and wire models
//!
//! - [`api`]: request/response envelopes exchanged with the platform
//! - [`descriptor`]: the data product descriptor and typed component lookup
//! - [`gx`]: guardian workload and guarded resource shapes

pub mod api;
pub mod descriptor;
pub mod gx;
