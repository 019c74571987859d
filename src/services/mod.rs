//! Provisioning pipeline services
//!
//! - [`request`]: decode request envelopes into a data product + component id
//! - [`validation`]: typed validation of the guardian workload and its guards
//! - [`template`]: DAG rendering per technology
//! - [`provision`]: the per-resource provisioning loop, one implementation per
//!   publisher backend

pub mod provision;
pub mod request;
pub mod template;
pub mod validation;
