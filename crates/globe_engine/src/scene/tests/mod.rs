//! End-to-end container lifecycle scenarios

mod lifecycle;
pub(crate) mod support;
