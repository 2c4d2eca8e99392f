//! API middleware stack.
//!
//! Only the access log runs today; it wraps every `/api` route.

pub mod audit;
