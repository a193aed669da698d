//! API middleware. Audit logging runs innermost, CORS outermost.

pub mod audit;
