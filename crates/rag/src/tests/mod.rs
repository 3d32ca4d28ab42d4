//! Pipeline integration tests.

mod retrieval;
