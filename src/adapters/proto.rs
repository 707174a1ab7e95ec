//! Generated `kuksa.val.v1` messages and the `VAL` service stubs.

#![allow(clippy::all, missing_docs)]

tonic::include_proto!("kuksa.val.v1");
