//! Support code for the `nulldrv` tool: loader manifest generation and
//! verification of a built driver library.

pub mod manifest;
pub mod verify;
