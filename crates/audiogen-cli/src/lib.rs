//! # Audiogen CLI
//!
//! Shared argument definitions and command bodies for the six Audiogen
//! executables. Each binary in `src/bin` parses its arguments, initializes
//! logging and hands off to one function in [`commands`].
//!
//! stdout carries only the result line (`installed`, `missing`,
//! `Audio saved to …`); logs and errors go to stderr.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod args;
pub mod commands;
pub mod logging;
