// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the controller surface around the owner pipeline.
//!
//! The owner stack itself never fails: every operation on it is total. Errors
//! only arise while reading configuration and while talking to the
//! Kubernetes API server.

use std::net::AddrParseError;
use thiserror::Error;

/// Invalid command-line configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The controller identifier is empty or blank
    ///
    /// The identifier is always asserted as an active owner ID, so it must be
    /// a usable one.
    #[error("Controller identifier must not be empty")]
    EmptyIdentifier,

    /// A configured class is empty or blank
    #[error("Class names must not be empty")]
    EmptyClass,

    /// The metrics listen address cannot be parsed
    #[error("Invalid metrics address '{addr}': {source}")]
    InvalidMetricsAddr {
        /// The address as given on the command line
        addr: String,
        /// Underlying parse failure
        #[source]
        source: AddrParseError,
    },
}

/// Failures of the `DNSOwner` watch loop.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A `DNSOwner` object arrived without a name
    #[error("DNSOwner object has no name")]
    MissingName,

    /// The watch stream ended, which a healthy watcher never does
    #[error("DNSOwner watch stream ended unexpectedly")]
    StreamEnded,
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
