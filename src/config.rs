// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line options of the `dnsowner` controller.

use crate::classes::Classes;
use crate::constants::{DEFAULT_IDENTIFIER, DEFAULT_METRICS_ADDR, DEFAULT_SETUP_WORKERS};
use crate::errors::ConfigError;
use crate::labels::DEFAULT_CLASS;
use crate::owners::OwnerIdFilter;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "dnsowner")]
#[command(about = "Tracks the DNS owner IDs this controller is responsible for", long_about = None)]
#[command(version)]
pub struct Options {
    /// Owner ID the controller always asserts for itself
    #[arg(long, default_value = DEFAULT_IDENTIFIER)]
    pub identifier: String,

    /// Controller class; objects of other classes are ignored (repeatable)
    #[arg(long = "class", default_value = DEFAULT_CLASS)]
    pub classes: Vec<String>,

    /// Only expose owner IDs matching these patterns; a trailing `*` matches a prefix (repeatable)
    #[arg(long = "owner-id-filter", value_delimiter = ',')]
    pub owner_id_filters: Vec<String>,

    /// Number of workers processing the initial DNSOwner list
    #[arg(long, default_value_t = DEFAULT_SETUP_WORKERS)]
    pub setup_workers: usize,

    /// Listen address of the Prometheus metrics endpoint
    #[arg(long, default_value = DEFAULT_METRICS_ADDR)]
    pub metrics_addr: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_IDENTIFIER.to_string(),
            classes: vec![DEFAULT_CLASS.to_string()],
            owner_id_filters: Vec::new(),
            setup_workers: DEFAULT_SETUP_WORKERS,
            metrics_addr: DEFAULT_METRICS_ADDR.to_string(),
        }
    }
}

impl Options {
    /// Check the options and return the parsed metrics address.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a blank identifier or class, or an
    /// unparsable metrics address.
    pub fn validate(&self) -> Result<SocketAddr, ConfigError> {
        if self.identifier.trim().is_empty() {
            return Err(ConfigError::EmptyIdentifier);
        }
        self.classes()?;
        self.metrics_addr
            .parse()
            .map_err(|source| ConfigError::InvalidMetricsAddr {
                addr: self.metrics_addr.clone(),
                source,
            })
    }

    /// Configured identifier without surrounding whitespace.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.identifier.trim()
    }

    /// Configured classes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyClass`] if a class is blank.
    pub fn classes(&self) -> Result<Classes, ConfigError> {
        Classes::new(&self.classes)
    }

    /// Setup worker count, never less than one.
    #[must_use]
    pub fn setup_workers(&self) -> usize {
        self.setup_workers.max(1)
    }

    /// Owner-ID filter built from the configured patterns, if any were given.
    #[must_use]
    pub fn owner_id_filter(&self) -> Option<Arc<OwnerIdFilter>> {
        if self.owner_id_filters.is_empty() {
            None
        } else {
            Some(OwnerIdFilter::new(&self.owner_id_filters))
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
