// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller classes.
//!
//! Several controllers may share a cluster. Each object names the class of
//! controller responsible for it through the
//! [`DNS_CLASS_ANNOTATION`](crate::labels::DNS_CLASS_ANNOTATION); objects
//! without the annotation belong to [`DEFAULT_CLASS`](crate::labels::DEFAULT_CLASS).

use crate::errors::ConfigError;
use crate::labels::{DEFAULT_CLASS, DNS_CLASS_ANNOTATION};
use kube::ResourceExt;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// The set of classes this controller is responsible for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classes {
    classes: BTreeSet<String>,
}

impl Classes {
    /// Build from configured class names. An empty list means the default class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyClass`] if any name is blank.
    pub fn new<I, S>(classes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for class in classes {
            let class = class.as_ref().trim();
            if class.is_empty() {
                return Err(ConfigError::EmptyClass);
            }
            set.insert(class.to_string());
        }
        if set.is_empty() {
            set.insert(DEFAULT_CLASS.to_string());
        }
        Ok(Self { classes: set })
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Class named by `annotations`, or the default class.
    #[must_use]
    pub fn class_of(annotations: &BTreeMap<String, String>) -> &str {
        annotations
            .get(DNS_CLASS_ANNOTATION)
            .map(|class| class.trim())
            .filter(|class| !class.is_empty())
            .unwrap_or(DEFAULT_CLASS)
    }

    /// Whether `obj` belongs to one of our classes.
    pub fn is_responsible_for<K: ResourceExt>(&self, obj: &K) -> bool {
        let class = Self::class_of(obj.annotations());
        let responsible = self.contains(class);
        if !responsible {
            debug!(object = %obj.name_any(), class = %class, "Object belongs to another class");
        }
        responsible
    }
}

impl Default for Classes {
    fn default() -> Self {
        Self {
            classes: BTreeSet::from([DEFAULT_CLASS.to_string()]),
        }
    }
}

impl fmt::Display for Classes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.classes.iter().map(String::as_str).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
#[path = "classes_tests.rs"]
mod classes_tests;
