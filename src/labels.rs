// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Annotation and class constants shared by the `DNSOwner` controller.

// ============================================================================
// Annotations
// ============================================================================

/// Annotation selecting the controller class responsible for an object
pub const DNS_CLASS_ANNOTATION: &str = "dns.firestoned.io/class";

// ============================================================================
// Class Values
// ============================================================================

/// Class assumed for objects without a class annotation
pub const DEFAULT_CLASS: &str = "default";
