// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Utilities to scan a table page by page

/// An opaque position in a table scan, handed out by the backend to fetch the
/// next page
///
/// The content is backend-specific and must not be interpreted by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCursor(Box<[u8]>);

impl ScanCursor {
    /// Wrap raw backend bytes into a cursor
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// The raw backend bytes of this cursor
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A page of results returned by a table scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The items in the page
    pub items: Vec<T>,

    /// Where to resume the scan, `None` if this was the last page
    pub next: Option<ScanCursor>,
}
