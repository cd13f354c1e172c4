//! AtoM archival description rows.
//!
//! Column order is the import contract consumed downstream.
//!
//! Known gap: data rows carry `levelOfDescription` and `culture` values in
//! that order (`File,en`) while the header names them `culture,levelOfDescription`.

use batchreport_core::Sip;

pub const HEADER: [&str; 8] = [
    "title",
    "alternativeIdentifiers",
    "alternativeIdentifierLabels",
    "radGeneralMaterialDesignation",
    "culture",
    "levelOfDescription",
    "publicationStatus",
    "accessRestriction",
];

pub const ALTERNATIVE_IDENTIFIER_LABEL: &str = "AIP UUID";
pub const MATERIAL_DESIGNATION: &str = "Multiple media";
pub const CULTURE: &str = "en";
pub const LEVEL_OF_DESCRIPTION: &str = "File";
pub const PUBLICATION_STATUS: &str = "draft";
pub const ACCESS_RESTRICTION: &str = "This file has not been reviewed for potential FOIPPA restrictions. Access is pending review and may be delayed. See archivist for details.";

/// One data row. Only archived SIPs (with an AIP identifier) produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomRow<'a> {
    pub title: &'a str,
    pub alternative_identifiers: String,
}

impl<'a> AtomRow<'a> {
    pub fn from_sip(sip: &'a Sip) -> Option<Self> {
        let aip_id = sip.aip_id?;
        Some(Self {
            title: &sip.name,
            alternative_identifiers: aip_id.hyphenated().to_string(),
        })
    }

    pub fn record(&self) -> [&str; 8] {
        [
            self.title,
            &self.alternative_identifiers,
            ALTERNATIVE_IDENTIFIER_LABEL,
            MATERIAL_DESIGNATION,
            LEVEL_OF_DESCRIPTION,
            CULTURE,
            PUBLICATION_STATUS,
            ACCESS_RESTRICTION,
        ]
    }
}
