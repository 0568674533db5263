//! The recipient model handed to the dispatcher by a recipient source.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// One organisation to contact.
///
/// Records are built by a recipient source and are read-only from then on.
/// A record is *complete* when none of its six fields is empty; incomplete
/// records are never dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientRecord {
    /// Stable unique key (e.g. a registration number) used for deduplication
    /// across runs.
    pub identifier: String,
    pub organization_name: String,
    pub contact_name: String,
    pub email: String,
    pub primary_document_path: String,
    pub secondary_document_path: String,
}

/// The six fields a record must carry before it can be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Identifier,
    OrganizationName,
    ContactName,
    Email,
    PrimaryDocumentPath,
    SecondaryDocumentPath,
}

impl RequiredField {
    /// Every required field, in the order they are reported when missing.
    pub const ALL: [Self; 6] = [
        Self::Email,
        Self::PrimaryDocumentPath,
        Self::SecondaryDocumentPath,
        Self::OrganizationName,
        Self::ContactName,
        Self::Identifier,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::OrganizationName => "organization_name",
            Self::ContactName => "contact_name",
            Self::Email => "email",
            Self::PrimaryDocumentPath => "primary_document_path",
            Self::SecondaryDocumentPath => "secondary_document_path",
        }
    }
}

impl Display for RequiredField {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

impl RecipientRecord {
    /// The value stored for `field`.
    #[must_use]
    pub fn field(&self, field: RequiredField) -> &str {
        match field {
            RequiredField::Identifier => &self.identifier,
            RequiredField::OrganizationName => &self.organization_name,
            RequiredField::ContactName => &self.contact_name,
            RequiredField::Email => &self.email,
            RequiredField::PrimaryDocumentPath => &self.primary_document_path,
            RequiredField::SecondaryDocumentPath => &self.secondary_document_path,
        }
    }

    /// Fields that are empty or whitespace only, in [`RequiredField::ALL`] order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|field| self.field(*field).trim().is_empty())
            .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn complete() -> RecipientRecord {
        RecipientRecord {
            identifier: "100".to_string(),
            organization_name: "ACME HAULING".to_string(),
            contact_name: "Jane Doe".to_string(),
            email: "jane@acme.test".to_string(),
            primary_document_path: "/forms/acme_hauling.pdf".to_string(),
            secondary_document_path: "/invoices/acme_hauling.pdf".to_string(),
        }
    }

    #[test]
    fn complete_record_has_no_missing_fields() {
        let record = complete();
        assert!(record.is_complete());
        assert!(record.missing_fields().is_empty());
    }

    #[test]
    fn blank_fields_are_reported_in_order() {
        let record = RecipientRecord {
            identifier: String::new(),
            email: "   ".to_string(),
            ..complete()
        };

        assert_eq!(
            record.missing_fields(),
            vec![RequiredField::Email, RequiredField::Identifier]
        );
        assert!(!record.is_complete());
    }

    #[test]
    fn field_names_match_serialized_form() {
        for field in RequiredField::ALL {
            let serialized = ron::to_string(&field).unwrap();
            assert_eq!(serialized, field.name());
        }
    }
}
