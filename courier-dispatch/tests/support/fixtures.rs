//! Recipients, templates and dispatcher wiring shared by the tests
#![allow(dead_code)]

use std::sync::Arc;

use courier_common::RecipientRecord;
use courier_dispatch::{
    CampaignTemplate, CredentialStore, DispatchConfig, Dispatcher, RateLimitConfig,
    TemplateConfig, ValidityMap,
};
use courier_state::{MemorySentStateStore, WriteMode};
use tempfile::TempDir;

use super::mock_transport::MockTransport;

pub const ALICE: &str = "alice@office.test";
pub const BOB: &str = "bob@office.test";

/// Writes the two documents a recipient needs into `dir`.
pub fn recipient(dir: &TempDir, identifier: &str) -> RecipientRecord {
    let primary = dir.path().join(format!("form_{identifier}.pdf"));
    let secondary = dir.path().join(format!("invoice_{identifier}.pdf"));
    std::fs::write(&primary, b"%PDF-form").unwrap();
    std::fs::write(&secondary, b"%PDF-invoice").unwrap();

    RecipientRecord {
        identifier: identifier.to_string(),
        organization_name: format!("Carrier {identifier}"),
        contact_name: "Pat Doe".to_string(),
        email: format!("ops{identifier}@carrier.test"),
        primary_document_path: primary.display().to_string(),
        secondary_document_path: secondary.display().to_string(),
    }
}

pub fn email_of(identifier: &str) -> String {
    format!("ops{identifier}@carrier.test")
}

pub fn credentials() -> CredentialStore {
    [(ALICE, "alice-secret"), (BOB, "bob-secret")]
        .into_iter()
        .collect()
}

/// A config with a fixed 10 second delay between sends.
pub fn config(logins: &[&str], max_per_account: u32) -> DispatchConfig {
    DispatchConfig {
        max_per_account,
        rate_limit: RateLimitConfig {
            base_delay_secs: 10.0,
            jitter: 0.0,
        },
        logins: logins.iter().map(ToString::to_string).collect(),
        ..DispatchConfig::default()
    }
}

pub fn template() -> Arc<CampaignTemplate> {
    Arc::new(
        CampaignTemplate::new(&TemplateConfig {
            subject: "Update due for {{ organization_name }}".to_string(),
            body: "Hi {{ contact_name }},\nUSDOT #{{ identifier }}\n".to_string(),
            primary_attachment_name: "Form.pdf".to_string(),
            secondary_attachment_name: "Invoice.pdf".to_string(),
        })
        .unwrap(),
    )
}

pub fn dispatcher(
    config: DispatchConfig,
    transport: &MockTransport,
    store: &MemorySentStateStore,
    validity: ValidityMap,
) -> Dispatcher {
    Dispatcher::builder(config)
        .renderer(template())
        .transport(Arc::new(transport.clone()))
        .state(Arc::new(store.clone()), WriteMode::Overwrite)
        .credentials(credentials())
        .validity(validity)
        .build()
        .unwrap()
}
