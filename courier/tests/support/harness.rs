//! A campaign laid out in a temporary directory
//!
//! The harness writes a recipient table, one document per recipient,
//! a credentials file, an optional validity map, a sent-state file and a
//! configuration file tying them together. Tests then load the
//! configuration exactly as the binary would.

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use courier::config::Courier;
use tempfile::TempDir;

pub struct CampaignHarness {
    dir: TempDir,
    config_path: PathBuf,
}

impl CampaignHarness {
    #[must_use]
    pub fn builder() -> CampaignHarnessBuilder {
        CampaignHarnessBuilder::default()
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn courier(&self) -> Courier {
        Courier::load(&self.config_path).expect("harness config should parse")
    }

    pub fn sent_state_path(&self) -> PathBuf {
        self.dir.path().join("sent.txt")
    }

    /// Contents of the sent-state file, one identifier per entry.
    pub fn sent_state(&self) -> Vec<String> {
        std::fs::read_to_string(self.sent_state_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

struct Row {
    identifier: String,
    email: String,
    with_documents: bool,
}

pub struct CampaignHarnessBuilder {
    rows: Vec<Row>,
    history: Vec<String>,
    logins: Vec<(String, String)>,
    invalid: Vec<String>,
    max_per_account: u32,
}

impl Default for CampaignHarnessBuilder {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            history: Vec::new(),
            logins: vec![("alice@sender.test".to_string(), "app-password".to_string())],
            invalid: Vec::new(),
            max_per_account: 20,
        }
    }
}

impl CampaignHarnessBuilder {
    #[must_use]
    pub fn recipient(mut self, identifier: &str, email: &str) -> Self {
        self.rows.push(Row {
            identifier: identifier.to_string(),
            email: email.to_string(),
            with_documents: true,
        });
        self
    }

    /// A recipient whose document columns are blank.
    #[must_use]
    pub fn incomplete_recipient(mut self, identifier: &str, email: &str) -> Self {
        self.rows.push(Row {
            identifier: identifier.to_string(),
            email: email.to_string(),
            with_documents: false,
        });
        self
    }

    #[must_use]
    pub fn already_sent(mut self, identifier: &str) -> Self {
        self.history.push(identifier.to_string());
        self
    }

    #[must_use]
    pub fn login(mut self, login: &str, secret: &str) -> Self {
        self.logins.push((login.to_string(), secret.to_string()));
        self
    }

    #[must_use]
    pub fn undeliverable(mut self, email: &str) -> Self {
        self.invalid.push(email.to_string());
        self
    }

    #[must_use]
    pub const fn max_per_account(mut self, max: u32) -> Self {
        self.max_per_account = max;
        self
    }

    pub fn build(self) -> CampaignHarness {
        let dir = TempDir::new().expect("create temp dir");
        let root = dir.path();
        let forms = root.join("forms");
        let invoices = root.join("invoices");
        std::fs::create_dir_all(&forms).unwrap();
        std::fs::create_dir_all(&invoices).unwrap();

        let mut table = String::from("usdot,company_name,contact_name,email,form_path,invoice_path\n");
        for row in &self.rows {
            let (form, invoice) = if row.with_documents {
                let form = forms.join(format!("{}.pdf", row.identifier));
                let invoice = invoices.join(format!("{}.pdf", row.identifier));
                std::fs::write(&form, b"%PDF-1.4 form").unwrap();
                std::fs::write(&invoice, b"%PDF-1.4 invoice").unwrap();
                (form.display().to_string(), invoice.display().to_string())
            } else {
                (String::new(), String::new())
            };
            writeln!(
                table,
                "{},Carrier {},Contact {},{},{form},{invoice}",
                row.identifier, row.identifier, row.identifier, row.email
            )
            .unwrap();
        }
        std::fs::write(root.join("recipients.csv"), table).unwrap();

        let credentials: std::collections::HashMap<_, _> = self.logins.iter().cloned().collect();
        std::fs::write(
            root.join("credentials.json"),
            serde_json::to_string(&credentials).unwrap(),
        )
        .unwrap();

        let validity: std::collections::HashMap<_, _> =
            self.invalid.iter().map(|email| (email.clone(), false)).collect();
        std::fs::write(
            root.join("validity.json"),
            serde_json::to_string(&validity).unwrap(),
        )
        .unwrap();

        if !self.history.is_empty() {
            let mut history = self.history.join("\n");
            history.push('\n');
            std::fs::write(root.join("sent.txt"), history).unwrap();
        }

        let logins = self
            .logins
            .iter()
            .map(|(login, _)| format!("{login:?}"))
            .collect::<Vec<_>>()
            .join(", ");

        let config = format!(
            r#"#![enable(implicit_some)]
(
    campaign: (
        max_per_account: {max},
        rate_limit: (base_delay_secs: 0.01, jitter: 0.0),
        send_timeout_secs: 5,
        logins: [{logins}],
    ),
    state: File(path: {state:?}, mode: Overwrite),
    template: (
        subject: "Reminder for {{{{ organization_name }}}}",
        body: "Hello {{{{ contact_name }}}},\nyour number is {{{{ identifier }}}}.\n",
    ),
    recipients: (
        path: {table:?},
        primary_dir: {forms:?},
    ),
    credentials: {credentials:?},
    validity: {validity:?},
)
"#,
            max = self.max_per_account,
            state = root.join("sent.txt"),
            table = root.join("recipients.csv"),
            credentials = root.join("credentials.json"),
            validity = root.join("validity.json"),
        );

        let config_path = root.join("courier.config.ron");
        std::fs::write(&config_path, config).unwrap();

        CampaignHarness { dir, config_path }
    }
}
