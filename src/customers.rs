use serde::Deserialize;
use std::{collections::HashSet, path::PathBuf};

use encoding_rs::{Encoding, WINDOWS_1252};
use tracing::debug;

use crate::{
    columns::{normalize_email, EMAIL_ADDRESS},
    error::{Error, Result},
    records::decode_record,
};

pub const DEFAULT_CUSTOMER_FILE: &str = "customer_data.csv";

/// One row of the customer reference table.
#[derive(Debug, Deserialize, PartialEq, Clone, Default)]
pub struct CustomerRecord {
    #[serde(rename = "Has Acct", default)]
    pub has_account: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "E-mail Address", default, deserialize_with = "trim_and_lowercase")]
    pub email: Option<String>,
    #[serde(rename = "Created", default)]
    pub created: Option<String>,
    #[serde(rename = "Sales Amt.", default)]
    pub sales_amount: Option<String>,
    #[serde(rename = "Address 1", default)]
    pub address_1: Option<String>,
    #[serde(rename = "Address2", default)]
    pub address_2: Option<String>,
    #[serde(rename = "City", default)]
    pub city: Option<String>,
    #[serde(rename = "State", default)]
    pub state: Option<String>,
    #[serde(rename = "ZIP", default)]
    pub zip: Option<String>,
    #[serde(rename = "Phone", default)]
    pub phone: Option<String>,
    #[serde(rename = "Cell Phone", default)]
    pub cell_phone: Option<String>,
}

impl CustomerRecord {
    /// Attribute values in `CUSTOMER_ATTRIBUTES` order.
    pub fn attributes(&self) -> [Option<&str>; 11] {
        [
            self.has_account.as_deref(),
            self.name.as_deref(),
            self.created.as_deref(),
            self.sales_amount.as_deref(),
            self.address_1.as_deref(),
            self.address_2.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
            self.zip.as_deref(),
            self.phone.as_deref(),
            self.cell_phone.as_deref(),
        ]
    }
}

/// Where and how to read the customer reference file.
#[derive(Debug, Clone)]
pub struct CustomerSource {
    pub path: PathBuf,
    pub encoding: &'static Encoding,
    pub delimiter: u8,
}

impl Default for CustomerSource {
    fn default() -> Self {
        CustomerSource {
            path: PathBuf::from(DEFAULT_CUSTOMER_FILE),
            encoding: WINDOWS_1252,
            delimiter: b',',
        }
    }
}

impl CustomerSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CustomerSource {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Selects the text encoding by its WHATWG label, e.g. `latin1` or `utf-8`.
    pub fn with_encoding_label(mut self, label: &str) -> Result<Self> {
        self.encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| Error::UnknownEncoding(label.to_owned()))?;
        Ok(self)
    }
}

/// Reads the customer file, normalizes the e-mail addresses and keeps the
/// first row for every address.
pub fn load_customer_data(source: &CustomerSource) -> Result<Vec<CustomerRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(source.delimiter)
        .from_path(&source.path)?;

    let headers = decode_record(rdr.byte_headers()?, source.encoding);
    if !headers.iter().any(|h| h == EMAIL_ADDRESS) {
        return Err(Error::MissingColumn {
            table: "customer data file",
            column: EMAIL_ADDRESS,
        });
    }

    let mut records = Vec::new();
    for raw in rdr.byte_records() {
        let record = decode_record(&raw?, source.encoding);
        records.push(record.deserialize::<CustomerRecord>(Some(&headers))?);
    }

    let read = records.len();
    let customers = drop_duplicate_emails(records);
    debug!(
        path = %source.path.display(),
        read,
        kept = customers.len(),
        "loaded customer data"
    );

    Ok(customers)
}

fn drop_duplicate_emails(records: Vec<CustomerRecord>) -> Vec<CustomerRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.email.clone()))
        .collect()
}

fn trim_and_lowercase<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| normalize_email(&s)).filter(|s| !s.is_empty()))
}
