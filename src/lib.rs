//! Customer enrichment for uploaded order data.
//!
//! The pipeline runs in three steps:
//!
//! 1. [`load_customer_data`] reads the customer reference file and keeps one
//!    row per normalized e-mail address.
//! 2. [`enrich_uploaded_data`] left-joins an uploaded table against it.
//! 3. [`generate_customer_summary`] rolls the enriched rows up per customer.
//!
//! Trip segment uploads can first go through [`assign_trip_endpoints`].

pub mod columns;
pub mod customers;
pub mod enrichment;
pub mod error;
pub mod records;
pub mod summary;
pub mod trips;

pub use customers::{load_customer_data, CustomerRecord, CustomerSource, DEFAULT_CUSTOMER_FILE};
pub use enrichment::enrich_uploaded_data;
pub use error::{Error, Result};
pub use records::{read_table, write_table, Table, Value};
pub use summary::{generate_customer_summary, write_summary, CustomerSummary};
pub use trips::assign_trip_endpoints;
