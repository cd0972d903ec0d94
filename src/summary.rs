use serde::Serialize;
use std::{
    collections::{BTreeMap, HashSet},
    io,
};

use tracing::debug;

use crate::{
    columns::{normalize_email, CUSTOMER_EMAIL, ORDER_NUMBER, SUMMARY_ATTRIBUTES},
    error::{Error, Result},
    records::Table,
};

/// One row per customer, keyed by normalized e-mail.
#[derive(Debug, Serialize, PartialEq, Default, Clone)]
pub struct CustomerSummary {
    #[serde(rename = "Customer Email")]
    pub email: String,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Has Acct")]
    pub has_account: Option<String>,
    #[serde(rename = "Created")]
    pub created: Option<String>,
    #[serde(rename = "Sales Amt.")]
    pub sales_amount: Option<String>,
    #[serde(rename = "Address 1")]
    pub address_1: Option<String>,
    #[serde(rename = "Address2")]
    pub address_2: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "ZIP")]
    pub zip: Option<String>,
    #[serde(rename = "Phone")]
    pub phone: Option<String>,
    #[serde(rename = "Cell Phone")]
    pub cell_phone: Option<String>,
    #[serde(rename = "# of transactions")]
    pub transactions: usize,
}

#[derive(Default)]
struct CustomerGroup {
    attributes: [Option<String>; 11],
    orders: HashSet<String>,
}

/// Rolls the enriched rows up to one row per customer, counting distinct
/// order numbers.
pub fn generate_customer_summary(enriched: &Table) -> Result<Vec<CustomerSummary>> {
    let Some(email_idx) = enriched.column_index(CUSTOMER_EMAIL) else {
        return Err(Error::MissingColumn {
            table: "data",
            column: CUSTOMER_EMAIL,
        });
    };

    let missing: Vec<&'static str> = SUMMARY_ATTRIBUTES
        .iter()
        .chain(std::iter::once(&ORDER_NUMBER))
        .copied()
        .filter(|column| !enriched.has_column(column))
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns {
            table: "customer data",
            columns: missing,
        });
    }

    let attribute_idx = SUMMARY_ATTRIBUTES.map(|column| enriched.column_index(column));
    let order_idx = enriched.column_index(ORDER_NUMBER);

    let mut groups: BTreeMap<String, CustomerGroup> = BTreeMap::new();
    for row in enriched.rows() {
        // Rows without an e-mail have no customer to roll up into.
        let Some(email) = row[email_idx].as_text().map(|e| normalize_email(&e)) else {
            continue;
        };

        let group = groups.entry(email).or_default();

        for (slot, idx) in group.attributes.iter_mut().zip(attribute_idx) {
            if slot.is_none() {
                *slot = idx.and_then(|i| row[i].as_text()).map(|v| v.into_owned());
            }
        }

        if let Some(order) = order_idx.and_then(|i| row[i].as_text()) {
            group.orders.insert(order.into_owned());
        }
    }

    debug!(
        rows = enriched.len(),
        customers = groups.len(),
        "generated customer summary"
    );

    Ok(groups.into_iter().map(into_summary).collect())
}

fn into_summary((email, group): (String, CustomerGroup)) -> CustomerSummary {
    let [name, has_account, created, sales_amount, address_1, address_2, city, state, zip, phone, cell_phone] =
        group.attributes;

    CustomerSummary {
        email,
        name,
        has_account,
        created,
        sales_amount,
        address_1,
        address_2,
        city,
        state,
        zip,
        phone,
        cell_phone,
        transactions: group.orders.len(),
    }
}

pub fn write_summary<W: io::Write>(summary: &[CustomerSummary], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    for record in summary {
        wtr.serialize(record)?;
    }

    wtr.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::columns::CUSTOMER_ATTRIBUTES;
    use crate::customers::{load_customer_data, CustomerSource};
    use crate::enrichment::enrich_uploaded_data;
    use crate::records::{read_table, Value};

    use super::*;

    fn enriched_table(rows: Vec<(&str, &str, Option<&str>)>) -> Table {
        let mut table = Table::new(
            [CUSTOMER_EMAIL, ORDER_NUMBER]
                .into_iter()
                .chain(CUSTOMER_ATTRIBUTES),
        );
        for (email, order, name) in rows {
            let mut row = vec![Value::from(email), Value::from(order)];
            row.resize(table.headers().len(), Value::Null);
            if let Some(name) = name {
                let idx = table.column_index("Name").unwrap();
                row[idx] = Value::from(name);
            }
            table.push_row(row);
        }
        table
    }

    #[test]
    fn counts_distinct_orders() {
        let table = enriched_table(vec![
            ("a@x.com", "1", Some("Ann")),
            ("a@x.com", "1", Some("Ann")),
            ("a@x.com", "2", Some("Ann")),
        ]);

        let summary = generate_customer_summary(&table).unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].email, "a@x.com");
        assert_eq!(summary[0].name.as_deref(), Some("Ann"));
        assert_eq!(summary[0].transactions, 2);
    }

    #[test]
    fn groups_on_normalized_email() {
        let table = enriched_table(vec![
            (" B@x.com", "7", None),
            ("b@X.COM ", "8", Some("Ben")),
            ("a@x.com", "1", Some("Ann")),
        ]);

        let summary = generate_customer_summary(&table).unwrap();

        let emails: Vec<_> = summary.iter().map(|s| s.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
        // First non-null value wins.
        assert_eq!(summary[1].name.as_deref(), Some("Ben"));
        assert_eq!(summary[1].transactions, 2);
    }

    #[test]
    fn missing_columns_are_reported_together() {
        let table = Table::new([CUSTOMER_EMAIL, "Name", "City"]);

        let err = generate_customer_summary(&table).unwrap_err();

        match err {
            Error::MissingColumns { columns, .. } => assert_eq!(
                columns,
                vec![
                    "Has Acct",
                    "Created",
                    "Sales Amt.",
                    "Address 1",
                    "Address2",
                    "State",
                    "ZIP",
                    "Phone",
                    "Cell Phone",
                    "Order #",
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_email_column() {
        let table = Table::new(["Order #", "Name"]);

        let err = generate_customer_summary(&table).unwrap_err();

        assert_eq!(err.to_string(), "The data must contain a 'Customer Email' column.");
    }

    #[test]
    fn write_summary_uses_readable_headers() {
        let summary = vec![CustomerSummary {
            email: "a@x.com".to_owned(),
            name: Some("Ann".to_owned()),
            transactions: 3,
            ..Default::default()
        }];

        let mut out = Vec::new();
        write_summary(&summary, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(
            out,
            "Customer Email,Name,Has Acct,Created,Sales Amt.,Address 1,Address2,City,State,ZIP,Phone,Cell Phone,# of transactions\n\
             a@x.com,Ann,,,,,,,,,,,3\n"
        );
    }

    #[test]
    fn test_load_enrich_summarize() {
        let customers =
            load_customer_data(&CustomerSource::new("test-inputs/customer_data.csv")).unwrap();
        let uploaded = read_table("test-inputs/uploaded.csv").unwrap();

        let enriched = enrich_uploaded_data(uploaded, &customers).unwrap();
        assert_eq!(enriched.len(), 10);

        let summary = generate_customer_summary(&enriched).unwrap();

        let counts: Vec<_> = summary
            .iter()
            .map(|s| (s.email.as_str(), s.transactions))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("alice@example.com", 3),
                ("bob@example.com", 2),
                ("carol@example.com", 1),
                ("stranger@example.com", 2),
            ]
        );

        assert_eq!(summary[0].name.as_deref(), Some("Alice Smith"));
        assert_eq!(summary[0].zip.as_deref(), Some("02134"));
        assert_eq!(summary[1].name.as_deref(), Some("Bob Muñoz"));
        assert_eq!(summary[2].city.as_deref(), Some("Montréal"));

        let stranger = &summary[3];
        assert_eq!(stranger.name, None);
        assert_eq!(stranger.has_account, None);
        assert_eq!(stranger.cell_phone, None);
    }
}
