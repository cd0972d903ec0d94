use std::collections::{hash_map::Entry, HashMap};

use tracing::{debug, info};

use crate::{
    columns::{normalize_email, BARCODE, CUSTOMER_ATTRIBUTES, CUSTOMER_EMAIL},
    customers::CustomerRecord,
    error::{Error, Result},
    records::{Table, Value},
};

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// Left-joins the uploaded rows against the customer data on the normalized
/// e-mail address. Every uploaded row is kept exactly once.
pub fn enrich_uploaded_data(mut uploaded: Table, customers: &[CustomerRecord]) -> Result<Table> {
    if !uploaded.has_column(CUSTOMER_EMAIL) {
        return Err(Error::MissingColumn {
            table: "uploaded data",
            column: CUSTOMER_EMAIL,
        });
    }

    uploaded.map_column(CUSTOMER_EMAIL, normalize_value);

    let barcodes = uploaded
        .column(BARCODE)
        .map(|values| values.into_iter().map(Value::to_text).collect::<Vec<_>>());
    if let Some(barcodes) = &barcodes {
        uploaded.set_column(BARCODE, barcodes.clone());
    }

    let index = index_by_email(customers)?;

    let emails: Vec<Option<String>> = uploaded
        .column(CUSTOMER_EMAIL)
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.as_text().map(|s| s.into_owned()))
        .collect();

    let matches: Vec<Option<&CustomerRecord>> = emails
        .iter()
        .map(|email| email.as_deref().and_then(|e| index.get(e).copied()))
        .collect();

    for (i, column) in CUSTOMER_ATTRIBUTES.iter().enumerate() {
        let name = if uploaded.rename_column(column, format!("{column}{LEFT_SUFFIX}")) {
            format!("{column}{RIGHT_SUFFIX}")
        } else {
            (*column).to_owned()
        };

        let values = matches
            .iter()
            .map(|customer| customer.and_then(|c| c.attributes()[i]).into())
            .collect();
        uploaded.add_column(name, values);
    }

    if let Some(barcodes) = barcodes {
        uploaded.set_column(BARCODE, barcodes);
    }

    let matched = matches.iter().filter(|m| m.is_some()).count();
    info!(
        rows = uploaded.len(),
        matched,
        unmatched = uploaded.len() - matched,
        "enriched uploaded data"
    );

    Ok(uploaded)
}

fn normalize_value(value: &Value) -> Value {
    match value.as_text() {
        Some(text) => Value::Text(normalize_email(&text)),
        None => Value::Null,
    }
}

/// Index of the customer data by e-mail. Fails if an address maps to more
/// than one customer, since the join would then duplicate uploaded rows.
fn index_by_email(customers: &[CustomerRecord]) -> Result<HashMap<&str, &CustomerRecord>> {
    let mut index = HashMap::with_capacity(customers.len());

    for customer in customers {
        let Some(email) = customer.email.as_deref() else {
            continue;
        };

        match index.entry(email) {
            Entry::Occupied(_) => {
                return Err(Error::NotManyToOne {
                    key: email.to_owned(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(customer);
            }
        }
    }

    debug!(customers = index.len(), "indexed customer data");

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{CITY, NAME, ZIP};

    fn customer(email: &str, name: &str) -> CustomerRecord {
        CustomerRecord {
            email: Some(email.to_owned()),
            name: Some(name.to_owned()),
            city: Some("Boston".to_owned()),
            ..Default::default()
        }
    }

    fn uploaded(rows: Vec<Vec<Value>>) -> Table {
        let mut table = Table::new(["Order #", CUSTOMER_EMAIL, BARCODE]);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    #[test]
    fn left_join_keeps_every_row() {
        let customers = vec![customer("a@x.com", "Ann"), customer("b@x.com", "Ben")];
        let table = uploaded(vec![
            vec!["1".into(), " A@X.com ".into(), "00123".into()],
            vec!["2".into(), "a@x.com".into(), Value::Integer(123)],
            vec!["3".into(), "nobody@x.com".into(), Value::Null],
            vec!["4".into(), Value::Null, Value::Null],
        ]);

        let enriched = enrich_uploaded_data(table, &customers).unwrap();

        assert_eq!(enriched.len(), 4);
        assert_eq!(enriched.get(0, CUSTOMER_EMAIL), Some(&Value::from("a@x.com")));
        assert_eq!(enriched.get(0, NAME), Some(&Value::from("Ann")));
        assert_eq!(enriched.get(1, NAME), Some(&Value::from("Ann")));
        assert_eq!(enriched.get(1, CITY), Some(&Value::from("Boston")));
    }

    #[test]
    fn unmatched_rows_get_null_attributes() {
        let customers = vec![customer("a@x.com", "Ann")];
        let table = uploaded(vec![vec!["1".into(), "zed@x.com".into(), Value::Null]]);

        let enriched = enrich_uploaded_data(table, &customers).unwrap();

        for column in CUSTOMER_ATTRIBUTES {
            assert_eq!(enriched.get(0, column), Some(&Value::Null), "{column}");
        }
    }

    #[test]
    fn reference_email_column_is_not_attached() {
        let enriched = enrich_uploaded_data(uploaded(vec![]), &[customer("a@x.com", "Ann")]).unwrap();

        assert!(!enriched.has_column(crate::columns::EMAIL_ADDRESS));
        assert_eq!(
            enriched.headers().iter().filter(|h| h.contains("mail")).count(),
            1
        );
        assert_eq!(enriched.headers().len(), 3 + CUSTOMER_ATTRIBUTES.len());
    }

    #[test]
    fn barcodes_keep_their_text_form() {
        let table = uploaded(vec![
            vec!["1".into(), "a@x.com".into(), "00123".into()],
            vec!["2".into(), "a@x.com".into(), Value::Integer(123)],
        ]);

        let enriched = enrich_uploaded_data(table, &[customer("a@x.com", "Ann")]).unwrap();

        assert_eq!(enriched.get(0, BARCODE), Some(&Value::from("00123")));
        assert_eq!(enriched.get(1, BARCODE), Some(&Value::from("123")));
    }

    #[test]
    fn duplicate_customer_emails_fail_validation() {
        let customers = vec![customer("a@x.com", "Ann"), customer("a@x.com", "Annie")];
        let table = uploaded(vec![vec!["1".into(), "a@x.com".into(), Value::Null]]);

        let err = enrich_uploaded_data(table, &customers).unwrap_err();

        assert!(matches!(err, Error::NotManyToOne { key } if key == "a@x.com"));
    }

    #[test]
    fn missing_customer_email_column() {
        let table = Table::new(["Order #", "Email"]);

        let err = enrich_uploaded_data(table, &[]).unwrap_err();

        assert!(matches!(
            err,
            Error::MissingColumn {
                column: CUSTOMER_EMAIL,
                ..
            }
        ));
    }

    #[test]
    fn overlapping_columns_get_suffixes() {
        let mut table = Table::new([CUSTOMER_EMAIL, NAME]);
        table.push_row(vec!["a@x.com".into(), "uploaded name".into()]);

        let enriched = enrich_uploaded_data(table, &[customer("a@x.com", "Ann")]).unwrap();

        assert!(!enriched.has_column(NAME));
        assert_eq!(enriched.get(0, "Name_x"), Some(&Value::from("uploaded name")));
        assert_eq!(enriched.get(0, "Name_y"), Some(&Value::from("Ann")));
        assert_eq!(enriched.get(0, ZIP), Some(&Value::Null));
    }
}
