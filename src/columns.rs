//! Header names shared by the loader, the joiner and the summarizer.

pub const EMAIL_ADDRESS: &str = "E-mail Address";
pub const HAS_ACCOUNT: &str = "Has Acct";
pub const NAME: &str = "Name";
pub const CREATED: &str = "Created";
pub const SALES_AMOUNT: &str = "Sales Amt.";
pub const ADDRESS_1: &str = "Address 1";
pub const ADDRESS_2: &str = "Address2";
pub const CITY: &str = "City";
pub const STATE: &str = "State";
pub const ZIP: &str = "ZIP";
pub const PHONE: &str = "Phone";
pub const CELL_PHONE: &str = "Cell Phone";

pub const CUSTOMER_EMAIL: &str = "Customer Email";
pub const BARCODE: &str = "Barcode";
pub const ORDER_NUMBER: &str = "Order #";
pub const TRANSACTION_COUNT: &str = "# of transactions";

pub const PASSENGER: &str = "Passenger";
pub const BP_ORIGIN: &str = "BP Origin";
pub const BP_DESTINATION: &str = "BP Destination";
pub const TRIP_ORIGIN: &str = "Trip Origin";
pub const TRIP_DESTINATION: &str = "Trip Destination";

/// Customer attributes in the order they appear in the customer data file.
pub const CUSTOMER_ATTRIBUTES: [&str; 11] = [
    HAS_ACCOUNT,
    NAME,
    CREATED,
    SALES_AMOUNT,
    ADDRESS_1,
    ADDRESS_2,
    CITY,
    STATE,
    ZIP,
    PHONE,
    CELL_PHONE,
];

/// Customer attributes in the order the summary reports them.
pub const SUMMARY_ATTRIBUTES: [&str; 11] = [
    NAME,
    HAS_ACCOUNT,
    CREATED,
    SALES_AMOUNT,
    ADDRESS_1,
    ADDRESS_2,
    CITY,
    STATE,
    ZIP,
    PHONE,
    CELL_PHONE,
];

/// Lower-cases and trims an e-mail address so equal addresses compare equal.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
