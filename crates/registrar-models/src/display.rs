//! Response shaping helpers.
//!
//! Internal records carry UUIDs and snake_case enum values. External DTOs
//! additionally carry a short role-prefixed display id (`STU-1A2B3C4D`) and
//! a human label for every enum (`at_risk` -> `At Risk`).
//!
//! Timestamps serialize through chrono as RFC 3339 and dates as
//! `YYYY-MM-DD`, so DTOs keep `DateTime<Utc>`/`NaiveDate` fields as-is.

use uuid::Uuid;

/// Enums exposed to clients as a machine value plus a display label.
pub trait Labeled {
    /// The snake_case value stored in the database and sent on the wire.
    fn as_str(&self) -> &'static str;

    fn label(&self) -> String {
        humanize(self.as_str())
    }
}

/// `on_leave` -> `On Leave`.
pub fn humanize(value: &str) -> String {
    value
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prefix followed by the first 8 hex digits of the UUID, uppercased.
pub fn display_id(prefix: &str, id: &Uuid) -> String {
    let simple = id.simple().to_string();
    format!("{}-{}", prefix, simple[..8].to_uppercase())
}
