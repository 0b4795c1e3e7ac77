//! Fixed storage keys for the usage gate

/// Number of free-tier actions consumed, stored as a decimal string
pub const QUERY_COUNT: &str = "governai_query_count";

/// Paid entitlement flag; `"true"` when paid, absent otherwise
pub const PAID: &str = "governai_paid";
