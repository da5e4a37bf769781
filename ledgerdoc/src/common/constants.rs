// document constants
pub const DOC_ID: &str = "documentId";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

// statement constants
pub const PLACEHOLDER: &str = "?";
pub const NESTED_ALIAS: &str = "t";

// driver defaults
pub const DEFAULT_MAX_CONCURRENT_TRANSACTIONS: usize = 10;
pub const DEFAULT_RETRY_LIMIT: u32 = 4;
