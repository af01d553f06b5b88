pub mod connection;
pub mod factsheet;
pub mod order_execution;
pub mod template;

pub use connection::ConnectionRepository;
pub use factsheet::FactsheetRepository;
pub use order_execution::OrderExecutionRepository;
pub use template::TemplateRepository;

/// Pagination parameters shared by every list query (spec §4.4: "queries
/// expose pagination (limit, offset) and ordering created_at DESC as the
/// default").
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination { limit: 50, offset: 0 }
    }
}
