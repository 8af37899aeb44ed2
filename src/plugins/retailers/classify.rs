use crate::models::StockStatus;

/// Lowercase phrases that mark a page or payload as out of stock (checked
/// first) or in stock.
#[derive(Debug, Clone, Copy)]
pub struct StockSignals {
    pub negative: &'static [&'static str],
    pub positive: &'static [&'static str],
}

impl StockSignals {
    /// Negative phrases win over positive ones: a page advertising pickup
    /// next to a "not available at this store" banner is out of stock.
    pub fn classify(&self, content: &str) -> StockStatus {
        let normalized = content.to_lowercase();

        if self.negative.iter().any(|term| normalized.contains(term)) {
            return StockStatus::OutOfStock;
        }
        if self.positive.iter().any(|term| normalized.contains(term)) {
            return StockStatus::InStock;
        }
        StockStatus::Unknown
    }
}
