use super::types::{Aggregation, SearchBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Avg,
    Sum,
}

/// Distinct count of a keyword field plus its top buckets, each bucket
/// optionally carrying numeric metrics.
#[derive(Debug, Clone)]
pub struct GroupedAggregation {
    field: String,
    size: usize,
    metrics: Vec<(String, Metric, String)>,
}

impl GroupedAggregation {
    /// `size` bounds both the bucket count and the cardinality precision.
    pub fn new(field: &str, size: usize) -> Self {
        Self {
            field: field.to_string(),
            size,
            metrics: Vec::new(),
        }
    }

    pub fn metric(mut self, name: &str, metric: Metric, field: &str) -> Self {
        self.metrics.push((name.to_string(), metric, field.to_string()));
        self
    }

    /// Add `<prefix>_avg` and `<prefix>_sum` over `field`.
    pub fn avg_and_sum(self, prefix: &str, field: &str) -> Self {
        self.metric(&format!("{prefix}_avg"), Metric::Avg, field)
            .metric(&format!("{prefix}_sum"), Metric::Sum, field)
    }

    /// Attach as `<count_name>` (cardinality) and `<group_name>` (terms).
    pub fn attach(self, body: SearchBody, count_name: &str, group_name: &str) -> SearchBody {
        let group = self
            .metrics
            .iter()
            .fold(Aggregation::terms(&self.field, self.size), |group, (name, metric, field)| {
                let sub = match metric {
                    Metric::Avg => Aggregation::avg(field),
                    Metric::Sum => Aggregation::sum(field),
                };
                group.with_sub(name.as_str(), sub)
            });

        body.aggregation(count_name, Aggregation::cardinality(&self.field, self.size))
            .aggregation(group_name, group)
    }
}
