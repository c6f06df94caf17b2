//! Sentinel stage: field report acquisition and the extraction request

use async_trait::async_trait;

/// Source of the raw field report the Sentinel structures.
#[async_trait]
pub trait FieldReportSource: Send + Sync {
    async fn acquire_field_report(&self) -> String;

    fn source_name(&self) -> &'static str;
}

/// Fixed Garissa County report for October 2025.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedFieldReport;

const GARISSA_OCTOBER_2025: &str = "
Field Report - Garissa County - October 2025
Vegetation Index (3-month) is currently at 18.5.
Pastoralists reporting trekking 12km to water sources, up from 8km last month.
Goat prices have dropped to 2500 KES at the local market.
Maize prices are stable at 100 KES per kg.
";

#[async_trait]
impl FieldReportSource for SimulatedFieldReport {
    async fn acquire_field_report(&self) -> String {
        GARISSA_OCTOBER_2025.to_string()
    }

    fn source_name(&self) -> &'static str {
        "simulated"
    }
}

/// Wrap a report in the Sentinel's extraction request.
pub fn extraction_prompt(report: &str) -> String {
    format!("Extract the key metrics from this report and format as JSON: {report}")
}
