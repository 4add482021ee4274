use mc_directory::directory::SortOrder;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_price(raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| format!("'{raw}' is not a non-negative price"))
}

pub(crate) fn parse_sort(raw: &str) -> Result<SortOrder, String> {
    raw.parse::<SortOrder>().map_err(|err| {
        let options: Vec<&str> = SortOrder::ordered()
            .into_iter()
            .map(SortOrder::as_str)
            .collect();
        format!("{err} (expected one of: {})", options.join(", "))
    })
}
