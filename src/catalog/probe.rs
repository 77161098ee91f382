//! Count the maps available in each category without downloading anything.

use crate::catalog::client::CatalogClient;
use crate::output::ProbeReport;
use tracing::warn;

/// Count `.dd2vtt` files per category. A category that cannot be listed
/// keeps its error in the report; the rest are still probed.
pub async fn probe<S: AsRef<str>>(client: &CatalogClient, categories: &[S]) -> ProbeReport {
    let mut report = ProbeReport::default();
    for category in categories {
        let category = category.as_ref();
        let count = client.list_maps(category).await.map(|maps| maps.len());
        if let Err(ref e) = count {
            warn!("Probe failed for {}: {}", category, e);
        }
        report.counts.push((category.to_string(), count));
    }
    report
}

/// Probe every configured category.
pub async fn probe_all(client: &CatalogClient) -> ProbeReport {
    let categories = client.config().categories.clone();
    probe(client, &categories).await
}
