use futures_util::future::join_all;
use log::debug;
use std::sync::Arc;

use super::{Installation, InstallationFinder};
use crate::runtime::Runtime;

impl<R: Runtime + 'static> InstallationFinder<R> {
    /// Probe every candidate at once on the blocking pool and return the
    /// installations in priority order.
    ///
    /// Yields the same list as collecting [`Self::available_installations`],
    /// without the short-circuit.
    #[tracing::instrument(skip(self))]
    pub async fn available_installations_concurrent(&self) -> Vec<Installation> {
        let candidates: Vec<_> = self.resolved().collect();

        let probes = join_all(candidates.iter().map(|(_, candidate)| {
            let runtime = Arc::clone(&self.runtime);
            let path = candidate.exe_path.clone();
            tokio::task::spawn_blocking(move || runtime.exists(&path))
        }))
        .await;

        let mut found_row = None;
        candidates
            .into_iter()
            .zip(probes)
            .filter_map(|((row, candidate), probe)| {
                if found_row == Some(row) {
                    return None;
                }
                match probe {
                    Ok(true) => {
                        found_row = Some(row);
                        Some(candidate.validated())
                    }
                    Ok(false) => None,
                    Err(e) => {
                        debug!(
                            "Probe for {:?} did not complete, treating as absent: {}",
                            candidate.exe_path, e
                        );
                        None
                    }
                }
            })
            .collect()
    }
}
