//! Repair of artifacts whose attribution write never landed
//!
//! A create writes the artifact node first and the attribution second. When
//! the second write fails the node stays behind with a qualified name but no
//! model version edge. The owner is recovered from the name prefix.

use super::{ArtifactService, RegistryResult};
use crate::convert::name;
use crate::model::ArtifactKindTag;
use crate::store::{Attribution, ListOperationOptions};
use serde::Serialize;
use tracing::{info, warn};

/// What a reconciliation pass found and fixed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Artifacts examined
    pub scanned: usize,
    /// Attributions written by this pass
    pub repaired: Vec<Attribution>,
    /// Unattributed artifacts whose owner could not be recovered
    pub unresolved: Vec<i64>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty() && self.unresolved.is_empty()
    }
}

impl ArtifactService {
    /// Write missing model version attributions for every artifact
    ///
    /// Running it again after a successful pass finds nothing to repair.
    /// Artifact nodes are never modified.
    pub async fn reconcile_attributions(&self) -> RegistryResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for kind in [ArtifactKindTag::Model, ArtifactKindTag::Doc] {
            let type_name = self.types().artifact(kind).name.clone();
            let mut token: Option<String> = None;

            loop {
                let mut options =
                    ListOperationOptions::new().with_max_result_size(self.reconcile_page_size);
                if let Some(t) = token.take() {
                    options = options.with_page_token(t);
                }
                let page = self.store.get_artifacts_by_type(&type_name, &options).await?;

                for node in &page.artifacts {
                    let Some(artifact_id) = node.id else { continue };
                    report.scanned += 1;
                    if self.find_model_version(artifact_id).await?.is_some() {
                        continue;
                    }
                    self.repair(artifact_id, node.name.as_deref(), &mut report).await?;
                }

                match page.next_page_token {
                    Some(next) => token = Some(next),
                    None => break,
                }
            }
        }

        info!(
            scanned = report.scanned,
            repaired = report.repaired.len(),
            unresolved = report.unresolved.len(),
            "attribution reconciliation finished"
        );
        Ok(report)
    }

    async fn repair(
        &self,
        artifact_id: i64,
        stored_name: Option<&str>,
        report: &mut ReconcileReport,
    ) -> RegistryResult<()> {
        let owner = match stored_name.map(name::split) {
            Some((Some(owner), _)) => owner,
            _ => {
                warn!(artifact_id, name = ?stored_name, "unattributed artifact has no owner prefix");
                report.unresolved.push(artifact_id);
                return Ok(());
            }
        };

        if !self.model_version_exists(owner).await? {
            warn!(artifact_id, model_version_id = owner, "owner of unattributed artifact does not exist");
            report.unresolved.push(artifact_id);
            return Ok(());
        }

        let edge = Attribution {
            context_id: owner,
            artifact_id,
        };
        self.store.put_attributions(vec![edge]).await?;
        warn!(artifact_id, model_version_id = owner, "restored missing attribution");
        report.repaired.push(edge);
        Ok(())
    }
}
