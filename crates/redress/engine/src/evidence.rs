//! Evidence ledger: append-only artifact bookkeeping over the store tables.
//!
//! No update or delete exists here on purpose; corrections are made by
//! appending superseding evidence so the full history survives for audit.

use crate::store::Tables;
use redress_types::{EvidenceLink, EvidenceType, ResolutionId};

impl Tables {
    pub(crate) fn append_evidence(&mut self, link: EvidenceLink) {
        self.evidence_by_resolution
            .entry(link.resolution_id.clone())
            .or_default()
            .push(link.id.clone());
        self.evidence.insert(link.id.clone(), link);
    }

    /// Evidence for a resolution in append order.
    pub(crate) fn evidence_for(&self, resolution_id: &ResolutionId) -> Vec<EvidenceLink> {
        self.evidence_by_resolution
            .get(resolution_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.evidence.get(id).cloned())
            .collect()
    }

    /// The set-membership view the submission policy evaluates against.
    pub(crate) fn evidence_types_for(&self, resolution_id: &ResolutionId) -> Vec<EvidenceType> {
        self.evidence_by_resolution
            .get(resolution_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.evidence.get(id))
            .map(|link| link.evidence_type)
            .collect()
    }
}
