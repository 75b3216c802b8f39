//! Entity Identification
//! Injected collaborator boundary plus the built-in known-program labeler

use crate::models::types::{ClassifiedTransaction, EntityLabel};
use crate::utils::constants::known_program_label;
use std::collections::HashSet;

/// Confidence for labels backed by the static program registry
const KNOWN_PROGRAM_CONFIDENCE: u8 = 95;

/// Attaches identity labels to addresses seen in the analyzed history.
/// Results are merged verbatim into the final report.
pub trait EntityIdentifier: Send + Sync {
    fn identify_entities(
        &self,
        transactions: &[ClassifiedTransaction],
        target: &str,
    ) -> Vec<EntityLabel>;
}

/// Default identifier: matches addresses against the static registry of
/// well-known programs. One label per address, discovery order.
pub struct KnownProgramIdentifier;

impl EntityIdentifier for KnownProgramIdentifier {
    fn identify_entities(
        &self,
        transactions: &[ClassifiedTransaction],
        target: &str,
    ) -> Vec<EntityLabel> {
        let mut labels = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for tx in transactions {
            let addresses = tx
                .record
                .accounts
                .iter()
                .chain(tx.record.instructions.iter().map(|ix| &ix.program_id));
            for address in addresses {
                if address == target || !seen.insert(address.as_str()) {
                    continue;
                }
                if let Some(name) = known_program_label(address) {
                    labels.push(EntityLabel {
                        address: address.clone(),
                        name: name.to_string(),
                        entity_type: "program".to_string(),
                        confidence: KNOWN_PROGRAM_CONFIDENCE,
                    });
                }
            }
        }

        labels
    }
}
