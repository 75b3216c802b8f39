//! Transaction Classifier
//! Maps a transaction to a semantic type from the programs it touches

use crate::models::types::{TransactionRecord, TransactionType};
use crate::utils::constants::{NFT_PROGRAMS, SWAP_PROGRAMS, TOKEN_PROGRAMS};

/// Classify a transaction by the program ids its instructions reference.
/// Priority order: NFT marketplace > swap/DEX > token transfer > pool/stake
/// heuristic. Anything unmatched (including empty instruction lists) is Other.
pub fn classify(tx: &TransactionRecord) -> TransactionType {
    let mut saw_swap = false;
    let mut saw_token = false;
    let mut saw_defi = false;

    for ix in &tx.instructions {
        let program = ix.program_id.as_str();
        if NFT_PROGRAMS.contains(program) {
            // Highest priority, no later instruction can override it
            return TransactionType::Nft;
        }
        if SWAP_PROGRAMS.contains(program) {
            saw_swap = true;
        } else if TOKEN_PROGRAMS.contains(program) {
            saw_token = true;
        } else {
            let lowered = program.to_lowercase();
            if lowered.contains("pool") || lowered.contains("stake") {
                saw_defi = true;
            }
        }
    }

    if saw_swap {
        TransactionType::Swap
    } else if saw_token {
        TransactionType::Transfer
    } else if saw_defi {
        TransactionType::Defi
    } else {
        TransactionType::Other
    }
}
