//! Instruction decoder module
//! Parses known transfer instruction layouts to extract moved amounts

use crate::models::types::{InstructionRecord, TransactionRecord};
use crate::utils::constants::{
    lamports_to_sol, token_amount_to_ui, SYSTEM_PROGRAM, TOKEN_2022_PROGRAM, TOKEN_PROGRAM,
};
use tracing::debug;

/// System program Transfer variant (u32 LE discriminant)
const SYSTEM_TRANSFER_DISCRIMINANT: u32 = 2;

/// SPL token instruction tags
const TOKEN_TRANSFER_TAG: u8 = 3;
const TOKEN_TRANSFER_CHECKED_TAG: u8 = 12;

/// Default decimal convention for token transfers that carry no decimals byte
const DEFAULT_TOKEN_DECIMALS: u8 = 9;

/// A value movement decoded from a single instruction
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTransfer {
    pub source: String,
    pub destination: String,
    /// Amount in UI units (SOL for native transfers)
    pub amount: f64,
}

/// Decoder for known transfer instruction layouts.
/// Unknown program layouts are never guessed; they simply decode to nothing.
pub struct TransferDecoder;

impl TransferDecoder {
    /// Decode every recognizable transfer in a transaction
    pub fn decode_transfers(tx: &TransactionRecord) -> Vec<DecodedTransfer> {
        tx.instructions
            .iter()
            .filter_map(Self::decode_instruction)
            .collect()
    }

    /// Decode a single instruction, selecting the strategy by program id
    pub fn decode_instruction(ix: &InstructionRecord) -> Option<DecodedTransfer> {
        match ix.program_id.as_str() {
            SYSTEM_PROGRAM => Self::try_decode_system_transfer(ix),
            TOKEN_PROGRAM | TOKEN_2022_PROGRAM => Self::try_decode_token_transfer(ix),
            _ => {
                if !ix.data.is_empty() {
                    debug!(
                        "No decoder for program {} (data 0x{}..)",
                        ix.program_id,
                        hex::encode(&ix.data[..ix.data.len().min(8)])
                    );
                }
                None
            }
        }
    }

    /// System program: Transfer { lamports } is variant 2, bincode layout
    /// (u32 LE discriminant + u64 LE lamports), accounts [from, to]
    fn try_decode_system_transfer(ix: &InstructionRecord) -> Option<DecodedTransfer> {
        if ix.data.len() < 12 {
            return None;
        }
        let discriminant = u32::from_le_bytes(ix.data[0..4].try_into().ok()?);
        if discriminant != SYSTEM_TRANSFER_DISCRIMINANT {
            return None;
        }
        let lamports = u64::from_le_bytes(ix.data[4..12].try_into().ok()?);

        Some(DecodedTransfer {
            source: ix.accounts.first()?.clone(),
            destination: ix.accounts.get(1)?.clone(),
            amount: lamports_to_sol(lamports),
        })
    }

    /// SPL token program: tag 3 = Transfer (u64 LE amount, accounts
    /// [source, destination, authority]), tag 12 = TransferChecked (u64 LE
    /// amount + decimals byte, accounts [source, mint, destination, authority])
    fn try_decode_token_transfer(ix: &InstructionRecord) -> Option<DecodedTransfer> {
        match ix.data.first()? {
            &TOKEN_TRANSFER_TAG if ix.data.len() >= 9 => {
                let amount = u64::from_le_bytes(ix.data[1..9].try_into().ok()?);
                Some(DecodedTransfer {
                    source: ix.accounts.first()?.clone(),
                    destination: ix.accounts.get(1)?.clone(),
                    // Plain Transfer carries no decimals, assume the native convention
                    amount: token_amount_to_ui(amount, DEFAULT_TOKEN_DECIMALS),
                })
            }
            &TOKEN_TRANSFER_CHECKED_TAG if ix.data.len() >= 10 => {
                let amount = u64::from_le_bytes(ix.data[1..9].try_into().ok()?);
                let decimals = ix.data[9];
                Some(DecodedTransfer {
                    source: ix.accounts.first()?.clone(),
                    destination: ix.accounts.get(2)?.clone(),
                    amount: token_amount_to_ui(amount, decimals),
                })
            }
            _ => None,
        }
    }
}
