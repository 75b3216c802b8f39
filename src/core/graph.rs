//! Graph Builder
//! Folds a transaction list into the node/edge interaction graph anchored at
//! the target address

use crate::models::types::{ClassifiedTransaction, GraphEdge, GraphNode, NodeRole};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Build the interaction graph for a target address.
///
/// The target node always exists (even for empty input) and is first in the
/// node list; counterparty nodes follow in discovery order. One edge is
/// emitted per (transaction, distinct non-target account) pair, identified by
/// `target|account|signature` so parallel edges between the same pair never
/// collide. Transactions without an account list are skipped.
pub fn build_graph(
    transactions: &[ClassifiedTransaction],
    target: &str,
    target_balance: Option<f64>,
) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let mut nodes: Vec<GraphNode> = vec![GraphNode {
        address: target.to_string(),
        role: NodeRole::Wallet,
        tx_count: 0,
        last_active: None,
        balance: target_balance,
    }];
    let mut index: HashMap<String, usize> = HashMap::new();
    index.insert(target.to_string(), 0);

    let mut edges: Vec<GraphEdge> = Vec::new();

    for tx in transactions {
        if tx.record.accounts.is_empty() {
            continue;
        }

        // Missing block times fall back to "now", a documented approximation
        let timestamp = tx
            .record
            .block_datetime()
            .unwrap_or_else(Utc::now);

        touch_node(&mut nodes, 0, timestamp);

        let mut seen_in_tx: Vec<&str> = Vec::new();
        for account in &tx.record.accounts {
            if account == target || seen_in_tx.contains(&account.as_str()) {
                continue;
            }
            seen_in_tx.push(account);

            match index.get(account.as_str()) {
                Some(&i) => touch_node(&mut nodes, i, timestamp),
                None => {
                    // Role is fixed at first sight
                    let role = if tx
                        .record
                        .instructions
                        .iter()
                        .any(|ix| &ix.program_id == account)
                    {
                        NodeRole::Program
                    } else {
                        NodeRole::Wallet
                    };
                    index.insert(account.clone(), nodes.len());
                    nodes.push(GraphNode {
                        address: account.clone(),
                        role,
                        tx_count: 1,
                        last_active: Some(timestamp),
                        balance: None,
                    });
                }
            }

            edges.push(GraphEdge {
                id: format!("{}|{}|{}", target, account, tx.signature()),
                source: target.to_string(),
                target: account.clone(),
                signature: tx.signature().to_string(),
                tx_type: tx.tx_type,
                timestamp,
            });
        }
    }

    (nodes, edges)
}

fn touch_node(nodes: &mut [GraphNode], index: usize, timestamp: DateTime<Utc>) {
    let node = &mut nodes[index];
    node.tx_count += 1;
    node.last_active = Some(match node.last_active {
        Some(current) => current.max(timestamp),
        None => timestamp,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{InstructionRecord, TransactionRecord, TransactionType};

    fn classified(sig: &str, block_time: i64, accounts: &[&str]) -> ClassifiedTransaction {
        ClassifiedTransaction {
            record: TransactionRecord {
                signature: sig.to_string(),
                block_time: Some(block_time),
                accounts: accounts.iter().map(|a| a.to_string()).collect(),
                instructions: vec![],
                logs: None,
                pre_balances: None,
                post_balances: None,
            },
            tx_type: TransactionType::Transfer,
            value: 1.0,
        }
    }

    #[test]
    fn test_target_node_always_present() {
        let (nodes, edges) = build_graph(&[], "target", Some(12.5));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].address, "target");
        assert_eq!(nodes[0].balance, Some(12.5));
        assert!(edges.is_empty());
    }

    #[test]
    fn test_one_edge_per_distinct_counterparty() {
        let txs = vec![
            classified("sig1", 1_700_000_000, &["target", "a", "b"]),
            classified("sig2", 1_700_000_100, &["target", "a"]),
        ];
        let (nodes, edges) = build_graph(&txs, "target", None);

        // target + a + b
        assert_eq!(nodes.len(), 3);
        // (sig1: a, b) + (sig2: a)
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].id, "target|a|sig1");
        assert_eq!(edges[1].id, "target|b|sig1");
        assert_eq!(edges[2].id, "target|a|sig2");
    }

    #[test]
    fn test_duplicate_account_in_one_tx_counted_once() {
        let txs = vec![classified("sig1", 1_700_000_000, &["target", "a", "a"])];
        let (nodes, edges) = build_graph(&txs, "target", None);
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);
        assert_eq!(nodes[1].tx_count, 1);
    }

    #[test]
    fn test_repeat_sightings_update_count_and_last_active() {
        let txs = vec![
            classified("sig1", 1_700_000_000, &["target", "a"]),
            classified("sig2", 1_700_000_500, &["target", "a"]),
        ];
        let (nodes, _) = build_graph(&txs, "target", None);

        let node_a = nodes.iter().find(|n| n.address == "a").unwrap();
        assert_eq!(node_a.tx_count, 2);
        assert_eq!(
            node_a.last_active,
            DateTime::from_timestamp(1_700_000_500, 0)
        );

        assert_eq!(nodes[0].tx_count, 2);
    }

    #[test]
    fn test_last_active_never_moves_backwards() {
        let txs = vec![
            classified("sig1", 1_700_000_500, &["target", "a"]),
            classified("sig2", 1_700_000_000, &["target", "a"]),
        ];
        let (nodes, _) = build_graph(&txs, "target", None);
        let node_a = nodes.iter().find(|n| n.address == "a").unwrap();
        assert_eq!(
            node_a.last_active,
            DateTime::from_timestamp(1_700_000_500, 0)
        );
    }

    #[test]
    fn test_program_role_detected_from_instructions() {
        let mut tx = classified("sig1", 1_700_000_000, &["target", "wallet", "ProgramX"]);
        tx.record.instructions = vec![InstructionRecord {
            program_id: "ProgramX".to_string(),
            accounts: vec![],
            data: vec![],
        }];
        let (nodes, _) = build_graph(&[tx], "target", None);

        assert_eq!(
            nodes.iter().find(|n| n.address == "wallet").unwrap().role,
            NodeRole::Wallet
        );
        assert_eq!(
            nodes.iter().find(|n| n.address == "ProgramX").unwrap().role,
            NodeRole::Program
        );
    }

    #[test]
    fn test_tx_without_accounts_skipped() {
        let txs = vec![
            classified("sig1", 1_700_000_000, &[]),
            classified("sig2", 1_700_000_100, &["target", "a"]),
        ];
        let (nodes, edges) = build_graph(&txs, "target", None);
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);
        assert_eq!(nodes[0].tx_count, 1);
    }
}
