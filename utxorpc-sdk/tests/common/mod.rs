#![allow(dead_code)]

pub mod node;

use utxorpc_sdk::proto::{cardano, query, submit, sync, watch};

/// The intersection used by the tip-following scenario.
pub const PREVIEW_SLOT: u64 = 601;
pub const PREVIEW_HASH: &str = "f2150b1a9d7e4c3f8a6b2d5e0c9f7a1b3d4e6f8a2c5b7d9e1f3a5c7b9d0e3123";
pub const NEXT_SLOT: u64 = 620;
pub const NEXT_HASH: &str = "5d7a0e29b0c5e2c2a2f4b5c0a6f3e1d8b9c4a7e2f0d1b3c5a6e8f9d2c4b1a3e7";
pub const NEXT_HEIGHT: u64 = 31;

pub const API_KEY_HEADER: &str = "dmtr-api-key";
pub const API_KEY: &str = "test-key";

/// A 32-byte hash filled with `byte`.
pub fn hash(byte: u8) -> Vec<u8> {
    vec![byte; 32]
}

/// A Shelley base address: header byte, payment credential, delegation credential.
pub fn address(payment: u8, delegation: u8) -> Vec<u8> {
    let mut address = vec![0x01];
    address.extend(std::iter::repeat(payment).take(28));
    address.extend(std::iter::repeat(delegation).take(28));
    address
}

pub fn block(slot: u64, hash: Vec<u8>, height: u64) -> cardano::Block {
    cardano::Block {
        header: Some(cardano::BlockHeader { slot, hash, height }),
        body: Some(cardano::BlockBody { tx: vec![] }),
        timestamp: 1_666_656_000 + slot,
    }
}

/// Wraps a block in its envelope; the native bytes are a stand-in for the CBOR body.
pub fn any_block(slot: u64, hash: Vec<u8>, height: u64) -> sync::AnyChainBlock {
    sync::AnyChainBlock {
        native_bytes: vec![0x82, slot as u8, height as u8],
        chain: Some(sync::any_chain_block::Chain::Cardano(block(slot, hash, height))),
    }
}

/// An envelope whose payload belongs to a chain this client does not decode.
pub fn foreign_block() -> sync::AnyChainBlock {
    sync::AnyChainBlock {
        native_bytes: vec![0xff],
        chain: None,
    }
}

pub fn block_ref(slot: u64, hash: Vec<u8>) -> sync::BlockRef {
    sync::BlockRef {
        slot,
        hash,
        height: 0,
    }
}

pub fn output(address: Vec<u8>, coin: u64) -> cardano::TxOutput {
    cardano::TxOutput {
        address,
        coin,
        ..Default::default()
    }
}

pub fn output_with_asset(
    address: Vec<u8>,
    coin: u64,
    policy_id: &[u8],
    name: &[u8],
) -> cardano::TxOutput {
    cardano::TxOutput {
        assets: vec![cardano::Multiasset {
            policy_id: policy_id.to_vec(),
            assets: vec![cardano::Asset {
                name: name.to_vec(),
                output_coin: 1,
                mint_coin: 0,
            }],
            redeemer: None,
        }],
        ..output(address, coin)
    }
}

pub fn utxo_data(tx_byte: u8, index: u32, output: cardano::TxOutput) -> query::AnyUtxoData {
    query::AnyUtxoData {
        native_bytes: vec![tx_byte, index as u8],
        txo_ref: Some(query::TxoRef {
            hash: hash(tx_byte),
            index,
        }),
        parsed_state: Some(query::any_utxo_data::ParsedState::Cardano(output)),
    }
}

pub fn foreign_utxo_data(tx_byte: u8, index: u32) -> query::AnyUtxoData {
    query::AnyUtxoData {
        native_bytes: vec![0xff],
        txo_ref: Some(query::TxoRef {
            hash: hash(tx_byte),
            index,
        }),
        parsed_state: None,
    }
}

pub fn tx(hash_byte: u8, outputs: Vec<cardano::TxOutput>) -> cardano::Tx {
    cardano::Tx {
        outputs,
        successful: true,
        fee: 170_000,
        hash: hash(hash_byte),
        ..Default::default()
    }
}

pub fn mempool_entry(hash_byte: u8, stage: submit::Stage) -> submit::TxInMempool {
    submit::TxInMempool {
        r#ref: hash(hash_byte),
        native_bytes: vec![0x84, hash_byte],
        stage: stage as i32,
        parsed_state: Some(submit::tx_in_mempool::ParsedState::Cardano(tx(
            hash_byte,
            vec![output(address(1, 2), 2_000_000)],
        ))),
    }
}

pub fn watched_tx(hash_byte: u8, block_slot: u64) -> watch::AnyChainTx {
    watch::AnyChainTx {
        chain: Some(watch::any_chain_tx::Chain::Cardano(tx(hash_byte, vec![]))),
        block: Some(any_block(block_slot, hash(block_slot as u8), 1)),
    }
}
