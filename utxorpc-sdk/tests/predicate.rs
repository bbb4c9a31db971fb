mod common;

use common::{address, output, output_with_asset, tx};
use utxorpc_sdk::proto::{cardano, query, submit, watch};
use utxorpc_sdk::{AssetPattern, Pattern, Predicate};

const POLICY: &[u8] = &[0x77; 28];

fn leaf_of(node: &query::UtxoPredicate) -> Option<&cardano::TxOutputPattern> {
    node.r#match.as_ref().and_then(|m| match &m.utxo_pattern {
        Some(query::any_utxo_pattern::UtxoPattern::Cardano(p)) => Some(p),
        None => None,
    })
}

#[test]
fn test_empty_predicate_compiles_to_match_all_leaf() {
    let wire: query::UtxoPredicate = Predicate::default().compile();

    let leaf = leaf_of(&wire).expect("leaf");
    assert_eq!(leaf, &cardano::TxOutputPattern::default());
    assert!(wire.not.is_empty() && wire.all_of.is_empty() && wire.any_of.is_empty());
}

#[test]
fn test_address_leaf_sets_only_the_exact_address() {
    let wire: query::UtxoPredicate = Predicate::from(Pattern::address(address(1, 2))).compile();

    let leaf = leaf_of(&wire).expect("leaf");
    let address_pattern = leaf.address.as_ref().expect("address pattern");
    assert_eq!(address_pattern.exact_address, address(1, 2));
    assert!(address_pattern.payment_part.is_empty());
    assert!(address_pattern.delegation_part.is_empty());
    assert!(leaf.asset.is_none());
}

#[test]
fn test_tx_leaves_use_has_address_and_moves_asset() {
    let pattern = Pattern::payment_part(vec![3u8; 28]).with_asset(AssetPattern::policy(POLICY));
    let wire: watch::TxPredicate = Predicate::from(pattern).compile();

    let leaf = match wire.r#match.and_then(|m| m.chain) {
        Some(watch::any_chain_tx_pattern::Chain::Cardano(leaf)) => leaf,
        None => panic!("expected a cardano leaf"),
    };
    assert_eq!(leaf.has_address.expect("address").payment_part, vec![3u8; 28]);
    assert_eq!(leaf.moves_asset.expect("asset").policy_id, POLICY);
    assert!(leaf.consumes.is_none() && leaf.produces.is_none() && leaf.mints_asset.is_none());
}

#[test]
fn test_combinators_compile_recursively() {
    let predicate = Predicate::any_of([
        Pattern::address(address(1, 1)).into(),
        Predicate::all_of([
            Pattern::payment_part(vec![2u8; 28]).into(),
            Predicate::from(Pattern::asset(AssetPattern::policy(POLICY))).negate(),
        ]),
    ]);
    let wire: submit::TxPredicate = predicate.compile();

    assert!(wire.r#match.is_none());
    assert_eq!(wire.any_of.len(), 2);
    assert!(wire.any_of[0].r#match.is_some());
    let all_of = &wire.any_of[1].all_of;
    assert_eq!(all_of.len(), 2);
    assert_eq!(all_of[1].not.len(), 1);
    assert!(all_of[1].not[0].r#match.is_some());
}

#[test]
fn test_vacuous_combinators_are_rewritten() {
    let match_all: query::UtxoPredicate = Predicate::match_all().compile();

    let all_of: query::UtxoPredicate = Predicate::AllOf(vec![]).compile();
    assert_eq!(all_of, match_all);

    let not: query::UtxoPredicate = Predicate::Not(vec![]).compile();
    assert_eq!(not, match_all);

    let any_of: query::UtxoPredicate = Predicate::AnyOf(vec![]).compile();
    assert_eq!(any_of.not, vec![match_all]);
}

#[test]
fn test_recompiling_a_wire_predicate_is_idempotent() {
    let trees = [
        Predicate::default(),
        Predicate::AnyOf(vec![]),
        Predicate::from(Pattern::delegation_part(vec![9u8; 28])).negate(),
        Predicate::all_of([
            Pattern::address(address(4, 5)).into(),
            Predicate::any_of([
                Pattern::asset(AssetPattern::name(b"TOKEN".to_vec())).into(),
                Predicate::AllOf(vec![]),
            ]),
        ]),
    ];

    for tree in trees {
        let wire: query::UtxoPredicate = tree.compile();
        let again: query::UtxoPredicate = Predicate::from_wire(&wire).compile();
        assert_eq!(again, wire, "tree {tree:?}");
    }
}

#[test]
fn test_vacuous_semantics_when_evaluated_locally() {
    let utxo = output(address(1, 2), 1_000_000);

    assert!(Predicate::AllOf(vec![]).matches_output(&utxo));
    assert!(!Predicate::AnyOf(vec![]).matches_output(&utxo));
    assert!(Predicate::Not(vec![]).matches_output(&utxo));
}

#[test]
fn test_local_evaluation_agrees_with_compiled_tree() {
    let with_token = output_with_asset(address(1, 2), 2_000_000, POLICY, b"TOKEN");
    let plain = output(address(1, 3), 2_000_000);
    let other_owner = output(address(8, 2), 2_000_000);

    let payment = Predicate::from(Pattern::payment_part(vec![1u8; 28]));
    assert!(payment.matches_output(&with_token));
    assert!(payment.matches_output(&plain));
    assert!(!payment.matches_output(&other_owner));

    let delegation = Predicate::from(Pattern::delegation_part(vec![2u8; 28]));
    assert!(delegation.matches_output(&other_owner));
    assert!(!delegation.matches_output(&plain));

    let token_free = Predicate::all_of([
        payment.clone(),
        Predicate::from(Pattern::asset(AssetPattern::new(Some(POLICY), None))).negate(),
    ]);
    assert!(!token_free.matches_output(&with_token));
    assert!(token_free.matches_output(&plain));

    let reread = Predicate::from_wire::<query::UtxoPredicate>(&token_free.compile());
    for utxo in [&with_token, &plain, &other_owner] {
        assert_eq!(reread.matches_output(utxo), token_free.matches_output(utxo));
    }
}

#[test]
fn test_tx_matching_looks_at_outputs_and_resolved_inputs() {
    let mut spend = tx(1, vec![output(address(5, 5), 1)]);
    spend.inputs.push(cardano::TxInput {
        tx_hash: vec![0; 32],
        output_index: 0,
        as_output: Some(output(address(6, 6), 3)),
        redeemer: None,
    });

    assert!(Predicate::from(Pattern::address(address(5, 5))).matches_tx(&spend));
    assert!(Predicate::from(Pattern::address(address(6, 6))).matches_tx(&spend));
    assert!(!Predicate::from(Pattern::address(address(7, 7))).matches_tx(&spend));
}
