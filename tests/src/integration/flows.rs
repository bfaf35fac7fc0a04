//! # Integration Test Flows
//!
//! Sign a log through `FileSigner`, then verify it with `LogVerifier`.
//!
//! ## Flows Tested:
//!
//! 1. **Round trip**: every retention mode verifies clean
//! 2. **Block splitting**: size limit produces the expected blocks and roots
//! 3. **Chaining**: blocks written across reopen verify as one chain
//! 4. **Extension**: a rewritten signature file verifies like the original

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;
    use std::sync::Arc;

    use logsig_engine::service::dump;
    use logsig_engine::{
        BlockSigningApi, ErrorContext, HashAlgorithm, LogVerifier, SigningConfig, VerifyOptions,
    };
    use shared_crypto::Ed25519Signature;

    use crate::support::{block_signer, expected_blocks, lines, verify_bytes, SignedLog};

    // =============================================================================
    // ROUND TRIP
    // =============================================================================

    fn round_trip(config: SigningConfig) {
        let fx = SignedLog::new(config);
        fx.sign_blocks(&[lines(0, 5), lines(5, 1), lines(6, 9)]);

        let (result, ectx) = fx.verify();
        let summary = result.unwrap();

        assert_eq!(summary.blocks_verified, 3);
        assert_eq!(summary.records, 15);
        assert!(ectx.is_clear());
    }

    #[test]
    fn test_round_trip_without_retention() {
        round_trip(SigningConfig::default());
    }

    #[test]
    fn test_round_trip_with_record_hashes() {
        round_trip(SigningConfig::default().with_keep_record_hashes(true));
    }

    #[test]
    fn test_round_trip_with_tree_hashes() {
        round_trip(SigningConfig::default().with_keep_tree_hashes(true));
    }

    #[test]
    fn test_round_trip_with_all_hashes_sha3() {
        round_trip(
            SigningConfig::default()
                .with_hash_algorithm(HashAlgorithm::Sha3_256)
                .with_keep_record_hashes(true)
                .with_keep_tree_hashes(true),
        );
    }

    // =============================================================================
    // BLOCK SPLITTING
    // =============================================================================

    #[test]
    fn test_block_limit_four_ten_records() {
        let fx = SignedLog::new(SigningConfig::default().with_block_size_limit(4));
        let records = lines(0, 10);

        let mut file = fx.open();
        for line in &records {
            fx.append(&mut file, line);
        }
        file.finish_block().unwrap();
        file.close().unwrap();

        let sigs = fx.block_sigs();
        let counts: Vec<u64> = sigs.iter().map(|s| s.record_count).collect();
        assert_eq!(counts, vec![4, 4, 2]);

        let expected = expected_blocks(
            HashAlgorithm::Sha2_256,
            &[records[0..4].to_vec(), records[4..8].to_vec(), records[8..10].to_vec()],
        );
        let public = block_signer().public_key();
        for (sig, (root, last_leaf)) in sigs.iter().zip(&expected) {
            assert_eq!(&sig.last_hash.to_bytes(), last_leaf);
            let signature = Ed25519Signature::from_slice(&sig.signature).unwrap();
            assert!(public.verify(root, &signature).is_ok());
        }

        let (result, _) = fx.verify();
        assert_eq!(result.unwrap().records, 10);
    }

    #[test]
    fn test_roots_match_for_odd_block_sizes() {
        let fx = SignedLog::new(SigningConfig::default().with_keep_tree_hashes(true));
        let blocks = vec![lines(0, 1), lines(1, 3), lines(4, 7), lines(11, 13)];
        let sigs = fx.sign_blocks(&blocks);

        let expected = expected_blocks(HashAlgorithm::Sha2_256, &blocks);
        let public = block_signer().public_key();
        for (sig, (root, _)) in sigs.iter().zip(&expected) {
            let signature = Ed25519Signature::from_slice(&sig.signature).unwrap();
            assert!(public.verify(root, &signature).is_ok());
        }
    }

    // =============================================================================
    // CHAINING
    // =============================================================================

    #[test]
    fn test_chain_across_reopen() {
        let fx = SignedLog::new(SigningConfig::default());
        let first = fx.sign_blocks(&[lines(0, 3)]);
        let second = fx.sign_blocks(&[lines(3, 2)]);

        let expected = expected_blocks(HashAlgorithm::Sha2_256, &[lines(0, 3), lines(3, 2)]);
        assert_eq!(first[0].last_hash.to_bytes(), expected[0].1);
        assert_eq!(second[0].last_hash.to_bytes(), expected[1].1);

        let (result, _) = fx.verify();
        assert_eq!(result.unwrap().blocks_verified, 2);
    }

    #[test]
    fn test_algorithm_change_between_runs() {
        let fx = SignedLog::new(SigningConfig::default());
        fx.sign_blocks(&[lines(0, 2)]);
        fx.ctx().set_hash_algorithm(HashAlgorithm::Sha2_512).unwrap();
        let sigs = fx.sign_blocks(&[lines(2, 2)]);

        assert_eq!(sigs[0].hash_algorithm, HashAlgorithm::Sha2_512);
        let (result, _) = fx.verify();
        assert_eq!(result.unwrap().blocks_verified, 2);
    }

    // =============================================================================
    // EXTENSION AND OUTPUT
    // =============================================================================

    #[test]
    fn test_extended_signature_file_verifies() {
        let fx = SignedLog::new(SigningConfig::default().with_keep_record_hashes(true));
        fx.sign_blocks(&[lines(0, 4), lines(4, 4)]);
        let new_sig_path = fx.log_path().with_extension("log.logsig.new");

        let verifier = LogVerifier::new(
            Arc::new(block_signer().verifier()),
            VerifyOptions {
                extend: true,
                ..VerifyOptions::default()
            },
        );
        let mut ectx = ErrorContext::new("app.log");
        verifier
            .verify_file(&fx.log_path(), Some(&new_sig_path), &mut ectx)
            .unwrap();

        let rewritten = fs::read(&new_sig_path).unwrap();
        assert_eq!(rewritten, fx.sig_bytes());
        let (result, _, _) = verify_bytes(&fx.log_bytes(), &rewritten, VerifyOptions::default());
        assert_eq!(result.unwrap().blocks_verified, 2);
    }

    #[test]
    fn test_verbose_output_lists_blocks() {
        let fx = SignedLog::new(SigningConfig::default());
        fx.sign_blocks(&[lines(0, 2), lines(2, 1)]);

        let (result, _, out) = fx.verify_with(VerifyOptions {
            verbose: true,
            show_verified: true,
            ..VerifyOptions::default()
        });

        result.unwrap();
        assert!(out.contains("Block 2:"));
        assert!(out.contains("Record Count: 1"));
        assert!(out.contains("block 1 verified: 2 records"));
    }

    #[test]
    fn test_dump_lists_every_record() {
        let fx = SignedLog::new(
            SigningConfig::default()
                .with_keep_record_hashes(true)
                .with_keep_tree_hashes(true),
        );
        fx.sign_blocks(&[lines(0, 2)]);

        let mut out = Vec::new();
        let count = dump::dump_sig_file(&mut Cursor::new(fx.sig_bytes()), &mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        // 2 record hashes, 2 leaves, 1 node, 1 block signature
        assert_eq!(count, 6);
        assert_eq!(text.matches("Record Hash").count(), 2);
        assert_eq!(text.matches("Tree Hash").count(), 3);
        assert!(text.contains("Signature Type: Ed25519"));
    }
}
