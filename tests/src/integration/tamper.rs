//! # Tamper Detection
//!
//! Modified records, missing or extra log lines, and damaged signature
//! files must each surface as a specific error with the right position.

#[cfg(test)]
mod tests {
    use logsig_engine::codec::{block_sig, tlv, types};
    use logsig_engine::{BlockSigningApi, ErrorKind, SigningConfig, VerifyOptions};
    use proptest::prelude::*;

    use crate::support::{lines, verify_bytes, SignedLog};

    fn retained() -> SigningConfig {
        SigningConfig::default()
            .with_keep_record_hashes(true)
            .with_keep_tree_hashes(true)
            .with_block_size_limit(4)
    }

    /// Sign 10 records in blocks of 4, 4 and 2.
    fn signed_ten(config: SigningConfig) -> SignedLog {
        let fx = SignedLog::new(config);
        let mut file = fx.open();
        for line in lines(0, 10) {
            fx.append(&mut file, &line);
        }
        if file.is_block_open() {
            file.finish_block().unwrap();
        }
        file.close().unwrap();
        fx
    }

    // =============================================================================
    // MODIFIED RECORDS
    // =============================================================================

    #[test]
    fn test_modified_record_located_with_record_hashes() {
        let fx = signed_ten(
            SigningConfig::default()
                .with_keep_record_hashes(true)
                .with_block_size_limit(4),
        );
        fx.rewrite_line(5, "forged entry");

        let (result, ectx) = fx.verify();

        assert_eq!(result.unwrap_err().kind(), ErrorKind::RecordHashMismatch);
        assert_eq!(ectx.blk_num, 2);
        assert_eq!(ectx.rec_num, 2);
        assert_eq!(ectx.rec_num_in_file, 6);
        assert!(ectx.render().contains("Record: 'forged entry'"));
    }

    #[test]
    fn test_modified_record_located_with_tree_hashes() {
        let fx = signed_ten(
            SigningConfig::default()
                .with_keep_tree_hashes(true)
                .with_block_size_limit(4),
        );
        fx.rewrite_line(8, "forged entry");

        let (result, ectx) = fx.verify();

        assert_eq!(result.unwrap_err().kind(), ErrorKind::TreeHashMismatch);
        assert_eq!(ectx.blk_num, 3);
        assert_eq!(ectx.rec_num_in_file, 9);
        assert_eq!(ectx.tree_level, 1);
    }

    #[test]
    fn test_modified_record_without_retention_fails_block() {
        let fx = signed_ten(SigningConfig::default().with_block_size_limit(4));
        fx.rewrite_line(1, "forged entry");

        let (result, ectx) = fx.verify();

        assert_eq!(result.unwrap_err().kind(), ErrorKind::TreeHashMismatch);
        assert_eq!(ectx.blk_num, 1);
        assert_eq!(ectx.tree_level, 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_any_modified_record_is_located(index in 0usize..10) {
            let fx = signed_ten(retained());
            fx.rewrite_line(index, "forged entry");

            let (result, ectx) = fx.verify();

            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::RecordHashMismatch);
            prop_assert_eq!(ectx.rec_num_in_file, index as u64 + 1);
            prop_assert_eq!(ectx.blk_num, index as u64 / 4 + 1);
        }
    }

    // =============================================================================
    // LOG / SIGNATURE LENGTH MISMATCH
    // =============================================================================

    #[test]
    fn test_removed_last_line() {
        let fx = signed_ten(retained());
        let mut log = fx.log_bytes();
        log.truncate(log.len() - "record 0009\n".len());

        let (result, ectx, _) = verify_bytes(&log, &fx.sig_bytes(), VerifyOptions::default());

        assert_eq!(result.unwrap_err().kind(), ErrorKind::EndOfLog);
        assert_eq!(ectx.blk_num, 3);
    }

    #[test]
    fn test_appended_unsigned_line() {
        let fx = signed_ten(retained());
        let mut log = fx.log_bytes();
        log.extend_from_slice(b"sneaked in\n");

        let (result, _, _) = verify_bytes(&log, &fx.sig_bytes(), VerifyOptions::default());

        assert_eq!(result.unwrap_err().kind(), ErrorKind::EndOfSig);
    }

    #[test]
    fn test_truncated_signature_file() {
        let fx = signed_ten(SigningConfig::default().with_block_size_limit(4));
        let sig = fx.sig_bytes();

        let (result, _, _) =
            verify_bytes(&fx.log_bytes(), &sig[..sig.len() - 3], VerifyOptions::default());

        assert_eq!(result.unwrap_err().kind(), ErrorKind::EndOfSig);
    }

    // =============================================================================
    // DAMAGED SIGNATURE FILE
    // =============================================================================

    /// Signature file with the last block's record count rewritten.
    fn with_record_count(fx: &SignedLog, count: u64) -> Vec<u8> {
        let bytes = fx.sig_bytes();
        let mut slice = &bytes[..];
        tlv::check_file_header(&mut slice).unwrap();
        let mut records = tlv::read_all(slice).unwrap();
        let last = records.len() - 1;
        let mut bs = block_sig::decode(&records[last]).unwrap();
        bs.record_count = count;
        records[last] = block_sig::encode(&bs).unwrap();

        let mut out = tlv::SIG_FILE_MAGIC.to_vec();
        for rec in &records {
            out.extend_from_slice(&rec.to_bytes());
        }
        out
    }

    #[test]
    fn test_record_count_disagrees_with_hashes() {
        let fx = signed_ten(retained());
        let sig = with_record_count(&fx, 3);

        let (result, ectx, _) = verify_bytes(&fx.log_bytes(), &sig, VerifyOptions::default());

        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidRecordCount);
        assert_eq!(ectx.blk_num, 3);
    }

    #[test]
    fn test_record_count_inflated_without_retention() {
        let fx = signed_ten(SigningConfig::default().with_block_size_limit(4));
        let sig = with_record_count(&fx, 3);

        let (result, _, _) = verify_bytes(&fx.log_bytes(), &sig, VerifyOptions::default());

        assert_eq!(result.unwrap_err().kind(), ErrorKind::EndOfLog);
    }

    #[test]
    fn test_flipped_signature_byte() {
        let fx = signed_ten(SigningConfig::default().with_block_size_limit(4));
        let mut sig = fx.sig_bytes();
        let last = sig.len() - 1;
        sig[last] ^= 0x01;

        let (result, ectx, _) = verify_bytes(&fx.log_bytes(), &sig, VerifyOptions::default());

        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidSignature);
        assert_eq!(ectx.blk_num, 3);
    }

    #[test]
    fn test_missing_tree_hash() {
        let fx = signed_ten(
            SigningConfig::default()
                .with_keep_tree_hashes(true)
                .with_block_size_limit(4),
        );
        let bytes = fx.sig_bytes();
        let mut slice = &bytes[..];
        tlv::check_file_header(&mut slice).unwrap();
        let mut records = tlv::read_all(slice).unwrap();
        let first_tree = records
            .iter()
            .position(|r| r.tlv_type() == types::TREE_HASH)
            .unwrap();
        records.remove(first_tree);
        let mut sig = tlv::SIG_FILE_MAGIC.to_vec();
        for rec in &records {
            sig.extend_from_slice(&rec.to_bytes());
        }

        let (result, _, _) = verify_bytes(&fx.log_bytes(), &sig, VerifyOptions::default());

        assert!(matches!(
            result.unwrap_err().kind(),
            ErrorKind::TreeHashMismatch | ErrorKind::MissingTreeHash
        ));
    }

    #[test]
    fn test_continue_reports_first_of_several_failures() {
        let fx = signed_ten(retained());
        fx.rewrite_line(2, "forged one");
        fx.rewrite_line(9, "forged two");

        let (result, ectx, _) = verify_bytes(
            &fx.log_bytes(),
            &fx.sig_bytes(),
            VerifyOptions {
                continue_on_error: true,
                ..VerifyOptions::default()
            },
        );

        assert_eq!(result.unwrap_err().kind(), ErrorKind::RecordHashMismatch);
        assert_eq!(ectx.rec_num_in_file, 3);
        assert_eq!(ectx.blk_num, 1);
    }
}
