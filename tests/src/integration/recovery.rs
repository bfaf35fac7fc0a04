//! # Restart and Recovery
//!
//! A signer that stops at any point must leave files a later run can
//! continue from, with the signature file as the source of truth.

#[cfg(test)]
mod tests {
    use std::fs::{self, OpenOptions};
    use std::io::Write;

    use logsig_engine::adapters::state_store;
    use logsig_engine::codec::{tlv, types, TlvRecord};
    use logsig_engine::{BlockSigningApi, HashAlgorithm, Imprint, SigningConfig};

    use crate::support::{lines, SignedLog};

    fn append_raw(fx: &SignedLog, bytes: &[u8]) {
        let mut sig = OpenOptions::new().append(true).open(fx.sig_path()).unwrap();
        sig.write_all(bytes).unwrap();
    }

    #[test]
    fn test_restart_after_unfinished_block() {
        let fx = SignedLog::new(SigningConfig::default().with_keep_tree_hashes(true));
        fx.sign_blocks(&[lines(0, 3)]);
        let signed_len = fx.sig_bytes().len();

        // a crashed run left tree hashes and half a record behind
        let orphan = TlvRecord::new(
            types::TREE_HASH,
            Imprint::zero(HashAlgorithm::Sha2_256).to_bytes(),
        )
        .unwrap();
        append_raw(&fx, &orphan.to_bytes());
        append_raw(&fx, &orphan.to_bytes()[..7]);

        let file = fx.open();
        assert_eq!(fx.sig_bytes().len(), signed_len);
        file.close().unwrap();

        fx.sign_blocks(&[lines(3, 4)]);
        let (result, _) = fx.verify();
        assert_eq!(result.unwrap().records, 7);
    }

    #[test]
    fn test_state_file_lagging_behind() {
        let fx = SignedLog::new(SigningConfig::default());
        fx.sign_blocks(&[lines(0, 2)]);
        let stale = state_store::load(&fx.state_path()).unwrap().unwrap();
        let sigs = fx.sign_blocks(&[lines(2, 2)]);

        // simulate a crash between the block signature and the state file update
        state_store::save(&fx.state_path(), &stale).unwrap();

        let file = fx.open();
        assert_eq!(file.last_leaf(), &sigs[0].last_hash);
        file.close().unwrap();
        assert_eq!(
            state_store::load(&fx.state_path()).unwrap(),
            Some(sigs[0].last_hash.clone())
        );

        fx.sign_blocks(&[lines(4, 1)]);
        let (result, _) = fx.verify();
        assert_eq!(result.unwrap().blocks_verified, 3);
    }

    #[test]
    fn test_missing_state_file_recreated() {
        let fx = SignedLog::new(SigningConfig::default());
        let sigs = fx.sign_blocks(&[lines(0, 2)]);
        fs::remove_file(fx.state_path()).unwrap();

        let file = fx.open();
        file.close().unwrap();

        assert_eq!(
            state_store::load(&fx.state_path()).unwrap(),
            Some(sigs[0].last_hash.clone())
        );
    }

    #[test]
    fn test_state_without_blocks_is_ignored() {
        let fx = SignedLog::new(SigningConfig::default());
        state_store::save(
            &fx.state_path(),
            &Imprint::new(HashAlgorithm::Sha2_256, vec![9; 32]).unwrap(),
        )
        .unwrap();

        let file = fx.open();
        assert_eq!(file.last_leaf(), &Imprint::zero(HashAlgorithm::Sha2_256));
        file.close().unwrap();

        fx.sign_blocks(&[lines(0, 3)]);
        let (result, _) = fx.verify();
        assert_eq!(result.unwrap().blocks_verified, 1);
    }

    #[test]
    fn test_discarded_block_leaves_no_trace() {
        let fx = SignedLog::new(
            SigningConfig::default()
                .with_keep_record_hashes(true)
                .with_keep_tree_hashes(true),
        );
        fx.sign_blocks(&[lines(0, 2)]);
        let before = fx.sig_bytes();

        let mut file = fx.open();
        for line in lines(100, 5) {
            file.add_record(line.as_bytes()).unwrap();
        }
        file.discard_block().unwrap();
        file.close().unwrap();

        assert_eq!(fx.sig_bytes(), before);
        let (result, _) = fx.verify();
        assert_eq!(result.unwrap().blocks_verified, 1);
    }

    #[test]
    fn test_header_only_file_reused() {
        let fx = SignedLog::new(SigningConfig::default());
        fx.open().close().unwrap();
        assert_eq!(fx.sig_bytes(), tlv::SIG_FILE_MAGIC.to_vec());

        fx.sign_blocks(&[lines(0, 1)]);
        let (result, _) = fx.verify();
        assert_eq!(result.unwrap().records, 1);
    }
}
