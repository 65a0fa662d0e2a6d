use std::ops::ControlFlow;

use ccmash::{Error, FullContext, LightContext, Params, StorageLocation};
use ethereum_types::H256;

fn params() -> Params {
    Params {
        epoch_length: 100,
        cache_bytes_init: 2048,
        cache_bytes_growth: 256,
        dataset_bytes_init: 64 * 1024,
        dataset_bytes_growth: 2048,
        max_epoch: 32,
    }
}

#[test]
fn file_backed_dataset_matches_light_client() {
    let params = params();
    let block = 350;
    let full_size = params.dataset_size(block).unwrap();
    let seed = params.seedhash(block).unwrap();
    let light = LightContext::for_block(&params, block).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.bin");
    let mut last = None;
    let full = FullContext::new(
        StorageLocation::File(path.clone()),
        seed,
        full_size,
        light,
        |p| {
            assert!(last.map_or(true, |l| p > l));
            last = Some(p);
            ControlFlow::Continue(())
        },
    )
    .unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), full_size);
    assert!(full.is_valid_for(300) && !full.is_valid_for(400));

    for nonce in 0..8u64 {
        let header = H256::from_low_u64_le(nonce * 31);
        let from_file = full.compute(full_size, &header, nonce).unwrap();
        let from_cache = full.light().compute(full_size, &header, nonce).unwrap();
        assert_eq!(from_file, from_cache);
    }
    assert_eq!(
        full.dataset_node(5).unwrap(),
        ccmash::calc_dataset_item(full.light().cache(), 5)
    );
}

#[test]
fn cancelled_build_removes_file_and_returns_cache() {
    let params = params();
    let full_size = params.dataset_size(0).unwrap();
    let light = LightContext::for_block(&params, 0).unwrap();
    let seed = *light.seed();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset");
    let err = FullContext::new(
        StorageLocation::File(path.clone()),
        seed,
        full_size,
        light,
        |p| {
            if p >= 10 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        },
    )
    .unwrap_err();
    assert!(matches!(err.error, Error::Cancelled));
    assert!(!path.exists());

    // Retry with the returned context succeeds.
    let light = err.light;
    let full = FullContext::new(
        StorageLocation::Memory,
        seed,
        full_size,
        light,
        |_| ControlFlow::Continue(()),
    )
    .unwrap();
    assert_eq!(full.full_size(), full_size);
}

#[test]
fn wrong_epoch_size_is_rejected_before_allocating() {
    let params = params();
    let light = LightContext::for_block(&params, 0).unwrap();
    let seed = *light.seed();
    let wrong = params.dataset_size(3_000).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset");
    let err = FullContext::new(
        StorageLocation::File(path.clone()),
        seed,
        wrong,
        light,
        |_| ControlFlow::Continue(()),
    )
    .unwrap_err();
    assert!(matches!(err.error, Error::InvalidParameters(_)));
    assert!(!path.exists());
}

#[test]
fn contexts_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LightContext>();
    assert_send_sync::<FullContext>();

    let light = std::sync::Arc::new(LightContext::new(1024, H256::zero()).unwrap());
    let handles: Vec<_> = (0..4u64)
        .map(|nonce| {
            let light = light.clone();
            std::thread::spawn(move || light.compute(32 * 1024, &H256::zero(), nonce).unwrap())
        })
        .collect();
    let outs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (nonce, out) in outs.iter().enumerate() {
        assert_eq!(*out, light.compute(32 * 1024, &H256::zero(), nonce as u64).unwrap());
    }
}

#[cfg(feature = "serde")]
#[test]
fn params_from_json() {
    let params: Params =
        serde_json::from_str(r#"{ "epoch_length": 100, "max_epoch": 4 }"#).unwrap();
    assert_eq!(params.epoch_length, 100);
    assert_eq!(params.cache_bytes_init, ccmash::CACHE_BYTES_INIT);
    let json = serde_json::to_string(&params).unwrap();
    assert_eq!(serde_json::from_str::<Params>(&json).unwrap(), params);
}
