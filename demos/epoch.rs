use ccmash::{LightContext, Params};
use ethereum_types::H256;

fn main() {
    // a poor man cli parser.
    let mut args = std::env::args().skip(1);

    let from: u64 = args
        .next()
        .map(|v| v.parse().unwrap_or_else(|_| print_help()))
        .unwrap_or_else(|| print_help());
    let to: u64 = args
        .next()
        .map(|v| v.parse().unwrap_or_else(|_| print_help()))
        .unwrap_or_else(|| print_help());
    let verify = args.next().as_deref() == Some("--light");

    let params = Params::default();
    println!(
        "Epoch sizes from {} to {} (i.e {} epochs)",
        from,
        to,
        to.saturating_sub(from)
    );

    for epoch in from..to {
        let block = epoch * params.epoch_length;
        let (cache_size, full_size, seed) = match (
            params.cache_size(block),
            params.dataset_size(block),
            params.seedhash(block),
        ) {
            (Ok(c), Ok(f), Ok(s)) => (c, f, s),
            (Err(e), ..) | (_, Err(e), _) | (.., Err(e)) => {
                eprintln!("epoch {}: {}", epoch, e);
                std::process::exit(1);
            }
        };
        println!(
            "{}: cache {} bytes, dataset {} MB, seed {:?}",
            epoch,
            cache_size,
            full_size / (1024 * 1024),
            seed
        );

        if verify {
            let now = std::time::Instant::now();
            let light = LightContext::new(cache_size, seed)
                .expect("cache sizes from the schedule are valid");
            let out = light
                .compute(full_size, &H256::zero(), 0)
                .expect("dataset sizes from the schedule are valid");
            println!(
                "   light hash of zero header: {:?} (mix {:?}) in {:?}",
                out.result,
                out.mix_hash,
                now.elapsed()
            );
        }
    }
}

fn print_help() -> ! {
    println!("usage: epoch <FROM_EPOCH> <TO_EPOCH> [--light]");
    std::process::exit(1);
}
