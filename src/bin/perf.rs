use log::{error, info};
use rand::{prelude::random, rngs::SmallRng, Rng, SeedableRng};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use structopt::StructOpt;

use std::{thread, time};

use prbt::arc::OMap;

/// Command line options.
#[derive(Clone, StructOpt)]
pub struct Opt {
    #[structopt(long = "seed")]
    seed: Option<u64>,

    #[structopt(long = "loads", default_value = "1000000")] // default 1M
    loads: usize,

    #[structopt(long = "sets", default_value = "0")]
    sets: usize,

    #[structopt(long = "dels", default_value = "0")]
    dels: usize,

    #[structopt(long = "gets", default_value = "0")]
    gets: usize,

    #[structopt(long = "readers", default_value = "1")]
    readers: usize,

    #[structopt(long = "validate")]
    validate: bool,
}

fn main() {
    let opts = Opt::from_args();
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .ok();

    let seed = opts.seed.unwrap_or_else(random);
    info!("perf seed {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    // initial load
    let mut index: OMap<u64, u64> = OMap::new();
    let mut keys: Vec<u64> = Vec::with_capacity(opts.loads);
    let start = time::Instant::now();
    for _i in 0..opts.loads {
        let (key, val): (u64, u64) = (rng.gen(), rng.gen());
        index = index.set(key, val);
        keys.push(key);
    }
    info!("loaded {} items in {:?}", index.len(), start.elapsed());

    // readers hold on to the loaded version, writer derives new versions.
    let mut handles = vec![];
    for j in 0..opts.readers {
        let (opts, index) = (opts.clone(), index.clone());
        let seed = seed + ((j as u64) * 100);
        let h = thread::spawn(move || do_reads(j, seed, opts, index));
        handles.push(h);
    }

    let latest = do_writes(seed, &opts, index.clone(), keys);

    for handle in handles.into_iter() {
        handle.join().unwrap()
    }

    info!("versions loaded:{} latest:{}", index.len(), latest.len());

    if opts.validate {
        for (name, version) in vec![("loaded", index), ("latest", latest)].into_iter() {
            match version.validate() {
                Ok(stats) => info!("validate-{} {:?}", name, stats),
                Err(err) => error!("validate-{} {}", name, err),
            }
        }
    }
}

// deletes always remove a live key.
fn do_writes(
    seed: u64,
    opts: &Opt,
    mut index: OMap<u64, u64>,
    mut keys: Vec<u64>,
) -> OMap<u64, u64> {
    let mut rng = SmallRng::seed_from_u64(seed + 1);

    let total = opts.sets + opts.dels;
    let (mut n_sets, mut n_dels) = (0, 0);
    let start = time::Instant::now();
    for _i in 0..total {
        let set = keys.is_empty() || (rng.gen::<usize>() % total) < opts.sets;
        index = if set {
            let key = rng.gen::<u64>();
            keys.push(key);
            n_sets += 1;
            index.set(key, rng.gen::<u64>())
        } else {
            let key = keys.swap_remove(rng.gen::<usize>() % keys.len());
            n_dels += 1;
            index.remove(&key)
        };
    }
    info!(
        "writer for operations {} sets:{} dels:{}, took {:?}",
        total,
        n_sets,
        n_dels,
        start.elapsed()
    );

    index
}

fn do_reads(j: usize, seed: u64, opts: Opt, index: OMap<u64, u64>) {
    let mut rng = SmallRng::seed_from_u64(seed);

    let start = time::Instant::now();
    let mut hits = 0;
    for _i in 0..opts.gets {
        if index.contains_key(&rng.gen::<u64>()) {
            hits += 1;
        }
    }
    info!(
        "reader-{} for operations {} hits {}, took {:?}",
        j,
        opts.gets,
        hits,
        start.elapsed()
    );

    let start = time::Instant::now();
    let n = index.iter().count();
    info!("iter-{} for iterating {}, took {:?}", j, n, start.elapsed());
}
