use std::time::Instant;

use rand::Rng;

use sluice::{cancel, Config, Stream};
use sluice::operators::{fan_in, or_done, repeat_fn, take};

fn is_prime(candidate: u64) -> bool {
    candidate > 1 && (2 .. candidate).take_while(|d| d * d <= candidate).all(|d| candidate % d != 0)
}

fn main() {
    // sluice options, then the number of primes to find and the number of finders.
    let mut opts = getopts::Options::new();
    Config::install_options(&mut opts);
    let matches = opts.parse(std::env::args().skip(1)).unwrap();
    let config = Config::from_matches(&matches).unwrap();
    let wanted: usize = matches.free.first().map(|x| x.parse().unwrap()).unwrap_or(10);
    let finders: usize = matches.free.get(1).map(|x| x.parse().unwrap()).unwrap_or(4);

    let (cancel, done) = cancel::channel_with(config);
    let timer = Instant::now();

    let candidates = repeat_fn(&done, || rand::thread_rng().gen_range(1 .. 50_000_000u64));
    let found: Vec<Stream<u64>> = (0 .. finders).map(|_| {
        let candidates = candidates.clone();
        let done = done.clone();
        let (outlet, primes) = Stream::channel();
        std::thread::spawn(move || {
            for candidate in or_done(&done, candidates) {
                if is_prime(candidate) && !outlet.give_until(candidate, &done) {
                    break;
                }
            }
        });
        primes
    }).collect();

    for prime in take(&done, fan_in(&done, found), wanted) {
        println!("{:?}:\t{}", timer.elapsed(), prime);
    }
    cancel.cancel();
    println!("{:?}:\tfound {} primes with {} finders", timer.elapsed(), wanted, finders);
}
