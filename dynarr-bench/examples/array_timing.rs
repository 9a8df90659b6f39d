//! Average time to fill both array engines.
//! Each round creates an array, pushes a fixed number of values and
//! releases it. With `--verbose`, metadata and contents are printed
//! for every round.
//!
//! Set `RUST_LOG=trace` to see every reallocation.
use clap::Parser;
use dynarr_bench::{average, fill_opaque, fill_typed, opaque_details, typed_details};
use dynarr_common::ArrayConfig;
use dynarr_typed::TypedArray;
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();
    let args = Args::parse();
    let config = ArrayConfig::new(args.capacity, args.increment);
    if let Err(e) = config.validate() {
        eprintln!("invalid arguments: {}", e);
        std::process::exit(1);
    }
    let start = Instant::now();

    let avg = run_rounds(args.times, || {
        let arr = fill_typed(&config, args.count).expect("fill typed array");
        if args.verbose {
            println!("{}", typed_details(&arr));
            println!("{:?}", arr);
        }
        arr.delete();
    });
    println!(
        "Average time \"typed\" ({}): {}us",
        args.times,
        avg.as_micros()
    );

    let avg = run_rounds(args.times, || {
        let arr = fill_opaque(&config, args.count).expect("fill opaque array");
        if args.verbose {
            println!("{}", opaque_details(&arr));
            println!("{:?}", arr.as_slice::<i32>().expect("view i32 elements"));
        }
        arr.destroy();
    });
    println!(
        "Average time \"opaque\" ({}): {}us",
        args.times,
        avg.as_micros()
    );

    if args.grid > 0 {
        print_grid(args.grid);
    }
    println!("Elapsed time: {}us", start.elapsed().as_micros());
}

fn run_rounds<F: FnMut()>(times: usize, mut f: F) -> Duration {
    let mut total = Duration::ZERO;
    for _ in 0..times {
        let start = Instant::now();
        f();
        total += start.elapsed();
    }
    average(total, times)
}

/// Build a square grid as an array of arrays and print it row by row.
fn print_grid(n: usize) {
    let mut grid = TypedArray::with_capacity(n).expect("create grid");
    for _ in 0..n {
        let mut row = TypedArray::with_capacity(n).expect("create row");
        row.extend_from_iter(0..n).expect("fill row");
        grid.push(row).expect("push row");
    }
    for row in grid.iter() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", line.join(" "));
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// rounds per engine
    #[arg(long, default_value = "1000")]
    times: usize,

    /// values pushed per round
    #[arg(long, default_value = "100")]
    count: usize,

    /// initial capacity
    #[arg(long, default_value = "1")]
    capacity: usize,

    /// capacity increment
    #[arg(long, default_value = "2")]
    increment: usize,

    /// print details of every round
    #[arg(long)]
    verbose: bool,

    /// size of the 2-D grid demo, 0 to skip
    #[arg(long, default_value = "0")]
    grid: usize,
}
