//! Segment Allocator Walkthrough
//!
//! Carves a stack buffer with the variable size allocator, shows lazy
//! coalescing, then does the same exercise with the fixed size allocator.
//!
//! Run with `RUST_LOG=trace` to see every split, fold and free.

use env_logger::Env;
use segalloc::prelude::*;

fn print_chain(vsa: &Vsa) {
    for block in vsa.blocks() {
        println!(
            "    {:#06x}  {:>4} bytes  {}",
            block.ptr.offset(),
            block.size,
            if block.in_use { "used" } else { "free" }
        );
    }
    println!("    largest free run: {} bytes", vsa.largest_free());
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();

    println!("=== Variable Size Allocator ===\n");
    let mut segment = [0u8; 256];
    let mut vsa = match Vsa::init(&mut segment) {
        Ok(vsa) => vsa,
        Err(err) => {
            eprintln!("init failed: {err}");
            return;
        }
    };
    println!(
        "State header {} bytes, block header {} bytes",
        STATE_HEADER_SIZE, BLOCK_HEADER_SIZE
    );
    print_chain(&vsa);

    println!("\n[1] Allocate A, B, C of 40 bytes");
    let a = vsa.alloc(40);
    let b = vsa.alloc(40);
    let c = vsa.alloc(40);
    print_chain(&vsa);

    println!("\n[2] Free B: its neighbours are in use, so 80 bytes cannot fit");
    vsa.free(b);
    print_chain(&vsa);
    println!("    alloc(80) -> {:?}", vsa.alloc(80));

    println!("\n[3] Free A and C: still separate headers until the next scan");
    vsa.free(a);
    vsa.free(c);
    print_chain(&vsa);

    println!("\n[4] Allocate 120 bytes across the merged run");
    let big = vsa.alloc(120);
    println!("    alloc(120) -> {:?}", big);
    print_chain(&vsa);

    println!("\n=== Fixed Size Allocator ===\n");
    let mut segment = vec![0u8; Fsa::suggest_size(4, 32)];
    let mut fsa = match Fsa::init(&mut segment, 32) {
        Ok(fsa) => fsa,
        Err(err) => {
            eprintln!("init failed: {err}");
            return;
        }
    };
    println!("{} blocks of {} bytes", fsa.block_count(), fsa.block_size());

    let held: Vec<SegPtr> = std::iter::from_fn(|| fsa.alloc()).collect();
    println!("allocated {} blocks, {} free", held.len(), fsa.count_free());
    for ptr in held {
        fsa.free(ptr);
    }
    println!("after freeing: {} free", fsa.count_free());
}
