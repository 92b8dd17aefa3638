// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Walkthrough: two users, a group-mode block, and the free cache.
//!
//! ```bash
//! RUST_LOG=memcache=debug cargo run -p memcache --example trust_walkthrough
//! ```

use memcache::{MemCache, MemCacheConfig};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
cacheable_threshold = 256

[[users]]
name = "jbond007"
limit = "1000"

[[users]]
name = "j0walker"
limit = "500"
"#;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = MemCacheConfig::from_toml(CONFIG)?;
    let mut mc = MemCache::from_config(&config)?;

    let p1 = mc
        .allocate("jbond007", 10)
        .ok_or_else(|| anyhow::anyhow!("allocation for jbond007 refused"))?;
    let p2 = mc.try_allocate("j0walker", 50)?;

    mc.set_block_mode("jbond007", p1, 'G')?;
    mc.trust("jbond007", "j0walker")?;

    match mc.free("jbond007", p2) {
        Ok(()) => println!("unexpected: jbond007 freed j0walker's block"),
        Err(e) => println!("jbond007 → {p2}: {e}"),
    }
    mc.free("j0walker", p1)?;
    println!("j0walker freed {p1} on behalf of jbond007");

    let reused = mc.try_allocate("j0walker", 10)?;
    println!(
        "j0walker allocated 10 B again: {reused} (reused: {})",
        reused == p1
    );

    println!("{}", mc.stats().summary());
    Ok(())
}
