//! Simple multicast publisher.
//!
//! Run:
//! - cargo run -p groupcast --example publisher
//! - cargo run -p groupcast --example publisher -- STATUS "hello world"

use std::{env, thread, time::Duration};

use groupcast::{Config, Endpoint};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let channel = args.next().unwrap_or_else(|| "EXAMPLE".to_owned());
    let text = args.next().unwrap_or_else(|| "hello from groupcast".to_owned());

    // Basic config; tweak here to demo other groups or TTLs
    let config = Config::default();
    let group = config.group;
    let port = config.port;

    let endpoint = Endpoint::bind(config)?;
    println!("publishing on [{}] to {}:{}", channel, group, port);

    for count in 0u64.. {
        let payload = format!("{} #{}", text, count);
        endpoint.send(&channel, payload.as_bytes())?;
        println!("sent {} bytes", payload.len());
        thread::sleep(Duration::from_secs(1));
    }
    Ok(())
}
