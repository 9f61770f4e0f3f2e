//! Simple multicast subscriber.
//!
//! Run:
//! - cargo run -p groupcast --example subscriber

use std::time::Duration;

use groupcast::{Config, Endpoint};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let group = config.group;
    let port = config.port;

    let mut endpoint = Endpoint::bind(config)?;
    println!("listening on {}:{}", group, port);

    loop {
        match endpoint.recv(Some(Duration::from_secs(5)))? {
            Some(message) => {
                let text = String::from_utf8_lossy(message.data());
                println!(
                    "[{}] from={} utime={} payload=\"{}\"",
                    message.channel(),
                    message.from(),
                    message.recv_utime(),
                    text
                );
            }
            None => println!("(quiet)"),
        }
    }
}
