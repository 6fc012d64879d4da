use std::io::Read;

use crate::cli::resolve_config;
use crate::error::{Result, RoyaltyError};
use crate::handler::{handle, Request};
use crate::store::FsBlobStore;

pub fn run(store: &str, event: Option<&str>) -> Result<()> {
    let raw = match event {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let request: Request = serde_json::from_str(&raw)
        .map_err(|e| RoyaltyError::MalformedInput(format!("invalid event: {e}")))?;

    let config = resolve_config(None, None)?;
    let store = FsBlobStore::new(store);
    let response = handle(&request, &store, &config);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
