// build.rs

use std::env;

fn main() -> anyhow::Result<()> {
    let api_port = env::var("API_PORT").unwrap_or_else(|_| "5000".into());
    let push_interval = env::var("PUSH_INTERVAL_MS").unwrap_or_else(|_| "1000".into());
    let poll_ms = env::var("POLL_MS").unwrap_or_else(|_| "50".into());

    println!("cargo:rustc-env=API_PORT={api_port}");
    println!("cargo:rustc-env=PUSH_INTERVAL_MS={push_interval}");
    println!("cargo:rustc-env=POLL_MS={poll_ms}");
    println!("cargo:rerun-if-env-changed=API_PORT");
    println!("cargo:rerun-if-env-changed=PUSH_INTERVAL_MS");
    println!("cargo:rerun-if-env-changed=POLL_MS");

    Ok(())
}

// EOF
