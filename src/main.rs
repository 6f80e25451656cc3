//! Kodegen Bundler Pack - build-and-pack pipeline for npm package archives.
//!
//! This binary builds a dependency library and a CLI package, prepares the
//! package manifest, packs a distributable archive and smoke-tests the result.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match kodegen_bundler_pack::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
