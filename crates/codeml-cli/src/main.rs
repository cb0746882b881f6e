use std::process;

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match codeml_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("codeml-tool error: {err:#}");
            process::exit(1);
        }
    }
}
