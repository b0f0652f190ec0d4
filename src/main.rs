use std::{env, path::Path, process};

use inputmap::{CancellationToken, Config, Error, setup};
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};

fn run(path: &Path) -> Result<(), Error> {
    let token = CancellationToken::new();
    for signal in [SIGINT, SIGHUP, SIGTERM] {
        signal_hook::flag::register(signal, token.flag())
            .map_err(|e| Error::io("failed to install signal handler", e))?;
    }

    let config = Config::load(path)?;
    let mut runtime = setup::build(&config)?;
    runtime.run(&token)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("inputmap=info"))
        .init();

    let path = match &*env::args_os().skip(1).collect::<Vec<_>>() {
        [path] => Path::new(path).to_path_buf(),
        _ => {
            eprintln!("usage: {} <config>", env!("CARGO_CRATE_NAME"));
            process::exit(1);
        }
    };

    if let Err(e) = run(&path) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
