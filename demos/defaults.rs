use std::cell::RefCell;

use flatconf::{Config, ConfigBinding, ConfigOption, ConfigurableObject};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

const PORT: ConfigOption<u16> = ConfigOption::new("PORT", 8080);
const WORKERS: ConfigOption<u32> = ConfigOption::new("WORKERS", 4);

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ServerSettings {
    host: String,
    port: u16,
    workers: u32,
}

struct Server<'a> {
    binding: ConfigBinding<'a>,
}

impl ConfigurableObject for Server<'_> {
    fn config(&self) -> Option<&RefCell<Config>> {
        self.binding.config()
    }

    fn object_name(&self) -> &str {
        self.binding.object_name()
    }
}

fn main() -> Result<(), flatconf::ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let config = Config::builder()
        .with_file("demos/server.cfg", false)
        .with_env("DEMO", "_")
        .build()?;
    let shared = RefCell::new(config);

    let server = Server {
        binding: ConfigBinding::new(Some(&shared), "server"),
    };
    let host = ConfigOption::new("HOST", String::from("localhost"));
    println!(
        "{}: {}:{} workers={}",
        server.object_name(),
        server.option(&host),
        server.option(&PORT),
        server.option(&WORKERS)
    );

    let settings: ServerSettings = shared.borrow().extract()?;
    println!("{settings:?}");

    shared.borrow().write("demos/server.out.cfg")?;
    Ok(())
}
