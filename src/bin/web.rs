use achot::app;
use achot::config::AppConfig;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Optional positional overrides: [database_dir] [user]
    let args: Vec<String> = env::args().skip(1).collect();
    let config = AppConfig::from_env().with_args(&args);

    println!("Starting achot server on {}", config.bind);
    app::run(config).await
}
