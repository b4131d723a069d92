use std::io;

use onecrm::CrmClient;
use serde_json::{Map, json};

fn required_env(name: &str) -> Result<String, io::Error> {
    std::env::var(name).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{name} environment variable is required"),
        )
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let debug = std::env::var("ONECRM_DEBUG").is_ok_and(|value| value == "1");
    // reqwest emits its connection trace on `reqwest::connect::verbose` at trace level.
    let default_filter = if debug { "onecrm=debug,reqwest=trace" } else { "onecrm=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let endpoint = required_env("ONECRM_ENDPOINT")?;
    let user = required_env("ONECRM_USER")?;
    let password = required_env("ONECRM_PASSWORD")?;

    let mut client = CrmClient::new(endpoint, debug)?;
    client.login(user, password)?;
    print!("{}", client.list_modules()?);

    let mut params = Map::new();
    params.insert("select_fields".to_owned(), json!(["id", "name"]));
    params.insert("max_results".to_owned(), json!(10));
    let response = client.call("Accounts", "get_entry_list", params)?;

    for field in onecrm::decode_entry_list(&response)? {
        println!("{}: {}", field.name, field.value);
    }
    println!("last request took {:.3}s", client.last_request_secs());

    Ok(())
}
