use clap::{Parser, Subcommand};
use reqwest::header::ALLOW;
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Inspect the routes of a running route-mux server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table
    Routes {
        /// Introspection path on the server
        #[arg(long, default_value = "/_routes")]
        path: String,
    },
    /// Print the methods a path accepts, from an OPTIONS request
    Allow {
        /// Request path, e.g. /api/v1/users/7
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Routes { path } => {
            let res = client.get(format!("{base}{path}")).send().await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: server returned status {status}");
                std::process::exit(1);
            }
            let routes: Value = res.json().await?;
            print_routes(&routes);
        }
        Commands::Allow { path } => {
            let res = client
                .request(Method::OPTIONS, format!("{base}{path}"))
                .send()
                .await?;
            match res.headers().get(ALLOW) {
                Some(allow) => println!("{}", allow.to_str()?),
                None => {
                    eprintln!("No Allow header (status {})", res.status());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn print_routes(routes: &Value) {
    let Some(routes) = routes.as_array() else {
        println!("{}", serde_json::to_string_pretty(routes).unwrap_or_default());
        return;
    };
    for route in routes {
        let pattern = route["pattern"].as_str().unwrap_or("?");
        let methods = route["methods"]
            .as_array()
            .map(|methods| {
                methods
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        let methods = if route["any_method"].as_bool().unwrap_or(false) {
            "*".to_string()
        } else {
            methods
        };
        println!("{pattern:<40} {methods}");
    }
}
