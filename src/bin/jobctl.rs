use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "jobctl")]
#[command(about = "Submit jobs to a running orchestrator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job and print its result
    Submit {
        /// Job key
        #[arg(short, long)]
        key: String,
        /// JSON payload
        #[arg(short, long)]
        payload: Option<String>,
    },
    /// Check whether the ingress is accepting work
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Submit { key, payload } => {
            let payload: Value = match payload {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Null,
            };
            let res = client
                .post(format!("{}/jobs", cli.url))
                .json(&json!({ "key": key, "payload": payload }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        eprintln!("Error: orchestrator returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
