use anyhow::Context;
use clap::Parser;
use feed::bind_feed;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::{Runner, WorkflowConfig};

mod feed;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic vehicle feed and host driver for fleetcore")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Serve the synthetic websocket feed
    #[arg(long, default_value_t = false)]
    feed: bool,
    /// Run the ingestion pipeline as host against the configured URL
    #[arg(long, default_value_t = false)]
    ingest: bool,
    #[arg(long, default_value = "ws://127.0.0.1:9000/socket")]
    url: String,
    #[arg(long, default_value = "tools/data/vehicles.redb")]
    db: PathBuf,
    /// Stop ingesting after this many frames
    #[arg(long)]
    max_frames: Option<usize>,
    /// Override the number of simulated vehicles
    #[arg(long)]
    vehicles: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let serve_feed = args.feed;
    let ingest = args.ingest;

    let mut workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.url, args.db, args.max_frames)
    };
    if let Some(vehicles) = args.vehicles {
        workflow_config.feed.vehicles = vehicles;
    }
    workflow_config.validate()?;

    if !serve_feed && !ingest {
        anyhow::bail!("nothing to do: pass --feed, --ingest or both");
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    runtime.block_on(async move {
        if serve_feed {
            let (addr, server) = bind_feed(workflow_config.feed.clone())?;
            println!("[feed] serving ws://{}/socket", addr);
            tokio::spawn(server);
        }

        if ingest {
            let runner = Runner::new(workflow_config.clone());
            let summary = runner
                .execute(async {
                    signal::ctrl_c().await.ok();
                })
                .await?;
            println!(
                "Ingest run -> frames {}, rows in last frame {}, entities {}, persisted {:?}, reconnects {}",
                summary.frames,
                summary.last_row_count,
                summary.entities,
                summary.persisted_entities,
                summary.reconnects_seen
            );
            println!(
                "metrics {}",
                serde_json::to_string(&summary.metrics).context("encoding metrics")?
            );
        } else {
            println!("[feed] running (Ctrl+C to stop)...");
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        }
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
