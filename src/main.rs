use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tickview::context::{ProjectionConfig, ProjectionContext};
use tickview::lens::PresetConfig;
use tickview::render::{self, TotalsView};
use tickview::tick::TickRecord;
use tickview::view::OverrideTable;

#[derive(Parser)]
#[command(name = "tickview")]
#[command(about = "Tick-stream view projection replay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSONL tick stream and report the resulting projection state.
    Replay {
        /// Tick records, one JSON object per line.
        #[arg(long)]
        ticks: String,

        /// Schema override config (`schema_id = view_kind` lines).
        #[arg(long)]
        overrides: Option<String>,

        /// Lens preset config JSON.
        #[arg(long)]
        presets: Option<String>,

        #[arg(short = 'o', long)]
        out: String,
    },
}

fn main() -> tickview::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Replay {
            ticks,
            overrides,
            presets,
            out,
        } => {
            // 1) Parse the schema override config, if any.
            let overrides = match overrides {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("read override config {}", path))?;
                    OverrideTable::parse(&text)?
                }
                None => OverrideTable::default(),
            };

            // 2) Build the projection context.
            let mut ctx = ProjectionContext::new(ProjectionConfig {
                overrides,
                ..ProjectionConfig::default()
            });
            if let Some(path) = presets {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("read preset config {}", path))?;
                let config: PresetConfig = serde_json::from_str(&text)
                    .with_context(|| format!("parse preset config {}", path))?;
                ctx.lens.import_presets(config);
            }

            // 3) Replay the stream.
            let text = std::fs::read_to_string(&ticks)
                .with_context(|| format!("read tick stream {}", ticks))?;
            let mut totals = TotalsView::default();
            for (lineno, line) in text.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let tick: TickRecord = serde_json::from_str(line)
                    .with_context(|| format!("tick parse error at {}:{}", ticks, lineno + 1))?;

                let effect = ctx.apply_tick(&tick);
                totals.ticks += 1;
                totals.view_refreshes += effect.refreshed.len() as u64;
                totals.fixed64_changes += u64::from(effect.fixed64_changed);
                totals.value_changes += u64::from(effect.value_changed);
                totals.full_reprocesses += u64::from(effect.require_full || tick.patch.is_none());
            }

            // 4) Render the report.
            let data = render::build_report(&ctx, totals);
            let json = render::render_json_report(&data)?;
            std::fs::write(&out, json)?;
            println!("Wrote {}", out);
        }
    }

    Ok(())
}
