//! skillweave CLI binary.
//!
//! Discovers skill bundles, routes the task given on the command line
//! through the orchestrator, and prints the execution result.
//!
//! # Environment Variables
//!
//! - `SKILLS_DIR` — directory of skill bundles (default: "./skills")
//! - `OPENAI_API_KEY` — completion API key (offline scoring without it)
//! - `OPENAI_MODEL` — model identifier (default: "gpt-4o-mini")
//! - `OPENAI_TEMPERATURE` — sampling temperature (default: 0.3)
//! - `RUST_LOG` — log filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin skillweave -- "analyze current market trends"
//! ```

use anyhow::Context;
use env_logger::Env;

use skillweave::executor::ExecutionStatus;
use skillweave::{DirectorySkillRegistry, OrchestratorConfig, SkillOrchestrator, SkillRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = OrchestratorConfig::from_env();

    let skills_dir = std::env::var("SKILLS_DIR").unwrap_or_else(|_| "./skills".to_string());
    let registry = DirectorySkillRegistry::new(&skills_dir);

    let skills = registry
        .list_skills()
        .with_context(|| format!("failed to discover skills under {skills_dir}"))?;
    if skills.is_empty() {
        anyhow::bail!("no skills found under {skills_dir}");
    }
    let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();
    log::info!("Found {} skill(s): {}", skills.len(), names.join(", "));

    let task: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let task = if task.trim().is_empty() {
        "Help me with analysis and insights".to_string()
    } else {
        task
    };
    log::info!("Task: {}", task);

    let orchestrator = SkillOrchestrator::new(&config)?;
    let result = orchestrator.orchestrate(&task, &registry).await;

    println!("{}", "=".repeat(80));
    println!("EXECUTION RESULTS");
    println!("{}", "=".repeat(80));
    println!("Status: {}", result.status);

    match result.status {
        ExecutionStatus::Completed => {
            if let Some(ref answer) = result.result {
                println!("\n{answer}");
            }
            println!(
                "\n{} agent output(s) recorded",
                result.agent_outputs.len()
            );
        }
        ExecutionStatus::Partial => {
            println!(
                "Synthesis unavailable ({}); {} independent output(s) preserved:",
                result.error.as_deref().unwrap_or("unknown error"),
                result.agent_outputs.len(),
            );
            for output in &result.agent_outputs {
                println!("\n--- Step {} ({}) ---", output.step, output.skill_name);
                println!("{}", output.output);
            }
        }
        ExecutionStatus::Failed => {
            eprintln!("Error: {}", result.error.as_deref().unwrap_or("unknown error"));
            std::process::exit(1);
        }
    }

    Ok(())
}
