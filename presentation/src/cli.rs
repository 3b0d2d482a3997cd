use application::resources::{QdrantRagService, RagResources};
use clap::Parser;
use colored::Colorize;
use infrastructure::config::Config;
use shared::input::{ask_question, is_exit_command};
use shared::telemetry::init_tracing;
use shared::types::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const QUESTION_PROMPT: &str = "Mời nhập câu hỏi (gõ 'exit' để thoát)";
const RULE_WIDTH: usize = 50;

#[derive(Parser, Debug)]
#[command(name = "dsqa")]
#[command(about = "Data Science Q&A assistant grounded in a Qdrant knowledge base")]
pub struct Cli {
    /// Only verify the vector store connection and collection, then exit
    #[arg(long)]
    pub check: bool,

    /// Number of candidates requested from the vector store
    #[arg(long, value_name = "N")]
    pub top_k: Option<usize>,

    /// Minimum similarity score (exclusive) for a passage to be used
    #[arg(long, value_name = "SCORE")]
    pub threshold: Option<f32>,

    /// Debug-level logs (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,

    /// Question to answer; starts an interactive session when omitted
    #[arg(trailing_var_arg = true)]
    pub question: Vec<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(threshold) = self.threshold {
            config.relevance_threshold = threshold;
        }
    }
}

pub struct CliApp;

impl CliApp {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        init_tracing(cli.verbose);

        let mut config = Config::load()?;
        cli.apply_overrides(&mut config);
        config.validate()?;

        let resources = RagResources::connect(config).await?;
        let result = if cli.check {
            self.handle_check(&resources);
            Ok(())
        } else if !cli.question.is_empty() {
            let question = cli.question.join(" ");
            self.handle_question(&resources, &question).await;
            Ok(())
        } else {
            self.handle_interactive(&resources).await
        };

        resources.shutdown();
        result
    }

    fn handle_check(&self, resources: &RagResources) {
        let info = resources.collection();
        println!(
            "{} collection '{}' at {}",
            "OK".green().bold(),
            resources.config().qdrant_collection,
            resources.config().qdrant_url
        );
        if let Some(status) = &info.status {
            println!("  status:      {status}");
        }
        if let Some(points) = info.points_count {
            println!("  points:      {points}");
        }
        if let Some(size) = info.vector_size {
            println!("  vector size: {size}");
        }
    }

    async fn handle_question(&self, resources: &RagResources, question: &str) {
        let answer = ask(&resources.service(), resources.shutdown_token(), question).await;
        print_answer(&answer);
    }

    async fn handle_interactive(&self, resources: &RagResources) -> Result<()> {
        let service = resources.service();
        loop {
            let question = ask_question(QUESTION_PROMPT)?;
            if is_exit_command(&question) {
                break;
            }
            if question.trim().is_empty() {
                continue;
            }
            let answer = ask(&service, resources.shutdown_token(), question.trim()).await;
            print_answer(&answer);
        }
        Ok(())
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Ctrl-C cancels the in-flight request instead of killing the process.
async fn ask(service: &QdrantRagService, shutdown: CancellationToken, question: &str) -> String {
    eprintln!("{}", "Đang suy nghĩ...".dimmed());
    let cancel = shutdown.child_token();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received, cancelling request");
                cancel.cancel();
            }
        })
    };
    let answer = service.answer(question, &cancel).await;
    watcher.abort();
    answer.into_text()
}

fn print_answer(answer: &str) {
    println!("\n{}\n{}\n{}", "Trả lời:".bold().green(), answer, "-".repeat(RULE_WIDTH));
}
