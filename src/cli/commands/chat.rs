//! `medtriage chat` - interactive triage interview.

use anyhow::Result;
use clap::Args;
use comfy_table::Table;
use console::style;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::cli::corpus;
use crate::domain::models::{PatientContext, TriageAssessment};
use crate::infrastructure::bootstrap;

#[derive(Args)]
pub struct ChatArgs {
    /// What brings the patient in today
    #[arg(long)]
    pub complaint: String,

    /// Patient name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Patient age
    #[arg(long)]
    pub age: Option<u32>,

    /// Patient gender
    #[arg(long, default_value = "")]
    pub gender: String,

    /// Relevant medical history
    #[arg(long, default_value = "")]
    pub history: String,

    /// JSONL corpus file to ground the interview in
    #[arg(long)]
    pub corpus: Option<PathBuf>,
}

pub async fn execute(args: ChatArgs, json: bool, config_path: Option<&PathBuf>) -> Result<()> {
    let config = crate::cli::load_config(config_path)?;
    let (controller, index) = bootstrap::build_engine(&config)?;

    if let Some(corpus_path) = &args.corpus {
        let embedder = bootstrap::build_embedding_provider(&config)?;
        let records = corpus::load_corpus(corpus_path)?;
        let count = corpus::index_corpus(&index, &embedder, &records, !json).await?;
        eprintln!("{} grounded on {count} reference chunks", style("info:").dim());
    } else {
        eprintln!(
            "{} no corpus supplied; the interview runs ungrounded",
            style("warn:").yellow()
        );
    }

    let patient = PatientContext {
        name: args.name,
        age: args.age,
        gender: args.gender,
        medical_history: args.history,
        chief_complaint: args.complaint,
    };

    let created = controller.create_session(patient).await?;
    println!(
        "{} {}",
        style("assistant:").cyan().bold(),
        created.opening_question
    );

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", style("you:").green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            controller.abandon(created.session_id).await?;
            println!("\n{} session abandoned", style("info:").dim());
            return Ok(());
        };
        let line = line?;
        let text = line.trim();

        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
            controller.abandon(created.session_id).await?;
            println!("{} session abandoned", style("info:").dim());
            return Ok(());
        }

        let turn = controller.submit_message(created.session_id, text).await?;
        println!("{} {}", style("assistant:").cyan().bold(), turn.reply);

        if turn.complete {
            let Some(assessment) = turn.result else {
                anyhow::bail!("completed turn carried no assessment");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else {
                print_assessment(&assessment);
            }
            return Ok(());
        }
    }
}

fn print_assessment(assessment: &TriageAssessment) {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![
        "Urgency".to_string(),
        assessment.urgency_level.to_string(),
    ]);
    table.add_row(vec![
        "Recommended action".to_string(),
        assessment.recommended_action.clone(),
    ]);
    table.add_row(vec!["Timeframe".to_string(), assessment.timeframe.clone()]);
    table.add_row(vec!["Reasoning".to_string(), assessment.reasoning.clone()]);
    if !assessment.missing_information.is_empty() {
        table.add_row(vec![
            "Missing information".to_string(),
            assessment.missing_information.join("; "),
        ]);
    }
    if !assessment.warning_signs.is_empty() {
        table.add_row(vec![
            "Warning signs".to_string(),
            assessment.warning_signs.join("; "),
        ]);
    }
    if !assessment.sources.is_empty() {
        let sources: Vec<String> = assessment
            .sources
            .iter()
            .map(|s| s.source.clone())
            .collect();
        table.add_row(vec!["Sources".to_string(), sources.join(", ")]);
    }

    println!("\n{table}");
    println!("{}", style(&assessment.disclaimer).dim());
}
