mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use gr10_core::{
    collect, config_path, normalize_contract, notify_all, render_form, render_report,
    upsert_response, AppConfig, FormRecord, FormStore, SmtpMailer,
};

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_file = match &cli.config {
        Some(path) => path.clone(),
        None => config_path()?,
    };
    let config = AppConfig::load_or_default(&config_file)?;
    let store = FormStore::new(&config.data_dir);

    match &cli.command {
        Command::Search { contrato } => {
            search_form(&store, contrato)?;
        }
        Command::Show { contrato } => {
            show_form(&store, contrato)?;
        }
        Command::Save {
            contrato,
            file,
            interactive,
        } => {
            save_form(&store, &config, contrato, file.as_deref(), *interactive)?;
        }
        Command::Report {
            data_inicio,
            data_fim,
            pdf,
        } => {
            run_report(&store, data_inicio, data_fim, pdf.as_deref())?;
        }
        Command::FormPdf { contrato, output } => {
            write_form_pdf(&store, contrato, output)?;
        }
        Command::Export { contrato } => {
            export_form(&store, &config, contrato)?;
        }
        Command::Notify {
            contrato,
            to,
            name,
            note,
        } => {
            send_notifications(&config, contrato, to, name, note.as_deref().unwrap_or(""))?;
        }
        Command::ConfigPath => {
            println!("{}", config_file.display());
        }
    }

    Ok(())
}

/// Normalizes a user-entered contract number, rejecting input that
/// carries no digits at all.
fn required_contract(raw: &str) -> Result<String> {
    let contrato = normalize_contract(raw);
    if contrato.is_empty() {
        anyhow::bail!("Número do contrato não informado.");
    }
    Ok(contrato)
}

fn search_form(store: &FormStore, raw: &str) -> Result<()> {
    let contrato = required_contract(raw)?;
    if store.exists(&contrato) {
        println!(
            "{}",
            format!("Formulário encontrado para contrato {contrato}").green()
        );
    } else {
        println!(
            "{}",
            format!("Nenhum formulário encontrado para contrato {contrato}").red()
        );
    }
    Ok(())
}

fn show_form(store: &FormStore, raw: &str) -> Result<()> {
    let contrato = required_contract(raw)?;
    let Some(record) = store.load(&contrato)? else {
        anyhow::bail!("Nenhum formulário encontrado para contrato {contrato}");
    };

    println!("{}", format!("Formulário do contrato {contrato}").bold());
    for (key, value) in record.iter() {
        println!("  {}: {}", key.cyan(), value);
    }
    Ok(())
}

fn save_form(
    store: &FormStore,
    config: &AppConfig,
    raw: &str,
    file: Option<&Path>,
    interactive: bool,
) -> Result<()> {
    let contrato = required_contract(raw)?;

    // Default to interactive mode when no form file is provided
    let mut record: FormRecord = match file {
        Some(path) if !interactive => {
            let reader = BufReader::new(
                File::open(path)
                    .with_context(|| format!("Failed to open form file: {:?}", path))?,
            );
            serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse form file: {:?}", path))?
        }
        _ => prompts::prompt_form(&contrato, store.load(&contrato)?)?,
    };
    record.set(FormRecord::CONTRACT, contrato.as_str());

    store.save(&contrato, &record)?;
    println!("{}", "Formulário salvo com sucesso!".green());

    // The record file stays the source of truth; a spreadsheet hiccup
    // must not fail the save
    match upsert_response(&config.spreadsheet_path, &record) {
        Ok(()) => println!(
            "Planilha consolidada atualizada: {}",
            config.spreadsheet_path.display()
        ),
        Err(e) => println!(
            "{}",
            format!("Aviso: falha ao atualizar a planilha consolidada: {e:#}").yellow()
        ),
    }
    Ok(())
}

fn run_report(store: &FormStore, inicio: &str, fim: &str, pdf: Option<&Path>) -> Result<()> {
    let rows = collect(store, inicio, fim);

    if let Some(path) = pdf {
        let bytes = render_report(&rows, inicio, fim)?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        println!(
            "{}",
            format!("Relatório gravado em {}", path.display()).green()
        );
        return Ok(());
    }

    if rows.is_empty() {
        println!(
            "{}",
            "Nenhum dado encontrado para o período informado.".yellow()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<12} {:<24} {:<22} {:<12} {:<22} {:<12}",
            "Contrato", "Gestor", "Resp. Apontamento", "Data Apont.", "Resp. Preench.", "Data Preench."
        )
        .bold()
    );
    for row in &rows {
        println!(
            "{:<12} {:<24} {:<22} {:<12} {:<22} {:<12}",
            row.contrato,
            row.nome_gestor_relacionamento,
            row.responsavel_apontamento,
            row.data_apontamento,
            row.responsavel_preenchimento,
            row.data_preenchimento
        );
    }
    println!("\n{} registro(s) no período.", rows.len());
    Ok(())
}

fn write_form_pdf(store: &FormStore, raw: &str, output: &Path) -> Result<()> {
    let contrato = required_contract(raw)?;
    let Some(record) = store.load(&contrato)? else {
        anyhow::bail!("Nenhum formulário encontrado para contrato {contrato}");
    };

    let bytes = render_form(&contrato, &record)?;
    std::fs::write(output, bytes)
        .with_context(|| format!("Failed to write PDF to {:?}", output))?;
    println!(
        "{}",
        format!("Formulário gravado em {}", output.display()).green()
    );
    Ok(())
}

fn export_form(store: &FormStore, config: &AppConfig, raw: &str) -> Result<()> {
    let contrato = required_contract(raw)?;
    let Some(record) = store.load(&contrato)? else {
        anyhow::bail!("Nenhum formulário encontrado para contrato {contrato}");
    };

    upsert_response(&config.spreadsheet_path, &record)?;
    println!(
        "{}",
        format!(
            "Contrato {contrato} exportado para {}",
            config.spreadsheet_path.display()
        )
        .green()
    );
    Ok(())
}

fn send_notifications(
    config: &AppConfig,
    raw: &str,
    to: &str,
    name: &str,
    note: &str,
) -> Result<()> {
    let contrato = required_contract(raw)?;
    if to.trim().is_empty() || name.trim().is_empty() {
        anyhow::bail!("Todos os campos são obrigatórios.");
    }

    let mailer = SmtpMailer::from_config(&config.smtp);
    let count = notify_all(&mailer, &config.form_link_base, to, &contrato, name, note)?;
    if count == 0 {
        anyhow::bail!("Nenhum destinatário informado.");
    }

    println!(
        "{}",
        format!("E-mails enviados com sucesso! ({count} destinatário(s))").green()
    );
    Ok(())
}
