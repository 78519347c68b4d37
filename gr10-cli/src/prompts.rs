use anyhow::Result;
use inquire::{Confirm, Editor, Text};

use gr10_core::{FormRecord, ALERT_DESCRIPTIONS, DISPOSITION_LABELS};

/// Prompts for a text field, keeping the current value when the user
/// submits an empty answer.
fn text_with_current(label: &str, current: &str) -> Result<String> {
    let prompt = if current.is_empty() {
        format!("{label}:")
    } else {
        format!("{label} [{current}]:")
    };
    let input = Text::new(&prompt).prompt()?;
    if input.is_empty() {
        Ok(current.to_string())
    } else {
        Ok(input)
    }
}

/// Prompts the user through a whole GR10 A07 form. Starts from the
/// stored record when the contract already has one, so a re-run edits
/// instead of starting over.
pub fn prompt_form(contrato: &str, existing: Option<FormRecord>) -> Result<FormRecord> {
    let mut record = existing.unwrap_or_default();
    record.set(FormRecord::CONTRACT, contrato);

    let text_fields = [
        (FormRecord::CLIENT_NAME, "Cliente"),
        (FormRecord::MANAGER_NAME, "Gestor de relacionamento"),
        (FormRecord::AMOUNT, "Valor do contrato/operação"),
        (FormRecord::PAYMENT_DATE, "Data de pagamento"),
        (FormRecord::POINTED_OUT_BY, "Responsável pelo apontamento"),
        (FormRecord::POINTED_OUT_DATE, "Data do apontamento"),
        (FormRecord::FILLED_IN_BY, "Responsável pelo preenchimento"),
        (FormRecord::FILLED_IN_DATE, "Data do preenchimento"),
    ];
    for (key, label) in text_fields {
        let value = text_with_current(label, record.value(key))?;
        record.set(key, value);
    }

    if Confirm::new("Registrar alertas de monitoramento?")
        .with_default(false)
        .prompt()?
    {
        for (flag, description) in ALERT_DESCRIPTIONS {
            let set = Confirm::new(description).with_default(false).prompt()?;
            record.set(flag, if set { "sim" } else { "nao" });
        }
    }

    if Confirm::new("Registrar parecer final?")
        .with_default(false)
        .prompt()?
    {
        for (flag, label) in DISPOSITION_LABELS {
            let set = Confirm::new(label).with_default(false).prompt()?;
            record.set(flag, if set { "sim" } else { "nao" });
        }
    }

    if Confirm::new("Adicionar comentários?")
        .with_default(false)
        .prompt()?
    {
        let comments = Editor::new("Comentários adicionais - apontamento:").prompt()?;
        record.set(FormRecord::POINTED_OUT_COMMENTS, comments);

        let remarks = Editor::new("Pareceres adicionais - resposta:").prompt()?;
        record.set(FormRecord::ADDITIONAL_REMARKS, remarks);
    }

    Ok(record)
}
