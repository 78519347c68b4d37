use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

use crate::models::{alert_reasons, dispositions, FormRecord};

/// Column headers of the consolidated responses spreadsheet, in sheet
/// order. The layout is consumed by the compliance team's own tooling
/// and must stay stable.
pub const COLUMNS: [&str; 14] = [
    "Nº Contrato/Operação",
    "Data Pagamento Contrato/Operação",
    "Data de Preenchimento",
    "Cliente",
    "Gestor de Relacionamento",
    "Valor Contrato/Operação",
    "Motivo",
    "Parecer Final",
    "Responsável pelo Apontamento",
    "Responsável pelo Preenchimento",
    "4. Comentários Adicionais - Apontamento",
    "5. Pareceres Adicionais - Resposta",
    "6. Comentários Adicionais – Área de Crédito",
    "8. Parecer final - Diretoria Responsável por PLD/FT",
];

fn row_values(record: &FormRecord) -> [String; 14] {
    [
        record.value(FormRecord::CONTRACT).to_string(),
        record.value(FormRecord::PAYMENT_DATE).to_string(),
        record.value(FormRecord::FILLED_IN_DATE).to_string(),
        record.value(FormRecord::CLIENT_NAME).to_string(),
        record.value(FormRecord::MANAGER_NAME).to_string(),
        record.value(FormRecord::AMOUNT).to_string(),
        alert_reasons(record).join("; "),
        dispositions(record).join("; "),
        record.value(FormRecord::POINTED_OUT_BY).to_string(),
        record.value(FormRecord::FILLED_IN_BY).to_string(),
        record.value(FormRecord::POINTED_OUT_COMMENTS).to_string(),
        record.value(FormRecord::ADDITIONAL_REMARKS).to_string(),
        record.value(FormRecord::CREDIT_COMMENTS).to_string(),
        record.value(FormRecord::DIRECTORATE_OPINION).to_string(),
    ]
}

/// Upserts one form into the consolidated spreadsheet: any existing row
/// for the same contract id is dropped, every other row is preserved,
/// and the new row is appended. Creates the file (with header) on first
/// export.
pub fn upsert_response(path: &Path, record: &FormRecord) -> Result<()> {
    let contrato = record.value(FormRecord::CONTRACT);

    // Rows that survive from a previous export
    let mut kept: Vec<Vec<String>> = Vec::new();
    if path.exists() {
        let book = umya_spreadsheet::reader::xlsx::read(path)
            .map_err(|e| anyhow!("failed to read spreadsheet {}: {e}", path.display()))?;
        let sheet = book
            .get_sheet(&0)
            .ok_or_else(|| anyhow!("spreadsheet {} has no worksheet", path.display()))?;
        for row in 2..=sheet.get_highest_row() {
            if sheet.get_value((1, row)).to_string() == contrato {
                continue;
            }
            kept.push(
                (1..=COLUMNS.len() as u32)
                    .map(|col| sheet.get_value((col, row)).to_string())
                    .collect(),
            );
        }
    }

    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| anyhow!("new spreadsheet has no worksheet"))?;

    for (idx, header) in COLUMNS.iter().enumerate() {
        sheet.get_cell_mut((idx as u32 + 1, 1)).set_value(*header);
    }

    let mut next_row = 2u32;
    for values in &kept {
        for (idx, value) in values.iter().enumerate() {
            sheet
                .get_cell_mut((idx as u32 + 1, next_row))
                .set_value(value.clone());
        }
        next_row += 1;
    }
    for (idx, value) in row_values(record).iter().enumerate() {
        sheet
            .get_cell_mut((idx as u32 + 1, next_row))
            .set_value(value.clone());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {:?}", parent))?;
        }
    }
    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| anyhow!("failed to write spreadsheet {}: {e}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record(contrato: &str, cliente: &str) -> FormRecord {
        let mut record = FormRecord::new();
        record.set(FormRecord::CONTRACT, contrato);
        record.set(FormRecord::CLIENT_NAME, cliente);
        record.set(FormRecord::FILLED_IN_DATE, "2024-01-12");
        record.set("hist2_alerta", "sim");
        record.set("mov1_alerta", "Sim");
        record.set("coaf", "sim");
        record
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let book = umya_spreadsheet::reader::xlsx::read(path).unwrap();
        let sheet = book.get_sheet(&0).unwrap();
        (1..=sheet.get_highest_row())
            .map(|row| {
                (1..=COLUMNS.len() as u32)
                    .map(|col| sheet.get_value((col, row)).to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_first_export_writes_header_and_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("respostas.xlsx");

        upsert_response(&path, &sample_record("123", "Fazenda Boa Vista")).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], COLUMNS[0]);
        assert_eq!(rows[1][0], "123");
        assert_eq!(rows[1][3], "Fazenda Boa Vista");
        assert_eq!(
            rows[1][6],
            "Cliente já citado em alertas anteriores; Movimentação mensal 30% acima da capacidade financeira"
        );
        assert_eq!(rows[1][7], "Comunicar ao COAF");
    }

    #[test]
    fn test_second_export_replaces_row_for_same_contract() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("respostas.xlsx");

        upsert_response(&path, &sample_record("123", "Fazenda Boa Vista")).unwrap();
        upsert_response(&path, &sample_record("123", "Fazenda Santa Cruz")).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "123");
        assert_eq!(rows[1][3], "Fazenda Santa Cruz");
    }

    #[test]
    fn test_other_contracts_are_preserved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("respostas.xlsx");

        upsert_response(&path, &sample_record("123", "Fazenda Boa Vista")).unwrap();
        upsert_response(&path, &sample_record("456", "Sítio das Palmeiras")).unwrap();
        upsert_response(&path, &sample_record("123", "Fazenda Santa Cruz")).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        let contracts: Vec<&str> = rows[1..].iter().map(|r| r[0].as_str()).collect();
        assert!(contracts.contains(&"456"));
        assert!(contracts.contains(&"123"));
        let updated = rows[1..].iter().find(|r| r[0] == "123").unwrap();
        assert_eq!(updated[3], "Fazenda Santa Cruz");
    }
}
