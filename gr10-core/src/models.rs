use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents one stored GR10 A07 monitoring form: a structurally
/// untyped map of field name to field value, kept exactly as submitted.
/// Any key may be absent; no schema is enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormRecord {
    fields: BTreeMap<String, String>,
}

impl FormRecord {
    /// Contract/operation number, normalized to digits on save
    pub const CONTRACT: &'static str = "contrato";
    /// Relationship manager name
    pub const MANAGER_NAME: &'static str = "nome_gestor_relacionamento";
    /// Legacy key for the relationship manager name, still present in
    /// older stored forms
    pub const MANAGER_NAME_LEGACY: &'static str = "gestor_relacionamento";
    /// Who pointed the alert out
    pub const POINTED_OUT_BY: &'static str = "responsavel_apontamento";
    /// When the alert was pointed out
    pub const POINTED_OUT_DATE: &'static str = "data_apontamento";
    /// Who filled the form in
    pub const FILLED_IN_BY: &'static str = "responsavel_preenchimento";
    /// When the form was filled in
    pub const FILLED_IN_DATE: &'static str = "data_preenchimento";
    /// Free-text closing remarks carried into the report
    pub const ADDITIONAL_REMARKS: &'static str = "pareceres_adicionais_resposta";
    /// Contract payment date (spreadsheet export only)
    pub const PAYMENT_DATE: &'static str = "data_pagamento";
    /// Client name (spreadsheet export only)
    pub const CLIENT_NAME: &'static str = "cliente_nome";
    /// Contract amount (spreadsheet export only)
    pub const AMOUNT: &'static str = "valor";
    /// Additional commentary from whoever pointed the alert out
    pub const POINTED_OUT_COMMENTS: &'static str = "comentario_adicional_apontamento";
    /// Additional commentary from the credit area
    pub const CREDIT_COMMENTS: &'static str = "comentarios_credito";
    /// Final opinion from the PLD/FT directorate
    pub const DIRECTORATE_OPINION: &'static str = "parecer_diretoria";

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Returns the value for `key`, or the empty string when absent.
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// A yes/no flag counts as set when its trimmed, lowercased value
    /// is exactly "sim".
    pub fn is_flag_set(&self, key: &str) -> bool {
        self.value(key).trim().to_lowercase() == "sim"
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl FromIterator<(String, String)> for FormRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A derived, non-persisted projection of one record for the date-range
/// report. Dates are display strings: `DD/MM/YYYY` when the stored value
/// parsed, otherwise the raw stored text unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportRow {
    pub contrato: String,
    pub nome_gestor_relacionamento: String,
    pub responsavel_apontamento: String,
    pub data_apontamento: String,
    pub responsavel_preenchimento: String,
    pub data_preenchimento: String,
    pub pareceres_adicionais_resposta: String,
}

/// Fixed lookup of alert-flag keys to the human-readable reasons used in
/// the spreadsheet export. Order matters: the "Motivo" column joins the
/// matched descriptions in this order.
pub const ALERT_DESCRIPTIONS: [(&str, &str); 17] = [
    ("hist1_alerta", "Cliente com Histórico de Endividamento elevado no setor agrícola"),
    ("hist2_alerta", "Cliente já citado em alertas anteriores"),
    ("mov1_alerta", "Movimentação mensal 30% acima da capacidade financeira"),
    ("mov2_alerta", "Entradas com origem incompatível"),
    ("mov3_alerta", "Liquidações antecipadas frequentemente, ≥ a 2 contratos liquidados antecipadamente"),
    ("mov4_alerta", "Entrada/saída concentrada em poucos dias"),
    ("mov5_alerta", "Transferência entre empresas do mesmo grupo sem justificativa"),
    ("perfil1_alerta", "Perfil de risco divergente do histórico de crédito"),
    ("perfil2_alerta", "Mudança repentina de endereço ou estrutura"),
    ("perfil3_alerta", "Uso de laranjas para movimentar recursos"),
    ("perfil4_alerta", "Recusa em fornecer informações cadastrais"),
    ("perfil5_alerta", "Atividade sensível (Econômica/Profissional) ou Praça de Fronteira"),
    ("cad1_alerta", "Cadastrado com documentos inválidos ou vencidos"),
    ("cad2_alerta", "CPF/CNPJ com pendências legais graves"),
    ("cad4_alerta", "Contratos ou documentos com rasuras"),
    ("cad5_alerta", "Incompatibilidade entre dados fornecidos e fontes oficiais"),
    ("cad6_alerta", "Cadastrado por colaborador sem alçada"),
];

/// Fixed lookup of final-opinion flags to the labels joined into the
/// "Parecer Final" spreadsheet column, in this order.
pub const DISPOSITION_LABELS: [(&str, &str); 5] = [
    ("coaf", "Comunicar ao COAF"),
    ("arquivar_alerta", "Arquivar o alerta"),
    ("bloquear_cadastro", "Bloquear o Cadastro"),
    ("solicitar_atualizacao", "Solicitar atualização cadastral"),
    ("outros_parecer", "Outros"),
];

/// Descriptions of every alert flag set on the record, in table order.
pub fn alert_reasons(record: &FormRecord) -> Vec<&'static str> {
    ALERT_DESCRIPTIONS
        .iter()
        .filter(|(flag, _)| record.is_flag_set(flag))
        .map(|(_, description)| *description)
        .collect()
}

/// Labels of every disposition flag set on the record, in table order.
pub fn dispositions(record: &FormRecord) -> Vec<&'static str> {
    DISPOSITION_LABELS
        .iter()
        .filter(|(flag, _)| record.is_flag_set(flag))
        .map(|(_, label)| *label)
        .collect()
}
