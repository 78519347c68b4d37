use anyhow::{anyhow, Result};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::models::{FormRecord, ReportRow};

// A4, sizes in millimetres
const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: Mm = Mm(15.0);
const LINE_STEP: Mm = Mm(5.6);
// Start a fresh page once less than this much vertical space remains
const PAGE_BREAK_AT: Mm = Mm(21.0);
const LAYER_NAME: &str = "Camada 1";

/// Sequential top-to-bottom line writer over a paginated A4 document.
/// The whole document is buffered; callers receive the finished bytes.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: Mm,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("failed to embed builtin font: {e}"))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("failed to embed builtin font: {e}"))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: Mm(PAGE_HEIGHT.0 - MARGIN.0),
        })
    }

    fn heading(&mut self, text: &str) {
        self.layer.use_text(text, 12.0, MARGIN, self.y, &self.bold);
        self.y.0 -= LINE_STEP.0 + 2.0;
    }

    fn line(&mut self, text: &str) {
        if self.y.0 < PAGE_BREAK_AT.0 {
            self.new_page();
        }
        self.layer
            .use_text(text, 10.0, MARGIN, self.y, &self.regular);
        self.y.0 -= LINE_STEP.0;
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = Mm(PAGE_HEIGHT.0 - MARGIN.0);
    }

    fn into_bytes(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| anyhow!("failed to render document: {e}"))
    }
}

/// Renders one stored form as a printable document.
pub fn render_form(contrato: &str, record: &FormRecord) -> Result<Vec<u8>> {
    let mut writer = PageWriter::new("Formulário GR10 A07 - Monitoramento de PLD")?;
    writer.heading("Formulário GR10 A07 - Monitoramento de PLD");
    writer.line(&format!("Contrato: {contrato}"));
    for (key, value) in record.iter() {
        if key == FormRecord::CONTRACT {
            continue;
        }
        writer.line(&format!("{key}: {value}"));
    }
    writer.into_bytes()
}

/// Renders the date-range report: a title with both bounds, then one
/// block of seven labeled lines plus a separator per row. Rows are
/// expected in their final order.
pub fn render_report(rows: &[ReportRow], start_raw: &str, end_raw: &str) -> Result<Vec<u8>> {
    let mut writer = PageWriter::new("Relatório GR10 A07")?;
    writer.heading(&format!(
        "Relatório GR10 A07 — Período: {start_raw} a {end_raw}"
    ));

    if rows.is_empty() {
        writer.line("Nenhum dado encontrado para o período informado.");
        return writer.into_bytes();
    }

    for row in rows {
        let block = [
            format!("Contrato: {}", row.contrato),
            format!("Nome do Gestor: {}", row.nome_gestor_relacionamento),
            format!(
                "Responsável pelo Apontamento: {}",
                row.responsavel_apontamento
            ),
            format!("Data do Apontamento: {}", row.data_apontamento),
            format!(
                "Responsável pelo Preenchimento: {}",
                row.responsavel_preenchimento
            ),
            format!("Data do Preenchimento: {}", row.data_preenchimento),
            format!(
                "Pareceres Adicionais - Resposta: {}",
                row.pareceres_adicionais_resposta
            ),
            "-".repeat(90),
        ];
        for line in &block {
            writer.line(line);
        }
    }

    writer.into_bytes()
}
