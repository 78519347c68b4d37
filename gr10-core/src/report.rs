use chrono::NaiveDate;

use crate::models::{FormRecord, ReportRow};
use crate::normalize::{format_date, normalize_contract, parse_date};
use crate::store::FormStore;

/// Collects the date-range report: every stored form where the
/// pointed-out date or the filled-in date falls inside
/// `[start, end]` inclusive, projected to [`ReportRow`]s.
///
/// Unparsable bounds yield an empty report rather than an error. The
/// result is sorted ascending by `(contrato, data_apontamento)` using
/// plain string comparison; that ordering is relied on by consumers
/// that diff exported reports, so it is not numeric or chronological.
pub fn collect(store: &FormStore, start_raw: &str, end_raw: &str) -> Vec<ReportRow> {
    let (Some(start), Some(end)) = (parse_date(start_raw), parse_date(end_raw)) else {
        return Vec::new();
    };

    let mut rows: Vec<ReportRow> = store
        .list_all()
        .into_iter()
        .filter_map(|record| project(&record, start, end))
        .collect();

    rows.sort_by(|a, b| {
        (a.contrato.as_str(), a.data_apontamento.as_str())
            .cmp(&(b.contrato.as_str(), b.data_apontamento.as_str()))
    });
    rows
}

fn project(record: &FormRecord, start: NaiveDate, end: NaiveDate) -> Option<ReportRow> {
    let raw_pointed_out = record.value(FormRecord::POINTED_OUT_DATE);
    let raw_filled_in = record.value(FormRecord::FILLED_IN_DATE);
    let pointed_out = parse_date(raw_pointed_out);
    let filled_in = parse_date(raw_filled_in);

    let in_range = [pointed_out, filled_in]
        .iter()
        .flatten()
        .any(|date| (start..=end).contains(date));
    if !in_range {
        return None;
    }

    Some(ReportRow {
        contrato: normalize_contract(record.value(FormRecord::CONTRACT)),
        nome_gestor_relacionamento: manager_name(record).to_string(),
        responsavel_apontamento: record.value(FormRecord::POINTED_OUT_BY).to_string(),
        data_apontamento: display_date(pointed_out, raw_pointed_out),
        responsavel_preenchimento: record.value(FormRecord::FILLED_IN_BY).to_string(),
        data_preenchimento: display_date(filled_in, raw_filled_in),
        pareceres_adicionais_resposta: record.value(FormRecord::ADDITIONAL_REMARKS).to_string(),
    })
}

/// Older forms stored the manager under a shorter key; prefer the
/// current one when it has content.
fn manager_name(record: &FormRecord) -> &str {
    let name = record.value(FormRecord::MANAGER_NAME);
    if name.is_empty() {
        record.value(FormRecord::MANAGER_NAME_LEGACY)
    } else {
        name
    }
}

/// Parsed dates render as DD/MM/YYYY; anything else passes through as
/// the raw stored text.
fn display_date(parsed: Option<NaiveDate>, raw: &str) -> String {
    match parsed {
        Some(date) => format_date(date),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(pairs: &[(&str, &str)]) -> FormRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn store_with(records: &[FormRecord]) -> (tempfile::TempDir, FormStore) {
        let dir = tempdir().unwrap();
        let store = FormStore::new(dir.path());
        for rec in records {
            let contrato = normalize_contract(rec.value(FormRecord::CONTRACT));
            store.save(&contrato, rec).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_unparsable_bounds_yield_empty_report() {
        let (_dir, store) = store_with(&[record(&[
            (FormRecord::CONTRACT, "1"),
            (FormRecord::POINTED_OUT_DATE, "2024-01-10"),
        ])]);
        assert!(collect(&store, "not-a-date", "2024-01-31").is_empty());
        assert!(collect(&store, "2024-01-01", "").is_empty());
    }

    #[test]
    fn test_included_when_only_pointed_out_date_in_range() {
        let (_dir, store) = store_with(&[record(&[
            (FormRecord::CONTRACT, "55"),
            (FormRecord::POINTED_OUT_DATE, "2024-01-10"),
            (FormRecord::FILLED_IN_DATE, "2024-06-01"),
        ])]);

        let rows = collect(&store, "2024-01-01", "2024-01-31");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].contrato, "55");
        assert_eq!(rows[0].data_apontamento, "10/01/2024");
        assert_eq!(rows[0].data_preenchimento, "01/06/2024");
    }

    #[test]
    fn test_excluded_when_both_dates_out_of_range() {
        let (_dir, store) = store_with(&[record(&[
            (FormRecord::CONTRACT, "55"),
            (FormRecord::POINTED_OUT_DATE, "2023-12-31"),
            (FormRecord::FILLED_IN_DATE, "2024-02-01"),
        ])]);
        assert!(collect(&store, "2024-01-01", "2024-01-31").is_empty());
    }

    #[test]
    fn test_excluded_when_both_dates_unparsable() {
        let (_dir, store) = store_with(&[record(&[
            (FormRecord::CONTRACT, "55"),
            (FormRecord::POINTED_OUT_DATE, "soon"),
            (FormRecord::FILLED_IN_DATE, ""),
        ])]);
        assert!(collect(&store, "2024-01-01", "2024-01-31").is_empty());
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let (_dir, store) = store_with(&[
            record(&[
                (FormRecord::CONTRACT, "1"),
                (FormRecord::POINTED_OUT_DATE, "2024-01-01"),
            ]),
            record(&[
                (FormRecord::CONTRACT, "2"),
                (FormRecord::POINTED_OUT_DATE, "2024-01-31"),
            ]),
        ]);
        let rows = collect(&store, "2024-01-01", "2024-01-31");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_unparsable_date_still_shown_raw_when_other_date_qualifies() {
        let (_dir, store) = store_with(&[record(&[
            (FormRecord::CONTRACT, "7"),
            (FormRecord::POINTED_OUT_DATE, "pendente"),
            (FormRecord::FILLED_IN_DATE, "15/01/2024"),
        ])]);

        let rows = collect(&store, "2024-01-01", "2024-01-31");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data_apontamento, "pendente");
        assert_eq!(rows[0].data_preenchimento, "15/01/2024");
    }

    #[test]
    fn test_manager_name_falls_back_to_legacy_key() {
        let (_dir, store) = store_with(&[record(&[
            (FormRecord::CONTRACT, "7"),
            (FormRecord::MANAGER_NAME_LEGACY, "Carlos Prado"),
            (FormRecord::POINTED_OUT_DATE, "2024-01-10"),
        ])]);

        let rows = collect(&store, "2024-01-01", "2024-01-31");
        assert_eq!(rows[0].nome_gestor_relacionamento, "Carlos Prado");
    }

    #[test]
    fn test_ordering_is_lexical_not_numeric() {
        let (_dir, store) = store_with(&[
            record(&[
                (FormRecord::CONTRACT, "2"),
                (FormRecord::POINTED_OUT_DATE, "2024-01-10"),
            ]),
            record(&[
                (FormRecord::CONTRACT, "10"),
                (FormRecord::POINTED_OUT_DATE, "2024-01-10"),
            ]),
        ]);

        let rows = collect(&store, "2024-01-01", "2024-01-31");
        let order: Vec<&str> = rows.iter().map(|r| r.contrato.as_str()).collect();
        // string sort: "10" before "2"
        assert_eq!(order, vec!["10", "2"]);
    }

    #[test]
    fn test_end_to_end_contract_999() {
        let (_dir, store) = store_with(&[record(&[
            (FormRecord::CONTRACT, "999"),
            (FormRecord::POINTED_OUT_DATE, "2024-01-10"),
        ])]);

        let rows = collect(&store, "2024-01-01", "2024-01-31");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].contrato, "999");
        assert_eq!(rows[0].data_apontamento, "10/01/2024");
    }
}
