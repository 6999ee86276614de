//! Extraction stages, most precise first
//!
//! Each stage is a pure function of the document context and the record
//! accumulated so far. A stage may skip, contribute fields (merged so that
//! only empty fields are filled), or end the cascade with a conclusive
//! record.

use scraper::ElementRef;
use tracing::debug;

use super::context::{ExtractionContext, element_text, own_text};
use crate::domain::record::{PartialRecord, RegistryCategory};

/// What a stage decided for the current document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Nothing applicable in this document
    Skip,
    /// Fields to merge into the accumulated record
    Fill(PartialRecord),
    /// Final record, later stages are not consulted
    Conclusive(PartialRecord),
}

pub type StageFn = fn(&ExtractionContext<'_>, &PartialRecord) -> StageOutcome;

/// A named cascade stage
#[derive(Clone, Copy)]
pub struct ExtractionStage {
    pub name: &'static str,
    pub run: StageFn,
}

/// The cascade in evaluation order
pub const CASCADE: [ExtractionStage; 6] = [
    ExtractionStage { name: "negative_result", run: detect_negative_result },
    ExtractionStage { name: "primary_table", run: extract_primary_table },
    ExtractionStage { name: "identifier_recovery", run: recover_identifiers },
    ExtractionStage { name: "selector_fallback", run: selector_fallback },
    ExtractionStage { name: "keyword_fallback", run: keyword_fallback },
    ExtractionStage { name: "exclusion_recovery", run: recover_exclusion_date },
];

fn not_found(message: String) -> StageOutcome {
    StageOutcome::Conclusive(PartialRecord {
        found: false,
        message: Some(message),
        ..PartialRecord::default()
    })
}

/// Registry notices that the query returned nothing
pub fn detect_negative_result(ctx: &ExtractionContext<'_>, _acc: &PartialRecord) -> StageOutcome {
    let rules = ctx.rules;

    for selector in &rules.alert_blocks {
        for block in ctx.document.select(selector) {
            let text = element_text(block);
            let lower = text.to_lowercase();
            if rules.alert_not_found_words.iter().any(|w| lower.contains(w.as_str())) {
                debug!("Alert block reports an empty result");
                return not_found(text);
            }
        }
    }

    for node in ctx.document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !text.contains(rules.dear_user.as_str()) {
            continue;
        }

        // The greeting may sit in its own inline element; look one level up too.
        let banner = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take(2)
            .map(element_text)
            .find(|t| t.to_lowercase().contains(rules.nothing_found.as_str()));

        if let Some(message) = banner {
            debug!("Registry banner reports an empty result");
            return not_found(message);
        }
    }

    if let Some(count) = rules
        .found_count
        .captures(&ctx.visible_text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
    {
        if count == 0 {
            return not_found("Записи не найдены".to_string());
        }
    }

    StageOutcome::Skip
}

/// Category, region and dates from a result row, by cell position
fn row_fields(ctx: &ExtractionContext<'_>, cells: &[ElementRef<'_>]) -> PartialRecord {
    let rules = ctx.rules;
    let cell_text = |i: usize| cells.get(i).map(|c| element_text(*c));

    let organization_name = cells.first().map(|cell| {
        cell.select(&rules.name_link)
            .next()
            .map_or_else(|| element_text(*cell), element_text)
    });

    PartialRecord {
        found: true,
        organization_name,
        category: cell_text(1),
        region: cell_text(2),
        inclusion_date: cell_text(3),
        exclusion_date: cell_text(4).filter(|t| !rules.is_placeholder(t)),
        ..PartialRecord::default()
    }
}

/// Positional mapping of the first qualifying body row of the results table
pub fn extract_primary_table(ctx: &ExtractionContext<'_>, _acc: &PartialRecord) -> StageOutcome {
    let Some(row) = ctx.primary_row() else {
        return StageOutcome::Skip;
    };

    let cells: Vec<ElementRef<'_>> = row.select(&ctx.rules.table_cell).collect();
    debug!("Primary table row with {} cells", cells.len());
    StageOutcome::Fill(row_fields(ctx, &cells))
}

fn first_capture(pattern: &regex::Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// INN and OGRN from the matched row and from detail blocks
pub fn recover_identifiers(ctx: &ExtractionContext<'_>, acc: &PartialRecord) -> StageOutcome {
    let rules = ctx.rules;
    let mut partial = PartialRecord::default();

    if let Some(row) = ctx.primary_row() {
        let row_text = element_text(row);
        partial.identifier = first_capture(&rules.row_identifier, &row_text);
        partial.registration_number = first_capture(&rules.row_registration, &row_text);
    }

    for block in ctx.document.select(&rules.detail_block) {
        let needs_identifier = acc.identifier.is_none() && partial.identifier.is_none();
        let needs_registration =
            acc.registration_number.is_none() && partial.registration_number.is_none();
        if !needs_identifier && !needs_registration {
            break;
        }

        let text = own_text(block);
        if needs_identifier {
            partial.identifier = first_capture(&rules.detail_identifier, &text);
        }
        if needs_registration {
            partial.registration_number = first_capture(&rules.detail_registration, &text);
        }
    }

    if partial.identifier.is_none() && partial.registration_number.is_none() {
        return StageOutcome::Skip;
    }
    StageOutcome::Fill(partial)
}

/// Organization name through alternative locators, then its enclosing row
pub fn selector_fallback(ctx: &ExtractionContext<'_>, acc: &PartialRecord) -> StageOutcome {
    if acc.found {
        return StageOutcome::Skip;
    }
    let rules = ctx.rules;

    let Some(element) = rules
        .name_fallbacks
        .iter()
        .find_map(|selector| ctx.document.select(selector).next())
    else {
        return StageOutcome::Skip;
    };

    let mut partial = PartialRecord {
        found: true,
        organization_name: Some(element_text(element)),
        ..PartialRecord::default()
    };

    let row = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr");
    if let Some(row) = row {
        let cells: Vec<ElementRef<'_>> = row.select(&rules.data_cell).collect();
        if cells.len() >= super::MIN_RECORD_CELLS {
            partial.absorb(row_fields(ctx, &cells));
        }
    }

    debug!("Selector fallback located an organization name");
    StageOutcome::Fill(partial)
}

/// Category keywords anywhere in the page text
pub fn keyword_fallback(ctx: &ExtractionContext<'_>, acc: &PartialRecord) -> StageOutcome {
    if acc.found {
        return StageOutcome::Skip;
    }
    let rules = ctx.rules;
    let visible = ctx.visible_text.to_lowercase();

    let keyword = rules
        .category_keywords
        .iter()
        .find(|k| visible.contains(&k.to_lowercase()))
        .or_else(|| {
            if !ctx.full_text.contains(rules.category_marker.as_str()) {
                return None;
            }
            let full = ctx.full_text.to_lowercase();
            rules
                .marker_categories
                .iter()
                .find(|k| full.contains(&k.to_lowercase()))
        });

    let Some(category) = keyword else {
        return StageOutcome::Skip;
    };

    debug!("Keyword fallback matched category '{}'", category);
    StageOutcome::Fill(PartialRecord {
        found: true,
        category: Some(category.clone()),
        inclusion_date: rules
            .date
            .find(&ctx.full_text)
            .map(|m| m.as_str().to_string()),
        ..PartialRecord::default()
    })
}

/// "excluded on <date>" wording for businesses no longer in the registry
pub fn recover_exclusion_date(ctx: &ExtractionContext<'_>, acc: &PartialRecord) -> StageOutcome {
    let not_qualifying = acc
        .category_kind()
        .is_some_and(|c| c == RegistryCategory::NotQualifying);
    if !not_qualifying || acc.exclusion_date.as_deref().is_some_and(|d| !d.is_empty()) {
        return StageOutcome::Skip;
    }

    ctx.rules
        .exclusion_patterns
        .iter()
        .find_map(|pattern| first_capture(pattern, &ctx.visible_text))
        .map_or(StageOutcome::Skip, |date| {
            StageOutcome::Fill(PartialRecord {
                exclusion_date: Some(date),
                ..PartialRecord::default()
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parsing::config::ExtractionConfig;
    use crate::infrastructure::parsing::context::CompiledRules;
    use scraper::Html;

    fn run(stage: StageFn, html: &str, acc: &PartialRecord) -> StageOutcome {
        let rules = CompiledRules::compile(&ExtractionConfig::default()).unwrap();
        let document = Html::parse_document(html);
        let ctx = ExtractionContext::new(&document, &rules);
        stage(&ctx, acc)
    }

    #[test]
    fn alert_block_is_conclusive() {
        let html = r#"<div class="form-alert">Сведения не найдены</div>"#;
        let outcome = run(detect_negative_result, html, &PartialRecord::default());
        assert!(matches!(outcome, StageOutcome::Conclusive(ref r) if !r.found));
    }

    #[test]
    fn banner_split_across_inline_element() {
        let html = "<div><b>Уважаемый пользователь!</b> По Вашему запросу не найдено сведений.</div>";
        match run(detect_negative_result, html, &PartialRecord::default()) {
            StageOutcome::Conclusive(record) => {
                assert!(record.message.unwrap().contains("не найдено сведений"));
            }
            other => panic!("expected conclusive outcome, got {other:?}"),
        }
    }

    #[test]
    fn greeting_without_empty_result_is_ignored() {
        let html = "<div>Уважаемый пользователь! Сервис обновлен.</div>";
        assert_eq!(
            run(detect_negative_result, html, &PartialRecord::default()),
            StageOutcome::Skip
        );
    }

    #[test]
    fn zero_counter_is_conclusive() {
        let html = "<p>Найдено записей: 0</p>";
        assert!(matches!(
            run(detect_negative_result, html, &PartialRecord::default()),
            StageOutcome::Conclusive(_)
        ));
    }

    #[test]
    fn table_with_header_only_is_skipped() {
        let html = "<table><tr><th>Наименование</th><th>Категория</th><th>Регион</th><th>Дата</th></tr></table>";
        assert_eq!(
            run(extract_primary_table, html, &PartialRecord::default()),
            StageOutcome::Skip
        );
    }

    #[test]
    fn dash_in_fifth_cell_is_not_an_exclusion_date() {
        let html = "<table><tr><th>h</th></tr>\
            <tr><td>ООО Ромашка</td><td>Микропредприятие</td><td>77</td><td>10.08.2016</td><td>—</td></tr></table>";
        match run(extract_primary_table, html, &PartialRecord::default()) {
            StageOutcome::Fill(record) => {
                assert_eq!(record.organization_name.as_deref(), Some("ООО Ромашка"));
                assert!(record.exclusion_date.is_none());
            }
            other => panic!("expected fill, got {other:?}"),
        }
    }

    #[test]
    fn detail_blocks_fill_identifiers() {
        let html = "<div>ИНН: 7707083893</div><div>ОГРН: 1027700132195</div>";
        match run(recover_identifiers, html, &PartialRecord::default()) {
            StageOutcome::Fill(record) => {
                assert_eq!(record.identifier.as_deref(), Some("7707083893"));
                assert_eq!(record.registration_number.as_deref(), Some("1027700132195"));
            }
            other => panic!("expected fill, got {other:?}"),
        }
    }

    #[test]
    fn fallbacks_skip_once_found() {
        let acc = PartialRecord {
            found: true,
            ..PartialRecord::default()
        };
        let html = "<a href='/view/1'>ООО Ромашка</a> Малое предприятие";
        assert_eq!(run(selector_fallback, html, &acc), StageOutcome::Skip);
        assert_eq!(run(keyword_fallback, html, &acc), StageOutcome::Skip);
    }

    #[test]
    fn marker_admits_not_qualifying_category() {
        let html = "<script>var RSMP_CATEGORY = 'Не является субъектом МСП';</script><p>Карточка</p>";
        match run(keyword_fallback, html, &PartialRecord::default()) {
            StageOutcome::Fill(record) => {
                assert_eq!(record.category.as_deref(), Some("Не является субъектом МСП"));
            }
            other => panic!("expected fill, got {other:?}"),
        }
    }

    #[test]
    fn marker_branch_takes_date_from_script_data() {
        let html = "<script>var RSMP_CATEGORY = 'Микропредприятие'; var included = '10.08.2016';</script>";
        match run(keyword_fallback, html, &PartialRecord::default()) {
            StageOutcome::Fill(record) => {
                assert_eq!(record.category.as_deref(), Some("Микропредприятие"));
                assert_eq!(record.inclusion_date.as_deref(), Some("10.08.2016"));
            }
            other => panic!("expected fill, got {other:?}"),
        }
    }

    #[test]
    fn category_in_script_without_marker_is_ignored() {
        let html = "<script>var labels = ['Малое предприятие'];</script><p>Карточка</p>";
        assert_eq!(
            run(keyword_fallback, html, &PartialRecord::default()),
            StageOutcome::Skip
        );
    }

    #[test]
    fn exclusion_date_only_for_not_qualifying() {
        let html = "<p>Исключен из реестра 15.03.2021</p>";
        let small = PartialRecord {
            found: true,
            category: Some("Малое предприятие".to_string()),
            ..PartialRecord::default()
        };
        assert_eq!(run(recover_exclusion_date, html, &small), StageOutcome::Skip);

        let excluded = PartialRecord {
            found: true,
            category: Some("Не является субъектом МСП".to_string()),
            ..PartialRecord::default()
        };
        match run(recover_exclusion_date, html, &excluded) {
            StageOutcome::Fill(record) => {
                assert_eq!(record.exclusion_date.as_deref(), Some("15.03.2021"));
            }
            other => panic!("expected fill, got {other:?}"),
        }
    }
}
