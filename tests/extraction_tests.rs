//! Extraction cascade against registry page fixtures
use rmsp_lookup::domain::Identifier;
use rmsp_lookup::infrastructure::parsing::RecordExtractor;

fn extract(html: &str) -> rmsp_lookup::LookupRecord {
    let extractor = RecordExtractor::new().expect("default rules compile");
    let identifier = Identifier::parse("7707083893").unwrap();
    extractor.extract(html, &identifier)
}

const RESULTS_TABLE: &str = r#"
<html><body>
  <table class="search-result">
    <tr><th>Наименование / ФИО</th><th>Категория</th><th>Регион</th><th>Дата включения</th><th>Дата исключения</th></tr>
    <tr>
      <td><a href="/view/123">ООО "РОМАШКА"</a><br>ИНН: 7707083893 ОГРН: 1027700132195</td>
      <td>Не является субъектом МСП</td>
      <td>77 - г. Москва</td>
      <td>10.08.2016</td>
      <td>15.03.2021</td>
    </tr>
  </table>
</body></html>"#;

#[test]
fn not_found_banner_wins_over_table() {
    let html = r#"
        <div class="result">
          <p>Уважаемый пользователь! По Вашему запросу не найдено сведений в реестре.</p>
        </div>
        <table>
          <tr><th>a</th><th>b</th><th>c</th><th>d</th></tr>
          <tr><td>ООО Ромашка</td><td>Малое предприятие</td><td>77</td><td>10.08.2016</td></tr>
        </table>"#;

    let record = extract(html);
    assert!(!record.found);
    assert!(record.category.is_none());
    assert!(record.message.unwrap().contains("не найдено сведений"));
}

#[test]
fn keyword_only_page_yields_category_and_first_date() {
    let html = "<div><span>Категория: Малое предприятие</span> \
                <span>Включено 01.08.2016, обновлено 10.07.2023</span></div>";

    let record = extract(html);
    assert!(record.found);
    assert_eq!(record.category.as_deref(), Some("Малое предприятие"));
    assert_eq!(record.inclusion_date.as_deref(), Some("01.08.2016"));
    assert!(record.organization_name.is_none());
}

#[test]
fn script_carried_category_and_date_are_both_recovered() {
    let html = "<html><head><script>var RSMP_CATEGORY = 'Малое предприятие'; \
                var RSMP_INCLUDED = '01.08.2016';</script></head>\
                <body><div id='app'></div></body></html>";

    let record = extract(html);
    assert!(record.found);
    assert_eq!(record.category.as_deref(), Some("Малое предприятие"));
    assert_eq!(record.inclusion_date.as_deref(), Some("01.08.2016"));
}

#[test]
fn results_table_maps_cells_by_position() {
    let record = extract(RESULTS_TABLE);
    assert!(record.found);
    assert_eq!(record.organization_name.as_deref(), Some("ООО \"РОМАШКА\""));
    assert_eq!(record.category.as_deref(), Some("Не является субъектом МСП"));
    assert_eq!(record.region.as_deref(), Some("77 - г. Москва"));
    assert_eq!(record.inclusion_date.as_deref(), Some("10.08.2016"));
    assert_eq!(record.exclusion_date.as_deref(), Some("15.03.2021"));
    assert_eq!(record.identifier.as_deref(), Some("7707083893"));
    assert_eq!(record.registration_number.as_deref(), Some("1027700132195"));
}

#[test]
fn organization_link_outside_a_table_is_found() {
    let html = r#"<div class="card"><a class="org" href="/view/77">ИП Иванов И.И.</a></div>"#;

    let record = extract(html);
    assert!(record.found);
    assert_eq!(record.organization_name.as_deref(), Some("ИП Иванов И.И."));
    assert!(record.category.is_none());
}

#[test]
fn selector_fallback_reads_the_enclosing_row() {
    // A single-row table is not a results table, but its row still carries the record.
    let html = r#"
        <table>
          <tr><td><a href="/view/5">ООО Вектор</a></td><td>Среднее предприятие</td><td>50</td><td>10.01.2019</td></tr>
        </table>"#;

    let record = extract(html);
    assert!(record.found);
    assert_eq!(record.organization_name.as_deref(), Some("ООО Вектор"));
    assert_eq!(record.category.as_deref(), Some("Среднее предприятие"));
    assert_eq!(record.region.as_deref(), Some("50"));
    assert_eq!(record.inclusion_date.as_deref(), Some("10.01.2019"));
}

#[test]
fn exclusion_date_recovered_from_text() {
    let html = r#"
        <table>
          <tr><th>Наименование</th><th>Категория</th><th>Регион</th><th>Дата включения</th></tr>
          <tr><td>ООО Ромашка</td><td>Не является субъектом МСП</td><td>77</td><td>10.08.2016</td></tr>
        </table>
        <div class="details">Исключена из реестра: 15.03.2021</div>"#;

    let record = extract(html);
    assert!(record.found);
    assert_eq!(record.exclusion_date.as_deref(), Some("15.03.2021"));
}

#[test]
fn exclusion_text_ignored_for_qualifying_categories() {
    let html = r#"
        <table>
          <tr><th>Наименование</th><th>Категория</th><th>Регион</th><th>Дата включения</th></tr>
          <tr><td>ООО Ромашка</td><td>Микропредприятие</td><td>77</td><td>10.08.2016</td></tr>
        </table>
        <p>Дата исключения: 15.03.2021</p>"#;

    let record = extract(html);
    assert!(record.found);
    assert!(record.exclusion_date.is_none());
}

#[test]
fn unrelated_page_is_not_found() {
    let record = extract("<html><body><h1>Реестр МСП</h1><p>Введите ИНН</p></body></html>");
    assert!(!record.found);
    assert!(record.message.is_none());
}
