use fra_monitor::adapters::sample_claims;
use fra_monitor::core::chart::{bar_chart, line_chart, pie_chart, render_svg, ChartKind};
use fra_monitor::core::query::{
    count_by, distinct_values, sum_by, FilterSet, PageRequest, Query, SortSpec, TextSearch,
};

#[test]
fn test_status_breakdown_as_pie() {
    let claims = sample_claims();
    let summary = count_by(&claims, "status");
    let labels: Vec<&str> = summary.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["Approved", "Pending", "Rejected", "Under Review"]);

    let pie = pie_chart(&summary);
    assert_eq!(pie.total, 5.0);
    assert_eq!(pie.wedges.len(), 4);
    let legend = pie.legend();
    assert_eq!(legend[0].percentage, "40.0%");

    let svg = render_svg(ChartKind::Pie, &summary, 200.0);
    assert_eq!(svg.matches("<path").count(), 4);
}

#[test]
fn test_area_by_district_as_bars() {
    let mut claims = sample_claims();
    for claim in &mut claims {
        let acres = claim
            .field_text("area")
            .and_then(|a| a.split_whitespace().next().map(str::to_string))
            .unwrap_or_default();
        claim.data.insert("acres".to_string(), acres.into());
    }

    let totals = sum_by(&claims, "district", "acres");
    assert_eq!(totals[0].label, "Bastar");
    assert!((totals[0].value - 5.7).abs() < 1e-9);

    let bars = bar_chart(&totals, 200.0);
    assert_eq!(bars.bars.len(), 4);
    assert_eq!(bars.bars[0].height, 200.0);
    assert!(bars.bars.iter().all(|b| b.height >= 20.0));
}

#[test]
fn test_table_view_paging() {
    let query = Query::new(
        FilterSet::new()
            .with_exact("state", "Chhattisgarh")
            .with_search(TextSearch::new("village", &["village"])),
    )
    .sorted_by("holder,asc".parse::<SortSpec>().unwrap())
    .paged(PageRequest::new(1, 2));

    let page = query.run(&sample_claims());
    assert_eq!(page.total_items, 5);
    assert_eq!(page.total_pages, 3);
    let holders: Vec<String> = page.items.iter().filter_map(|r| r.field_text("holder")).collect();
    assert_eq!(holders, vec!["Maya Bai", "Ram Singh"]);
}

#[test]
fn test_monthly_trend_line() {
    let claims = sample_claims();
    let months: Vec<String> = distinct_values(&claims, "date")
        .into_iter()
        .map(|d| d[..7].to_string())
        .collect();
    assert_eq!(months.first().map(String::as_str), Some("2025-09"));

    let trend = count_by(&claims, "type");
    let line = line_chart(&trend);
    assert_eq!(line.points.len(), 2);
    assert!(line.path().starts_with("M 0% "));
}
