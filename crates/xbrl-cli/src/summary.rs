use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use xbrl_core::RunReport;
use xbrl_map::RouteResult;
use xbrl_model::{
    CoverageStatus, DiagnosticRecord, RebuildPhase, Severity, UnavailableReason,
};
use xbrl_standards::BaselineSnapshot;

pub fn print_summary(report: &RunReport) {
    println!("Run: {}", report.run_id);
    println!(
        "Events: {}  Records: {}  Errors: {}  Warnings: {}",
        report.event_count,
        report.records.len(),
        report.error_count(),
        report.warning_count()
    );

    let mut table = Table::new();
    table.set_header(vec![header_cell("Category"), header_cell("Records")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (category, count) in &report.category_counts {
        let label = if *count > 0 {
            Cell::new(category.label()).fg(Color::Blue)
        } else {
            dim_cell(category.label())
        };
        table.add_row(vec![label, count_cell(*count, Color::White)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(report.records.len()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_top_codes(report);
    print_record_table(&report.records);
    print_run_counts(report);
    print_coverage(report.coverage.as_ref());
}

fn print_top_codes(report: &RunReport) {
    if report.top_codes.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Code"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for entry in &report.top_codes {
        table.add_row(vec![Cell::new(&entry.code), Cell::new(entry.count)]);
    }
    println!();
    println!("Top codes:");
    println!("{table}");
}

fn print_record_table(records: &[DiagnosticRecord]) {
    if records.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Severity"),
        header_cell("Category"),
        header_cell("Rule"),
        header_cell("Location"),
        header_cell("Message"),
    ]);
    apply_record_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for record in records {
        let message = if record.rule_text.is_empty() {
            record.message.clone()
        } else {
            format!("{}\n{}", record.rule_text, record.found_text)
        };
        let message_cell = if record.nonactionable {
            dim_cell(message)
        } else {
            Cell::new(message)
        };
        table.add_row(vec![
            Cell::new(&record.id),
            severity_cell(record.severity),
            Cell::new(record.category.as_str()),
            optional_cell(record.rule_id.as_deref()),
            optional_cell(location_text(record).as_deref()),
            message_cell,
        ]);
    }
    println!();
    println!("Findings:");
    println!("{table}");
}

fn print_run_counts(report: &RunReport) {
    let filter = &report.filter;
    println!();
    println!(
        "Filtered: {} dropped ({} errors, {} warnings), {} recovered, {} tagged",
        filter.dropped_total,
        filter.dropped_errors,
        filter.dropped_warnings,
        filter.recovered,
        filter.tagged
    );
    println!(
        "Duplicates dropped: {}  Formulas dropped: {}",
        report.duplicates_dropped, report.formulas_dropped
    );
    println!(
        "Catalog: {} resolved, {} unresolved",
        report.catalog.resolved, report.catalog.unresolved
    );
    if report.diagnostics.total() > 0 {
        let kinds: Vec<String> = report
            .diagnostics
            .counts
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect();
        eprintln!(
            "Degraded: {} ({})",
            report.diagnostics.total(),
            kinds.join(", ")
        );
    }
}

fn print_coverage(coverage: Option<&CoverageStatus>) {
    let Some(status) = coverage else {
        return;
    };
    match status {
        CoverageStatus::Available(summary) => {
            let completeness = if summary.approx_complete {
                "approximately complete"
            } else {
                "partial"
            };
            println!(
                "Coverage {}:{}: {} of {} rules seen ({completeness})",
                summary.taxonomy_version,
                summary.entrypoint_id,
                summary.rule_ids_seen_approx,
                summary.baseline_present_count
            );
        }
        CoverageStatus::Unavailable {
            entrypoint_id,
            taxonomy_version,
            rule_ids_seen_approx,
            reason,
            rebuild,
        } => {
            let reason = match reason {
                UnavailableReason::Missing => "no baseline",
                UnavailableReason::Stale => "baseline is stale",
            };
            println!(
                "Coverage {taxonomy_version}:{entrypoint_id}: unavailable, {reason} \
                 ({rule_ids_seen_approx} rules seen, rebuild {})",
                phase_label(*rebuild)
            );
        }
    }
}

pub fn print_baseline(snapshot: &BaselineSnapshot) {
    println!(
        "Baseline {}:{}",
        snapshot.taxonomy_version, snapshot.entrypoint_id
    );
    println!("Rules present: {}", snapshot.present_count);
    println!("Hash: {}", snapshot.hash);
    println!("Built: {}", snapshot.built_at.to_rfc3339());
    if !snapshot.ids_sample.is_empty() {
        println!("Sample: {}", snapshot.ids_sample.join(", "));
    }
}

pub fn print_route(record: &DiagnosticRecord, route: &RouteResult) {
    println!("Finding: {} ({})", record.id, record.code);
    if let Some(exact) = &route.exact {
        let location = &exact.cell.location;
        println!(
            "Exact: {} row {} col {}",
            location.table_id, location.row_code, location.col_code
        );
        for alternative in &exact.alternatives {
            println!(
                "  also: {} row {} col {}",
                alternative.table_id, alternative.row_code, alternative.col_code
            );
        }
    }
    if route.is_no_location() {
        println!("No location: shown as a banner");
        return;
    }
    if route.candidates.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Label"),
        header_cell("Score"),
        header_cell("Explanation"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for candidate in &route.candidates {
        table.add_row(vec![
            Cell::new(&candidate.table_id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&candidate.table_label),
            Cell::new(format!("{:.2}", candidate.score)),
            dim_cell(candidate.explain()),
        ]);
    }
    println!("{table}");
}

fn location_text(record: &DiagnosticRecord) -> Option<String> {
    let table_id = record.table_id.as_deref()?;
    let mut text = table_id.to_string();
    if let Some(row) = &record.row_code {
        text.push_str(&format!(" r{row}"));
    }
    if let Some(col) = &record.col_code {
        text.push_str(&format!(" c{col}"));
    }
    Some(text)
}

fn phase_label(phase: RebuildPhase) -> &'static str {
    match phase {
        RebuildPhase::NotScheduled => "not scheduled",
        RebuildPhase::Queued => "queued",
        RebuildPhase::Running => "running",
        RebuildPhase::Ready => "ready",
        RebuildPhase::Failed => "failed",
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn apply_record_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(200);
    if table.column_count() >= 6 {
        table.set_constraints(vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(16)),
            ColumnConstraint::UpperBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Fixed(16)),
            ColumnConstraint::UpperBoundary(Width::Fixed(14)),
            ColumnConstraint::UpperBoundary(Width::Fixed(24)),
            ColumnConstraint::UpperBoundary(Width::Percentage(55)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
        Severity::Info => dim_cell("INFO"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
