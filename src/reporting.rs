//! Console rendering of the period report.

use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::sim::post::{PeriodRow, PostProcessResult};

fn kwh(value: f64) -> Cell {
    Cell::new(format!("{value:.1}")).set_alignment(CellAlignment::Right)
}

fn money(value: f64) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}

fn ratio(row: &PeriodRow) -> Cell {
    if row.degenerate {
        return Cell::new("n/a")
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Dim);
    }
    let color = if row.self_sufficiency >= 0.5 {
        Color::Green
    } else if row.self_sufficiency >= 0.2 {
        Color::DarkYellow
    } else {
        Color::Red
    };
    Cell::new(format!("{:.1}%", row.self_sufficiency * 100.0))
        .set_alignment(CellAlignment::Right)
        .fg(color)
}

fn period_cells(row: &PeriodRow) -> Vec<Cell> {
    vec![
        Cell::new(&row.period),
        kwh(row.demand),
        kwh(row.generation),
        kwh(row.self_consumed),
        kwh(row.imported_from_grid),
        kwh(row.exported),
        kwh(row.curtailed).fg(if row.curtailed > 0.0 {
            Color::DarkYellow
        } else {
            Color::Reset
        }),
        money(row.cost).fg(if row.cost > 0.0 { Color::Red } else { Color::Green }),
        money(row.savings),
        kwh(row.emissions_kg),
        ratio(row),
    ]
}

/// Builds the per-period table followed by a bold totals row.
#[must_use]
pub fn build_report_table(report: &PostProcessResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        "Period",
        "Demand kWh",
        "PV kWh",
        "Self kWh",
        "Import kWh",
        "Export kWh",
        "Curtail kWh",
        "Cost",
        "Savings",
        "CO2 kg",
        "Self-suff.",
    ]);
    for row in report.rows() {
        table.add_row(period_cells(row));
    }

    let totals = report.totals();
    table.add_row(
        period_cells(&totals)
            .into_iter()
            .map(|cell| cell.add_attribute(Attribute::Bold)),
    );
    table
}

/// Prints the period table and the totals summary to stdout.
pub fn print_report(report: &PostProcessResult) {
    println!("{}", build_report_table(report));
    println!("\n{report}");
}
