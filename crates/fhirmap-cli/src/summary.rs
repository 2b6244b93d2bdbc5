use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use fhirmap_core::DanglingReference;

use crate::types::MapResult;

/// Dangling references listed individually before the rest are counted.
const DANGLING_LISTED: usize = 20;

pub fn print_summary(result: &MapResult) {
    let report = &result.report;
    let caps = &result.config.caps;
    println!("Input: {}", result.input_dir.display());
    println!("Output: {}", result.output_dir.display());
    println!(
        "Bundles: {} ({} patients, {} encounters indexed)",
        report.input_files.len(),
        report.index.patients,
        report.index.encounters
    );
    println!(
        "Caps: patients {}, encounters/patient {}, observations/encounter {}, \
         medications/encounter {}",
        caps.patients,
        caps.encounters_per_patient,
        caps.observations_per_encounter,
        caps.medications_per_encounter
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("File"),
        header_cell("Rows"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut total_rows = 0usize;
    for (kind, rows) in &report.tables {
        total_rows += rows;
        table.add_row(vec![
            Cell::new(kind.name())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(kind.file_name()),
            Cell::new(rows),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_dangling(&report.dangling);
}

fn print_dangling(dangling: &[DanglingReference]) {
    if dangling.is_empty() {
        println!("Dangling references: 0");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Natural ID"),
        header_cell("Referenced from"),
    ]);
    apply_table_style(&mut table);
    for reference in dangling.iter().take(DANGLING_LISTED) {
        let natural_id = if reference.natural_id.is_empty() {
            dim_cell("(missing)")
        } else {
            Cell::new(&reference.natural_id)
        };
        table.add_row(vec![
            Cell::new(reference.kind).fg(Color::Yellow),
            natural_id,
            Cell::new(&reference.referenced_from),
        ]);
    }
    println!();
    println!("Dangling references: {}", dangling.len());
    println!("{table}");
    if dangling.len() > DANGLING_LISTED {
        println!("... and {} more", dangling.len() - DANGLING_LISTED);
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
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
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
