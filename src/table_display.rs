use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use funifier_lottery::data::{DataValue, ResultTable};

pub fn display_results(results: &ResultTable, max_rows: usize) {
    if results.is_empty() {
        println!("{}", "No results found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers: Vec<Cell> = results
        .columns
        .iter()
        .map(|c| Cell::new(&c.name).add_attribute(Attribute::Bold))
        .collect();
    table.set_header(headers);

    for row in results.rows.iter().take(max_rows) {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|value| match value {
                DataValue::Null => "NULL".to_string(),
                other => other.to_string(),
            })
            .collect();
        table.add_row(cells);
    }

    println!("{table}");
    if results.row_count() > max_rows {
        println!(
            "{}",
            format!(
                "... {} more rows not shown",
                results.row_count() - max_rows
            )
            .dark_grey()
        );
    }
    println!("\n{}", format!("{} rows returned", results.row_count()).green());
}

pub fn display_count(label: &str, count: i64) {
    println!("{} {}", format!("{}:", label).bold(), count.to_string().green());
}
