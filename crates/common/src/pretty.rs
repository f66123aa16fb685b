use crate::{ColumnSummary, TableSummary};
use tabled::{Table, Tabled, builder::Builder, settings};

/// Predefined output styles that map to `tabled` styles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableStyleKind {
    #[default]
    Modern,
    Ascii,
    Plain,
}

impl TableStyleKind {
    fn apply(self, table: &mut Table) {
        match self {
            Self::Modern => table.with(settings::Style::modern()),
            Self::Ascii => table.with(settings::Style::ascii()),
            Self::Plain => table.with(settings::Style::empty()),
        };
    }
}

/// Render `list_tables` output. Headers follow the listing column order.
pub fn render_table_summaries(rows: &[TableSummary], style: TableStyleKind) -> String {
    render_structured_rows(rows, style)
}

/// Render `show_columns` output.
pub fn render_columns(rows: &[ColumnSummary], style: TableStyleKind) -> String {
    render_structured_rows(rows, style)
}

/// Render a single-column listing such as database names.
pub fn render_names(header: &str, names: &[String], style: TableStyleKind) -> String {
    render_string_table(
        &[header],
        names.iter().map(|name| vec![name.clone()]).collect(),
        style,
    )
}

/// Render arbitrary string rows with the provided style.
pub fn render_string_table(
    headers: &[&str],
    rows: Vec<Vec<String>>,
    style: TableStyleKind,
) -> String {
    if rows.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();

    if !headers.is_empty() {
        builder.push_record(headers.iter().copied());
    }

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    style.apply(&mut table);
    table.to_string()
}

/// Render any `Tabled` rows with the provided style.
pub fn render_structured_rows<T>(rows: &[T], style: TableStyleKind) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "<empty>".into();
    }

    let mut table = Table::new(rows.to_vec());
    style.apply(&mut table);
    table.to_string()
}
