//! Row extraction with per-field failure tolerance

use tracing::trace;

use crate::driver::ElementHandle;
use crate::schema::TableSchema;

/// Extract one record from a row handle.
///
/// Every column of the schema produces exactly one field, in schema order.
/// A field whose sub-element cannot be located or read resolves to the empty
/// string instead of failing the record: real tables have optional cells
/// (missing director credits, absent thumbnails) and a single blank field
/// must not cost the whole row.
pub async fn extract_row(row: &dyn ElementHandle, schema: &TableSchema) -> Vec<String> {
    let mut fields = Vec::with_capacity(schema.columns().len());
    for column in schema.columns() {
        let value = match row.find_child(&column.locator).await {
            Ok(cell) => read_field(&*cell, column.is_text(), &column.attribute).await,
            Err(e) => {
                trace!(column = %column.label, error = %e, "cell lookup failed, blank field");
                String::new()
            }
        };
        fields.push(value);
    }
    fields
}

async fn read_field(cell: &dyn ElementHandle, is_text: bool, attribute: &str) -> String {
    // Nudge the cell into the viewport first: lazily rendered tables only
    // materialize text for cells near the visible area.
    if cell.is_displayed().await.unwrap_or(false) {
        let _ = cell.scroll_into_view().await;
    }

    if is_text {
        cell.text().await.unwrap_or_default()
    } else {
        cell.attribute(attribute).await.ok().flatten().unwrap_or_default()
    }
}
