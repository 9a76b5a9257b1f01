//! REDCap `0`/`1` answers to EMX2 `FALSE`/`TRUE`.

use emx2_model::{InstrumentTable, SchemaTable};

/// Rewrites yes/no and true/false columns of `table` in place.
///
/// Only the literal strings `0` and `1` change. Returns the number of
/// columns touched.
pub fn normalize_booleans(table: &mut InstrumentTable, schema: &SchemaTable) -> usize {
    let flag_columns: Vec<String> = schema
        .data_columns(&table.name)
        .filter(|row| row.source.is_boolean_flag())
        .filter_map(|row| row.column_name().map(str::to_string))
        .collect();

    let mut touched = 0;
    for column in &flag_columns {
        let present = table.map_column(column, |value| {
            let flag = match value.as_str() {
                "0" => "FALSE",
                "1" => "TRUE",
                _ => return,
            };
            *value = flag.to_string();
        });
        if present {
            touched += 1;
        }
    }
    touched
}
