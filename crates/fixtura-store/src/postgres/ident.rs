use crate::error::{StoreError, StoreResult};

/// Double-quote a single identifier.
pub fn quote_ident(name: &str) -> StoreResult<String> {
    if name.is_empty() || name.contains('\0') {
        return Err(StoreError::InvalidIdentifier(format!("{name:?}")));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a possibly schema-qualified table name (`schema.table`).
pub fn quote_table(name: &str) -> StoreResult<String> {
    let parts = name
        .split('.')
        .map(quote_ident)
        .collect::<StoreResult<Vec<_>>>()?;
    if parts.len() > 2 {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    Ok(parts.join("."))
}
